//! Error types for benchmark operations.

use std::error::Error;
use std::fmt;

use crate::errors::{KernelError, VerificationError};

#[derive(Debug)]
pub enum BenchmarkError {
    ConfigParseError {
        path: String,
        source: serde_json::Error,
    },
    ConfigValidationError {
        field: String,
        message: String,
    },
    IoError {
        source: std::io::Error,
    },
    ReportSerializationError {
        source: serde_json::Error,
    },
    UnknownBenchmark {
        name: String,
    },
    Kernel {
        source: KernelError,
    },
    Verification {
        source: VerificationError,
    },
}

impl fmt::Display for BenchmarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BenchmarkError::ConfigParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse configuration file '{}': {}",
                    path, source
                )
            }
            BenchmarkError::ConfigValidationError { field, message } => {
                write!(
                    f,
                    "Configuration validation error for field '{}': {}",
                    field, message
                )
            }
            BenchmarkError::IoError { source } => {
                write!(f, "IO error: {}", source)
            }
            BenchmarkError::ReportSerializationError { source } => {
                write!(f, "Failed to serialize benchmark report: {}", source)
            }
            BenchmarkError::UnknownBenchmark { name } => {
                write!(
                    f,
                    "Unknown benchmark '{}'. Supported: vector_add, reduce, tiled_matmul",
                    name
                )
            }
            BenchmarkError::Kernel { source } => {
                write!(f, "Device error: {}", source)
            }
            BenchmarkError::Verification { source } => {
                write!(f, "Verification failed: {}", source)
            }
        }
    }
}

impl Error for BenchmarkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BenchmarkError::ConfigParseError { source, .. } => Some(source),
            BenchmarkError::IoError { source } => Some(source),
            BenchmarkError::ReportSerializationError { source } => Some(source),
            BenchmarkError::Kernel { source } => Some(source),
            BenchmarkError::Verification { source } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BenchmarkError {
    fn from(error: std::io::Error) -> Self {
        BenchmarkError::IoError { source: error }
    }
}

impl From<KernelError> for BenchmarkError {
    fn from(error: KernelError) -> Self {
        BenchmarkError::Kernel { source: error }
    }
}

impl From<VerificationError> for BenchmarkError {
    fn from(error: VerificationError) -> Self {
        BenchmarkError::Verification { source: error }
    }
}

pub type BenchmarkResult<T> = Result<T, BenchmarkError>;
