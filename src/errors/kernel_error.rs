//! Error types for device acquisition, memory, transfers and kernel launches.

use thiserror::Error;

/// Errors raised while talking to the device.
///
/// None of these are retried: every kernel run is a deterministic single-shot
/// computation, so a failure here ends the run.
#[derive(Error, Debug)]
pub enum KernelError {
    #[error("No compatible GPU adapter found")]
    NoAdapter,

    #[error("GPU device request failed: {message}")]
    DeviceRequestFailed { message: String },

    #[error(
        "Device allocation of {requested_bytes} bytes for '{label}' failed: {message}"
    )]
    ResourceExhaustion {
        label: String,
        requested_bytes: u64,
        message: String,
    },

    #[error("Transfer of '{label}' failed: {message}")]
    TransferFailure { label: String, message: String },

    #[error("Launch of {kernel} failed: {message}")]
    LaunchFailure { kernel: String, message: String },

    #[error("Shader compilation failed for {kernel}: {message}")]
    ShaderCompilationFailed { kernel: String, message: String },

    #[error("Input '{label}' has {actual} elements, expected {expected}")]
    InputLengthMismatch {
        label: String,
        expected: usize,
        actual: usize,
    },
}

impl KernelError {
    pub(crate) fn launch(kernel: &str, message: impl Into<String>) -> Self {
        KernelError::LaunchFailure {
            kernel: kernel.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn transfer(label: &str, message: impl Into<String>) -> Self {
        KernelError::TransferFailure {
            label: label.to_string(),
            message: message.into(),
        }
    }
}
