//! Benchmark type definitions and configuration structures.

use serde::{Deserialize, Serialize};

use super::benchmark_errors::{BenchmarkError, BenchmarkResult};
use crate::errors::{VerificationError, VerificationResult};
use crate::gpu::{DeviceConfig, DeviceTiming, TimingSource};
use crate::kernels::{Kernel, ReduceCombine};

/// Problem sizes and device preferences for the benchmark runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    /// Element count for the vector addition.
    pub vector_add_size: usize,
    /// Element count for the reduction.
    pub reduce_size: usize,
    /// Matrix width for the tiled multiply.
    pub matmul_width: usize,
    /// Seed for the generated inputs.
    pub seed: u64,
    pub reduce_combine: ReduceCombine,
    pub device: DeviceConfig,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            vector_add_size: 1 << 20,
            reduce_size: 10_000_000,
            matmul_width: 512,
            seed: 12345,
            reduce_combine: ReduceCombine::Device,
            device: DeviceConfig::default(),
        }
    }
}

impl BenchmarkConfig {
    /// Problem size configured for `kernel`.
    pub fn problem_size(&self, kernel: Kernel) -> usize {
        match kernel {
            Kernel::VectorAdd => self.vector_add_size,
            Kernel::Reduce => self.reduce_size,
            Kernel::TiledMatMul => self.matmul_width,
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> BenchmarkResult<()> {
        let fields = [
            ("vector_add_size", self.vector_add_size),
            ("reduce_size", self.reduce_size),
            ("matmul_width", self.matmul_width),
        ];
        for (field, value) in fields {
            if value == 0 {
                return Err(BenchmarkError::ConfigValidationError {
                    field: field.to_string(),
                    message: "Problem size must be greater than 0".to_string(),
                });
            }
        }

        // Both the matrix element count and the reduction input are addressed
        // with 32-bit indices on the device.
        let matmul_elements = (self.matmul_width as u64).saturating_mul(self.matmul_width as u64);
        if matmul_elements > u32::MAX as u64 {
            return Err(BenchmarkError::ConfigValidationError {
                field: "matmul_width".to_string(),
                message: format!(
                    "Width {} needs {} elements, more than 32-bit indexing allows",
                    self.matmul_width, matmul_elements
                ),
            });
        }
        for (field, value) in [
            ("vector_add_size", self.vector_add_size),
            ("reduce_size", self.reduce_size),
        ] {
            if value as u64 > u32::MAX as u64 {
                return Err(BenchmarkError::ConfigValidationError {
                    field: field.to_string(),
                    message: format!("{} elements exceed 32-bit indexing", value),
                });
            }
        }

        Ok(())
    }
}

/// Outcome of comparing a device result with the reference.
#[derive(Debug, Clone, Serialize)]
pub struct Verification {
    pub kernel: Kernel,
    pub max_error: f32,
    pub tolerance: f32,
    /// Elements whose error exceeds the tolerance.
    pub mismatches: usize,
    pub expected_len: usize,
    pub actual_len: usize,
}

impl Verification {
    pub fn passed(&self) -> bool {
        self.expected_len == self.actual_len && self.mismatches == 0
    }

    /// Turn a failed comparison into an error.
    pub fn ensure(&self) -> VerificationResult<()> {
        if self.expected_len != self.actual_len {
            return Err(VerificationError::LengthMismatch {
                kernel: self.kernel.name().to_string(),
                expected: self.expected_len,
                actual: self.actual_len,
            });
        }
        if self.mismatches > 0 {
            return Err(VerificationError::ToleranceExceeded {
                kernel: self.kernel.name().to_string(),
                max_error: self.max_error,
                tolerance: self.tolerance,
                mismatches: self.mismatches,
            });
        }
        Ok(())
    }
}

/// Result of one benchmark: host and device timing plus verification.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkReport {
    pub kernel: Kernel,
    /// Element count, or matrix width for the matrix multiply.
    pub problem_size: usize,
    pub host_time_ms: f64,
    pub device_time_ms: f64,
    /// Host time over device time; above 1.0 means the device was faster.
    pub speedup: f64,
    /// Upload, launch and readback as seen by the host.
    pub round_trip_ms: f64,
    pub timing_source: TimingSource,
    /// Dispatches recorded for the launch.
    pub passes: usize,
    pub verification: Verification,
}

impl BenchmarkReport {
    pub fn new(
        kernel: Kernel,
        problem_size: usize,
        host_time_ms: f64,
        round_trip_ms: f64,
        timing: DeviceTiming,
        passes: usize,
        verification: Verification,
    ) -> Self {
        let speedup = if timing.elapsed_ms > 0.0 {
            host_time_ms / timing.elapsed_ms
        } else {
            0.0
        };
        Self {
            kernel,
            problem_size,
            host_time_ms,
            device_time_ms: timing.elapsed_ms,
            speedup,
            round_trip_ms,
            timing_source: timing.source,
            passes,
            verification,
        }
    }

    /// Round-trip time over kernel time: the cost of transfers and submission.
    pub fn overhead_ratio(&self) -> f64 {
        if self.device_time_ms > 0.0 {
            self.round_trip_ms / self.device_time_ms
        } else {
            0.0
        }
    }
}
