//! Core benchmark execution logic.

use super::benchmark_errors::{BenchmarkError, BenchmarkResult};
use super::benchmark_types::{BenchmarkConfig, BenchmarkReport};
use super::performance_metrics::{time_host, verify};
use super::workload::Workload;
use crate::errors::KernelResult;
use crate::gpu::DeviceContext;
use crate::kernels::{self, Kernel, KernelModule};
use crate::reference;
use log::{info, warn};
use std::fs;

/// Default location of the benchmark configuration.
pub const KERNELS_CONFIG_PATH: &str = "configs/kernels.json";

/// Configuration loader that handles JSON files with fallbacks
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a configuration file with fallback to defaults
    pub fn load_config<T: serde::de::DeserializeOwned + Default>(
        path: &str,
        config_name: &str,
    ) -> BenchmarkResult<T> {
        match fs::read_to_string(path) {
            Ok(content) => {
                serde_json::from_str(&content).map_err(|e| BenchmarkError::ConfigParseError {
                    path: path.to_string(),
                    source: e,
                })
            }
            Err(_) => {
                warn!(
                    "Config file '{}' not found, using default configuration for {}",
                    path, config_name
                );
                Ok(T::default())
            }
        }
    }

    /// Load and validate the kernel benchmark configuration
    pub fn load_kernels_config(path: &str) -> BenchmarkResult<BenchmarkConfig> {
        let config: BenchmarkConfig = Self::load_config(path, "kernels")?;
        config.validate()?;
        Ok(config)
    }
}

/// Runs one workload: the host reference once, the device path once, then
/// the comparison. Device errors abort; a failed comparison is only reported.
pub fn run_workload(module: &KernelModule<'_>, workload: &Workload) -> KernelResult<BenchmarkReport> {
    let kernel = workload.kernel();
    let tolerance = workload.tolerance();
    let host_label = format!("{} host reference", kernel);
    let device_label = format!("{} device round trip", kernel);

    let report = match workload {
        Workload::VectorAdd { a, b } => {
            let (expected, host_ms) = time_host(&host_label, || reference::vector_add(a, b));
            let (output, round_trip_ms) =
                time_host(&device_label, || kernels::vector_add(module, a, b));
            let output = output?;
            let verification = verify(kernel, &expected, &output.value, tolerance);
            BenchmarkReport::new(
                kernel,
                workload.problem_size(),
                host_ms,
                round_trip_ms,
                output.timing,
                output.passes,
                verification,
            )
        }
        Workload::Reduce { input, combine } => {
            let (expected, host_ms) = time_host(&host_label, || reference::sum(input));
            let (output, round_trip_ms) =
                time_host(&device_label, || kernels::reduce_sum(module, input, *combine));
            let output = output?;
            let verification = verify(kernel, &[expected], &[output.value], tolerance);
            BenchmarkReport::new(
                kernel,
                workload.problem_size(),
                host_ms,
                round_trip_ms,
                output.timing,
                output.passes,
                verification,
            )
        }
        Workload::TiledMatMul { a, b, width } => {
            let (expected, host_ms) = time_host(&host_label, || reference::matmul(a, b, *width));
            let (output, round_trip_ms) =
                time_host(&device_label, || kernels::tiled_matmul(module, a, b, *width));
            let output = output?;
            let verification = verify(kernel, &expected, &output.value, tolerance);
            BenchmarkReport::new(
                kernel,
                workload.problem_size(),
                host_ms,
                round_trip_ms,
                output.timing,
                output.passes,
                verification,
            )
        }
    };

    if report.verification.passed() {
        info!(
            "{}: max error {:e} within tolerance {:e}",
            kernel, report.verification.max_error, tolerance
        );
    } else {
        warn!(
            "{}: {} mismatch(es), max error {:e} exceeds tolerance {:e}",
            kernel, report.verification.mismatches, report.verification.max_error, tolerance
        );
    }
    Ok(report)
}

/// Main benchmark runner
pub struct BenchmarkRunner {
    config: BenchmarkConfig,
}

impl BenchmarkRunner {
    pub fn new(config: BenchmarkConfig) -> Self {
        Self { config }
    }

    /// Runner configured from `configs/kernels.json`, or defaults if absent
    pub fn from_config_file() -> BenchmarkResult<Self> {
        Ok(Self::new(ConfigLoader::load_kernels_config(
            KERNELS_CONFIG_PATH,
        )?))
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    /// Seeded random workload for `kernel` at its configured size
    pub fn workload(&self, kernel: Kernel) -> Workload {
        Workload::random(
            kernel,
            self.config.problem_size(kernel),
            self.config.seed,
            self.config.reduce_combine,
        )
    }

    /// Run all available benchmarks
    pub fn run_all_benchmarks(&self) -> BenchmarkResult<Vec<BenchmarkReport>> {
        info!("Starting kernel benchmark suite");
        self.run_kernels(&Kernel::ALL)
    }

    /// Run a specific benchmark by name
    pub fn run_benchmark(&self, benchmark_name: &str) -> BenchmarkResult<BenchmarkReport> {
        let kernel =
            Kernel::from_name(benchmark_name).ok_or_else(|| BenchmarkError::UnknownBenchmark {
                name: benchmark_name.to_string(),
            })?;
        let mut reports = self.run_kernels(&[kernel])?;
        reports.pop().ok_or_else(|| BenchmarkError::UnknownBenchmark {
            name: benchmark_name.to_string(),
        })
    }

    /// List available benchmarks
    pub fn list_benchmarks() {
        println!("Available benchmarks:");
        for kernel in Kernel::ALL {
            println!("  {:<13} - {}", kernel.name(), kernel.description());
        }
    }

    /// One device context and module shared by every kernel in `selection`.
    fn run_kernels(&self, selection: &[Kernel]) -> BenchmarkResult<Vec<BenchmarkReport>> {
        let ctx = DeviceContext::acquire(&self.config.device)?;
        let adapter = ctx.adapter();

        info!("{}", "=".repeat(80));
        info!("GPU Kernel Benchmark");
        info!(
            "Adapter: {} ({}, {})",
            adapter.name, adapter.backend, adapter.device_type
        );
        info!("{}", "=".repeat(80));

        let module = KernelModule::load(&ctx)?;
        let mut reports = Vec::with_capacity(selection.len());
        for &kernel in selection {
            info!(
                "Running {} at problem size {}",
                kernel,
                self.config.problem_size(kernel)
            );
            let workload = self.workload(kernel);
            reports.push(run_workload(&module, &workload)?);
        }
        module.unload();

        info!("All benchmarks completed");
        Ok(reports)
    }
}
