//! Benchmark harness: times the host reference against the device kernels
//! and verifies the device results.

pub mod benchmark_errors;
pub mod benchmark_runner;
pub mod benchmark_types;
pub mod performance_metrics;
pub mod workload;

pub use benchmark_errors::{BenchmarkError, BenchmarkResult};
pub use benchmark_runner::{BenchmarkRunner, ConfigLoader, KERNELS_CONFIG_PATH, run_workload};
pub use benchmark_types::{BenchmarkConfig, BenchmarkReport, Verification};
pub use performance_metrics::{print_report, print_summary, time_host, verify};
pub use workload::Workload;
