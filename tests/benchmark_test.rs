//! Benchmark harness tests: workloads, reports and the runner.

use tiled_kernels::benchmarks::{
    BenchmarkConfig, BenchmarkRunner, Workload, run_workload, verify,
};
use tiled_kernels::gpu::{DeviceConfig, DeviceContext, TimingSource};
use tiled_kernels::kernels::{Kernel, KernelModule, ReduceCombine};

fn acquire() -> Option<DeviceContext> {
    match DeviceContext::acquire(&DeviceConfig::default()) {
        Ok(ctx) => Some(ctx),
        Err(e) => {
            eprintln!("Skipping GPU test: {}", e);
            None
        }
    }
}

fn small_config() -> BenchmarkConfig {
    BenchmarkConfig {
        vector_add_size: 10_000,
        reduce_size: 100_000,
        matmul_width: 33,
        ..BenchmarkConfig::default()
    }
}

#[cfg(test)]
mod report_tests {
    use super::*;

    #[test]
    fn test_workload_reports_pass_verification() {
        let Some(ctx) = acquire() else { return };
        let module = KernelModule::load(&ctx).unwrap();

        for kernel in Kernel::ALL {
            let workload = Workload::random(kernel, 100, 42, ReduceCombine::Device);
            let report = run_workload(&module, &workload).unwrap();
            assert_eq!(report.kernel, kernel);
            assert_eq!(report.problem_size, 100);
            assert!(report.verification.passed(), "{} failed verification", kernel);
            assert!(report.verification.ensure().is_ok());
            assert!(report.host_time_ms >= 0.0);
            assert!(report.device_time_ms >= 0.0);
            if ctx.has_timestamps() {
                assert_eq!(report.timing_source, TimingSource::DeviceTimestamps);
            } else {
                assert_eq!(report.timing_source, TimingSource::HostWallClock);
            }
        }
    }

    #[test]
    fn test_ten_million_ones_scenario() {
        let Some(ctx) = acquire() else { return };
        let module = KernelModule::load(&ctx).unwrap();
        let workload =
            Workload::constant(Kernel::Reduce, 10_000_000, 1.0, 0.0, ReduceCombine::Device);
        let report = run_workload(&module, &workload).unwrap();
        assert_eq!(report.verification.max_error, 0.0);
        assert_eq!(report.passes, 3);
    }

    #[test]
    fn test_report_serializes_to_json() {
        let Some(ctx) = acquire() else { return };
        let module = KernelModule::load(&ctx).unwrap();
        let workload = Workload::constant(Kernel::TiledMatMul, 16, 1.0, 2.0, ReduceCombine::Device);
        let report = run_workload(&module, &workload).unwrap();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["kernel"], "tiled_matmul");
        assert_eq!(json["problem_size"], 16);
        for field in ["host_time_ms", "device_time_ms", "speedup", "timing_source"] {
            assert!(json.get(field).is_some(), "missing {}", field);
        }
        assert_eq!(json["verification"]["mismatches"], 0);
    }

    #[test]
    fn test_mismatch_is_reported_not_raised() {
        let verification = verify(Kernel::VectorAdd, &[1.0, 2.0, 3.0], &[1.0, 2.5, 3.0], 0.0);
        assert_eq!(verification.mismatches, 1);
        assert_eq!(verification.max_error, 0.5);
        assert!(verification.ensure().is_err());
    }
}

#[cfg(test)]
mod runner_tests {
    use super::*;

    #[test]
    fn test_runner_workloads_follow_config() {
        let runner = BenchmarkRunner::new(small_config());
        assert_eq!(runner.workload(Kernel::VectorAdd).problem_size(), 10_000);
        assert_eq!(runner.workload(Kernel::Reduce).problem_size(), 100_000);
        assert_eq!(runner.workload(Kernel::TiledMatMul).problem_size(), 33);
    }

    #[test]
    fn test_run_single_benchmark() {
        if acquire().is_none() {
            return;
        }
        let runner = BenchmarkRunner::new(small_config());
        let report = runner.run_benchmark("reduce").unwrap();
        assert_eq!(report.kernel, Kernel::Reduce);
        assert!(report.verification.passed());
    }

    #[test]
    fn test_run_all_benchmarks() {
        if acquire().is_none() {
            return;
        }
        let runner = BenchmarkRunner::new(small_config());
        let reports = runner.run_all_benchmarks().unwrap();
        let kernels: Vec<Kernel> = reports.iter().map(|r| r.kernel).collect();
        assert_eq!(kernels, Kernel::ALL.to_vec());
        assert!(reports.iter().all(|r| r.verification.passed()));
    }
}
