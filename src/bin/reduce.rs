//! Sum of ten million ones on the device. The exact answer is 10,000,000.
//!
//! Run with: cargo run --release --bin reduce

use log::{error, info};
use tiled_kernels::benchmarks::{BenchmarkResult, Workload, print_report, run_workload};
use tiled_kernels::gpu::{DeviceConfig, DeviceContext};
use tiled_kernels::kernels::{Kernel, KernelModule, ReduceCombine};

const PROBLEM_SIZE: usize = 10_000_000;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        error!("reduce failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> BenchmarkResult<()> {
    let ctx = DeviceContext::acquire(&DeviceConfig::default())?;
    let module = KernelModule::load(&ctx)?;
    info!("Summing {} ones", PROBLEM_SIZE);

    let workload = Workload::constant(Kernel::Reduce, PROBLEM_SIZE, 1.0, 0.0, ReduceCombine::Device);
    let report = run_workload(&module, &workload)?;
    print_report(&report);

    report.verification.ensure()?;
    Ok(())
}
