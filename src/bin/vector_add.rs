//! Vector addition on the device, checked against the host.
//!
//! Run with: cargo run --release --bin vector_add

use log::{error, info};
use tiled_kernels::benchmarks::{BenchmarkResult, Workload, print_report, run_workload};
use tiled_kernels::gpu::{DeviceConfig, DeviceContext};
use tiled_kernels::kernels::{Kernel, KernelModule, ReduceCombine};

const PROBLEM_SIZE: usize = 1 << 20;
const SEED: u64 = 12345;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        error!("vector_add failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> BenchmarkResult<()> {
    let ctx = DeviceContext::acquire(&DeviceConfig::default())?;
    let module = KernelModule::load(&ctx)?;
    info!("Adding two vectors of {} elements", PROBLEM_SIZE);

    let workload = Workload::random(Kernel::VectorAdd, PROBLEM_SIZE, SEED, ReduceCombine::Device);
    let report = run_workload(&module, &workload)?;
    print_report(&report);

    report.verification.ensure()?;
    Ok(())
}
