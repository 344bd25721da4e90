//! 512 x 512 tiled matrix multiply of constant matrices.
//!
//! With A filled with 1.0 and B with 2.0 every element of C is 2 * 512 = 1024.
//!
//! Run with: cargo run --release --bin tiled_matmul

use log::{error, info};
use tiled_kernels::benchmarks::{BenchmarkResult, Workload, print_report, run_workload};
use tiled_kernels::gpu::{DeviceConfig, DeviceContext};
use tiled_kernels::kernels::{Kernel, KernelModule, ReduceCombine};

const WIDTH: usize = 512;
const A_VALUE: f32 = 1.0;
const B_VALUE: f32 = 2.0;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        error!("tiled_matmul failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> BenchmarkResult<()> {
    let ctx = DeviceContext::acquire(&DeviceConfig::default())?;
    let module = KernelModule::load(&ctx)?;
    info!("Multiplying two {}x{} matrices", WIDTH, WIDTH);

    let workload = Workload::constant(
        Kernel::TiledMatMul,
        WIDTH,
        A_VALUE,
        B_VALUE,
        ReduceCombine::Device,
    );
    let report = run_workload(&module, &workload)?;
    print_report(&report);

    report.verification.ensure()?;
    Ok(())
}
