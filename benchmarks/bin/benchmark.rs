//! Main benchmark CLI executable.

use log::error;
use std::env;
use tiled_kernels::benchmarks::{
    BenchmarkError, BenchmarkReport, BenchmarkResult, BenchmarkRunner, print_summary,
};

fn main() {
    env_logger::init();

    let result = run_benchmarks();

    if let Err(e) = result {
        error!("Benchmark execution failed: {}", e);
        std::process::exit(1);
    }
}

fn run_benchmarks() -> BenchmarkResult<()> {
    let mut args: Vec<String> = env::args().skip(1).collect();
    let json = match args.iter().position(|arg| arg == "--json") {
        Some(index) => {
            args.remove(index);
            true
        }
        None => false,
    };

    let reports = match args.as_slice() {
        [] => BenchmarkRunner::from_config_file()?.run_all_benchmarks()?,
        [flag] if flag == "--list" => {
            BenchmarkRunner::list_benchmarks();
            return Ok(());
        }
        [flag] if flag.starts_with("--") => {
            print_usage();
            return Ok(());
        }
        [name] => vec![BenchmarkRunner::from_config_file()?.run_benchmark(name)?],
        [flag, name] if flag == "--benchmark" => {
            vec![BenchmarkRunner::from_config_file()?.run_benchmark(name)?]
        }
        _ => {
            print_usage();
            return Ok(());
        }
    };

    emit(&reports, json)
}

fn emit(reports: &[BenchmarkReport], json: bool) -> BenchmarkResult<()> {
    if json {
        let rendered = serde_json::to_string_pretty(reports)
            .map_err(|source| BenchmarkError::ReportSerializationError { source })?;
        println!("{}", rendered);
    } else {
        print_summary(reports);

        println!("\n{}", "=".repeat(80));
        println!("Benchmark Complete");
        println!("{}", "=".repeat(80));
    }
    Ok(())
}

fn print_usage() {
    println!("Usage:");
    println!("  cargo run --bin benchmark --release                    # Run all benchmarks");
    println!("  cargo run --bin benchmark --release -- --list         # List available benchmarks");
    println!("  cargo run --bin benchmark --release -- <benchmark>    # Run specific benchmark");
    println!("  cargo run --bin benchmark --release -- --benchmark <benchmark>");
    println!("  Add --json to print the reports as JSON.");
    println!();
    BenchmarkRunner::list_benchmarks();
}
