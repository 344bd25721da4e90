//! Timing, verification and report printing for benchmarks.

use log::{info, warn};
use std::time::Instant;

use super::benchmark_types::{BenchmarkReport, Verification};
use crate::kernels::Kernel;

/// Run `f` once and return its result with the elapsed wall-clock time in ms.
pub fn time_host<R, F>(name: &str, f: F) -> (R, f64)
where
    F: FnOnce() -> R,
{
    info!("Timing {}...", name);
    let start = Instant::now();
    let result = f();
    let elapsed_ms = start.elapsed().as_secs_f64() * 1_000.0;
    (result, elapsed_ms)
}

/// Compare a device result with the reference element by element.
pub fn verify(kernel: Kernel, expected: &[f32], actual: &[f32], tolerance: f32) -> Verification {
    let mut max_error = 0.0f32;
    let mut mismatches = 0;
    for (i, (e, a)) in expected.iter().zip(actual).enumerate() {
        let error = (e - a).abs();
        // NaN compares false everywhere; count it as a mismatch.
        if error > tolerance || error.is_nan() {
            if mismatches == 0 {
                warn!(
                    "{}: first mismatch at index {}: expected={}, actual={}, diff={}",
                    kernel, i, e, a, error
                );
            }
            mismatches += 1;
        }
        // f32::max drops NaN; keep it so the report shows the failure.
        if error.is_nan() || error > max_error {
            max_error = error;
        }
    }

    Verification {
        kernel,
        max_error,
        tolerance,
        mismatches,
        expected_len: expected.len(),
        actual_len: actual.len(),
    }
}

/// Prints one benchmark report
pub fn print_report(report: &BenchmarkReport) {
    let verification = &report.verification;

    println!("\n📊 {} (problem size {})", report.kernel, report.problem_size);
    println!("   Host reference:  {:.3} ms", report.host_time_ms);
    println!(
        "   Device kernel:   {:.3} ms ({:?}, {} pass(es))",
        report.device_time_ms, report.timing_source, report.passes
    );
    println!("   Round trip:      {:.3} ms", report.round_trip_ms);
    println!("   Speedup:         {:.2}x", report.speedup);
    if report.device_time_ms > 0.0 {
        println!(
            "   Transfer overhead: {:.2}x kernel time",
            report.overhead_ratio()
        );
    }
    println!(
        "   Max abs error:   {:e} (tolerance {:e})",
        verification.max_error, verification.tolerance
    );

    if verification.passed() {
        println!("   ✅ Result matches the reference");
    } else if verification.expected_len != verification.actual_len {
        println!(
            "   ❌ Result has {} elements, reference has {}",
            verification.actual_len, verification.expected_len
        );
    } else {
        println!(
            "   ❌ {} element(s) beyond tolerance",
            verification.mismatches
        );
    }
}

/// Prints every report followed by a speedup ranking
pub fn print_summary(reports: &[BenchmarkReport]) {
    if reports.is_empty() {
        return;
    }

    println!("\n{}", "=".repeat(80));
    println!("Detailed Results");
    println!("{}", "=".repeat(80));

    for report in reports {
        print_report(report);
    }

    println!("\n{}", "=".repeat(80));
    println!("Performance Analysis");
    println!("{}", "=".repeat(80));

    println!("\n🚀 Speedup Rankings (largest to smallest):");
    let mut sorted: Vec<&BenchmarkReport> = reports.iter().collect();
    sorted.sort_by(|a, b| b.speedup.total_cmp(&a.speedup));

    for (i, report) in sorted.iter().enumerate() {
        let rank_emoji = match i {
            0 => "🥇",
            1 => "🥈",
            2 => "🥉",
            _ => "  ",
        };
        println!(
            "   {} {}: {:.2}x ({:.3} ms host vs {:.3} ms device)",
            rank_emoji, report.kernel, report.speedup, report.host_time_ms, report.device_time_ms
        );
    }

    let failed = reports.iter().filter(|r| !r.verification.passed()).count();
    println!(
        "\n🔎 Verification: {}/{} passed",
        reports.len() - failed,
        reports.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_counts_mismatches() {
        let verification = verify(
            Kernel::TiledMatMul,
            &[1.0, 2.0, 3.0, 4.0],
            &[1.0, 2.01, 3.0, 5.0],
            1e-3,
        );
        assert_eq!(verification.mismatches, 2);
        assert_eq!(verification.max_error, 1.0);
        assert!(!verification.passed());
    }

    #[test]
    fn test_verify_exact_match() {
        let verification = verify(Kernel::VectorAdd, &[1.5, -2.0], &[1.5, -2.0], 0.0);
        assert!(verification.passed());
        assert!(verification.ensure().is_ok());
    }

    #[test]
    fn test_verify_nan_is_mismatch() {
        let verification = verify(
            Kernel::VectorAdd,
            &[1.0, 2.0, 3.0],
            &[1.0, f32::NAN, 4.0],
            0.0,
        );
        assert_eq!(verification.mismatches, 2);
        assert!(verification.max_error.is_nan());
        assert!(!verification.passed());
    }

    #[test]
    fn test_verify_length_mismatch() {
        let verification = verify(Kernel::VectorAdd, &[1.0, 2.0], &[1.0], 0.0);
        assert!(!verification.passed());
        assert!(verification.ensure().is_err());
    }

    #[test]
    fn test_time_host_returns_result() {
        let (value, elapsed_ms) = time_host("sum", || (1..=10).sum::<i32>());
        assert_eq!(value, 55);
        assert!(elapsed_ms >= 0.0);
    }
}
