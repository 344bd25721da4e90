//! Error types for result verification against the sequential reference.

use thiserror::Error;

/// A device result that disagrees with the reference.
///
/// The benchmark harness records these as findings instead of aborting; they
/// only become errors when a caller asks for it through
/// [`Verification::ensure`](crate::benchmarks::Verification::ensure).
#[derive(Error, Debug)]
pub enum VerificationError {
    #[error(
        "{kernel}: {mismatches} element(s) beyond tolerance {tolerance:e}, max error {max_error:e}"
    )]
    ToleranceExceeded {
        kernel: String,
        max_error: f32,
        tolerance: f32,
        mismatches: usize,
    },

    #[error("{kernel}: result has {actual} elements, reference has {expected}")]
    LengthMismatch {
        kernel: String,
        expected: usize,
        actual: usize,
    },
}
