//! Error types for the kernel library.
//!
//! Device-side faults (allocation, transfer, launch) and verification findings
//! are kept apart: the first group aborts a run, the second is reported.

mod kernel_error;
mod verification_error;

pub use kernel_error::KernelError;
pub use verification_error::VerificationError;

/// Result type alias for device and kernel operations.
pub type KernelResult<T> = std::result::Result<T, KernelError>;

/// Result type alias for verification checks.
pub type VerificationResult<T> = std::result::Result<T, VerificationError>;
