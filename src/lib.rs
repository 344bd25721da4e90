//! Data-parallel GPU kernels on wgpu with a sequential reference and a
//! benchmark harness.
//!
//! The library provides three kernels (vector addition, tree reduction and
//! tiled matrix multiplication), the device context and buffers they run on,
//! the launch-geometry rules that size their dispatches, and CPU versions of
//! each computation for verification.

pub mod benchmarks;
pub mod errors;
pub mod gpu;
pub mod kernels;
pub mod launch;
pub mod reference;

pub use errors::{KernelError, KernelResult, VerificationError, VerificationResult};
pub use gpu::{DeviceBuffer, DeviceConfig, DeviceContext};
pub use kernels::{Kernel, KernelModule, KernelOutput, ReduceCombine};
pub use launch::{Dim3, LaunchGeometry};
