//! GPU device layer built on wgpu.
//!
//! This module owns everything that touches the device directly: acquiring
//! and releasing it, staging buffers in and out of device memory, and timing
//! launches.
//!
//! # Usage
//!
//! ```ignore
//! use tiled_kernels::gpu::{DeviceBuffer, DeviceConfig, DeviceContext};
//!
//! let ctx = DeviceContext::acquire(&DeviceConfig::default())?;
//! let input = DeviceBuffer::from_slice(&ctx, &[1.0f32, 2.0, 3.0], "input")?;
//! assert_eq!(input.to_vec()?, vec![1.0, 2.0, 3.0]);
//! // `input` is released here, then `ctx`.
//! ```

pub mod buffer;
pub mod context;
pub mod timer;

pub use buffer::DeviceBuffer;
pub use context::{AdapterSummary, DeviceConfig, DeviceContext};
pub(crate) use timer::DeviceTimer;
pub use timer::{DeviceTiming, TimingSource};
