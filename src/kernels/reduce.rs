//! Host-side launcher for the tree reduction kernel.
//!
//! One pass folds every workgroup's slice into a single partial sum. Partials
//! are combined either by further passes of the same kernel or on the host.
//!
//! The result follows the fixed tree order of the stride schedule, so the same
//! input with the same block size on the same hardware generation gives a
//! bit-identical sum. It is not the sequential left-to-right sum, and nothing
//! is promised across hardware generations.

use log::debug;
use serde::{Deserialize, Serialize};

use super::module::Dispatch;
use super::{BLOCK_SIZE, Kernel, KernelModule, KernelOutput, KernelParams};
use crate::errors::KernelResult;
use crate::gpu::{DeviceBuffer, buffer};
use crate::launch::LaunchGeometry;

/// Where per-workgroup partial sums are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReduceCombine {
    /// Re-launch the kernel on the partials until one value remains.
    #[default]
    Device,
    /// Read the first pass's partials back and sum them on the host in order.
    Host,
}

/// Sum `input` on the device.
pub fn reduce_sum(
    module: &KernelModule<'_>,
    input: &[f32],
    combine: ReduceCombine,
) -> KernelResult<KernelOutput<f32>> {
    let kernel = Kernel::Reduce;
    let first_geometry = kernel.geometry(input.len())?;
    if input.is_empty() {
        return Ok(KernelOutput::skipped(0.0, first_geometry));
    }

    let ctx = module.context();
    let mut current = DeviceBuffer::from_slice(ctx, input, "reduce.input")?;
    // Buffers read by earlier passes stay alive until the launch completes.
    let mut consumed = Vec::new();
    let mut dispatches = Vec::new();
    let mut len = input.len();

    loop {
        let pass = dispatches.len();
        let geometry = LaunchGeometry::linear(kernel.name(), len, BLOCK_SIZE)?;
        let groups = LaunchGeometry::linear_groups(len, BLOCK_SIZE);

        let partials =
            DeviceBuffer::<f32>::zeroed(ctx, groups, &format!("reduce.partials.{pass}"))?;
        let params = buffer::uniform(
            ctx,
            &KernelParams::new(kernel, len, groups)?,
            &format!("reduce.params.{pass}"),
        )?;
        let bind_group = module.bind(
            kernel,
            vec![
                current.binding(),
                partials.binding(),
                params.as_entire_binding(),
            ],
        )?;

        dispatches.push(Dispatch {
            bind_group,
            geometry,
        });
        consumed.push(std::mem::replace(&mut current, partials));
        len = groups;

        if len == 1 || combine == ReduceCombine::Host {
            break;
        }
    }

    let timing = module.launch(kernel, &dispatches)?;
    let partials = current.to_vec()?;
    drop(consumed);
    let value = match combine {
        ReduceCombine::Device => partials[0],
        ReduceCombine::Host => partials.iter().sum(),
    };
    debug!(
        "reduce: {} elements, {} pass(es), {} partial(s) combined on {:?}",
        input.len(),
        dispatches.len(),
        partials.len(),
        combine
    );

    Ok(KernelOutput {
        value,
        timing,
        geometry: first_geometry,
        passes: dispatches.len(),
    })
}

/// Number of passes a device-side combination needs for `len` elements.
pub fn device_pass_count(len: usize) -> usize {
    let block = BLOCK_SIZE as usize;
    let mut passes = 0;
    let mut remaining = len;
    while remaining > 0 {
        passes += 1;
        remaining = remaining.div_ceil(block);
        if remaining == 1 {
            break;
        }
    }
    passes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_pass_count() {
        assert_eq!(device_pass_count(0), 0);
        assert_eq!(device_pass_count(1), 1);
        assert_eq!(device_pass_count(256), 1);
        assert_eq!(device_pass_count(257), 2);
        assert_eq!(device_pass_count(65_536), 2);
        assert_eq!(device_pass_count(65_537), 3);
        assert_eq!(device_pass_count(10_000_000), 3);
        assert_eq!(device_pass_count(20_000_000), 4);
    }

    #[test]
    fn test_default_combine_is_device() {
        assert_eq!(ReduceCombine::default(), ReduceCombine::Device);
    }
}
