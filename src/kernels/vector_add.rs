//! Host-side launcher for the vector addition kernel.

use super::module::Dispatch;
use super::{BLOCK_SIZE, Kernel, KernelModule, KernelOutput, KernelParams};
use crate::errors::{KernelError, KernelResult};
use crate::gpu::{DeviceBuffer, buffer};
use crate::launch::LaunchGeometry;

/// Compute `a[i] + b[i]` on the device.
///
/// The output buffer is read back in full once the launch has completed, so
/// the caller never observes a partially written result.
pub fn vector_add(
    module: &KernelModule<'_>,
    a: &[f32],
    b: &[f32],
) -> KernelResult<KernelOutput<Vec<f32>>> {
    let kernel = Kernel::VectorAdd;
    if a.len() != b.len() {
        return Err(KernelError::InputLengthMismatch {
            label: "vector_add.b".to_string(),
            expected: a.len(),
            actual: b.len(),
        });
    }

    let n = a.len();
    let geometry = kernel.geometry(n)?;
    if n == 0 {
        return Ok(KernelOutput::skipped(Vec::new(), geometry));
    }

    let ctx = module.context();
    let a_dev = DeviceBuffer::from_slice(ctx, a, "vector_add.a")?;
    let b_dev = DeviceBuffer::from_slice(ctx, b, "vector_add.b")?;
    let out_dev = DeviceBuffer::<f32>::zeroed(ctx, n, "vector_add.out")?;
    let groups = LaunchGeometry::linear_groups(n, BLOCK_SIZE);
    let params = buffer::uniform(
        ctx,
        &KernelParams::new(kernel, n, groups)?,
        "vector_add.params",
    )?;

    let bind_group = module.bind(
        kernel,
        vec![
            a_dev.binding(),
            b_dev.binding(),
            out_dev.binding(),
            params.as_entire_binding(),
        ],
    )?;
    let timing = module.launch(kernel, &[Dispatch { bind_group, geometry }])?;
    let value = out_dev.to_vec()?;

    Ok(KernelOutput {
        value,
        timing,
        geometry,
        passes: 1,
    })
}
