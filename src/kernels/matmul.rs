//! Host-side launcher for the tiled matrix multiply kernel.

use super::module::Dispatch;
use super::{Kernel, KernelModule, KernelOutput, KernelParams};
use crate::errors::{KernelError, KernelResult};
use crate::gpu::{DeviceBuffer, buffer};

/// Compute `C = A * B` for square row-major matrices of `width`.
///
/// Each workgroup stages one tile of A and one of B per step, so every global
/// element is read `width / TILE_SIZE` times instead of `width` times.
pub fn tiled_matmul(
    module: &KernelModule<'_>,
    a: &[f32],
    b: &[f32],
    width: usize,
) -> KernelResult<KernelOutput<Vec<f32>>> {
    let kernel = Kernel::TiledMatMul;
    let elements = width.checked_mul(width).ok_or_else(|| {
        KernelError::launch(kernel.name(), format!("width {width} overflows the element count"))
    })?;
    check_len("tiled_matmul.a", a, elements)?;
    check_len("tiled_matmul.b", b, elements)?;

    let geometry = kernel.geometry(width)?;
    if width == 0 {
        return Ok(KernelOutput::skipped(Vec::new(), geometry));
    }

    let ctx = module.context();
    let a_dev = DeviceBuffer::from_slice(ctx, a, "tiled_matmul.a")?;
    let b_dev = DeviceBuffer::from_slice(ctx, b, "tiled_matmul.b")?;
    let c_dev = DeviceBuffer::<f32>::zeroed(ctx, elements, "tiled_matmul.c")?;
    let params = buffer::uniform(
        ctx,
        &KernelParams::new(kernel, elements, width)?,
        "tiled_matmul.params",
    )?;

    let bind_group = module.bind(
        kernel,
        vec![
            a_dev.binding(),
            b_dev.binding(),
            c_dev.binding(),
            params.as_entire_binding(),
        ],
    )?;
    let timing = module.launch(kernel, &[Dispatch { bind_group, geometry }])?;
    let value = c_dev.to_vec()?;

    Ok(KernelOutput {
        value,
        timing,
        geometry,
        passes: 1,
    })
}

fn check_len(label: &str, matrix: &[f32], expected: usize) -> KernelResult<()> {
    if matrix.len() != expected {
        return Err(KernelError::InputLengthMismatch {
            label: label.to_string(),
            expected,
            actual: matrix.len(),
        });
    }
    Ok(())
}
