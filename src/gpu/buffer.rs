//! Device-resident buffers and host <-> device transfers.

use std::marker::PhantomData;
use std::sync::mpsc;

use bytemuck::Pod;
use log::trace;
use wgpu::util::DeviceExt;

use crate::errors::{KernelError, KernelResult};
use crate::gpu::context::DeviceContext;

/// A typed storage buffer on the device.
///
/// The buffer is released exactly once, when the value is dropped, whichever
/// path the owning call takes out.
pub struct DeviceBuffer<'ctx, T: Pod> {
    ctx: &'ctx DeviceContext,
    buffer: wgpu::Buffer,
    len: usize,
    label: String,
    _marker: PhantomData<T>,
}

impl<'ctx, T: Pod> DeviceBuffer<'ctx, T> {
    /// Allocate an uninitialised (zeroed) storage buffer of `len` elements.
    pub fn zeroed(ctx: &'ctx DeviceContext, len: usize, label: &str) -> KernelResult<Self> {
        let size = checked_size::<T>(ctx, len, label)?;
        let (buffer, error) = ctx.scoped(wgpu::ErrorFilter::OutOfMemory, |device| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size,
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_SRC
                    | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });
        if let Some(error) = error {
            return Err(allocation_error(label, size, error));
        }
        trace!("Allocated '{}' ({} bytes)", label, size);
        Ok(Self::wrap(ctx, buffer, len, label))
    }

    /// Allocate a storage buffer and copy `data` into it.
    pub fn from_slice(ctx: &'ctx DeviceContext, data: &[T], label: &str) -> KernelResult<Self> {
        if data.is_empty() {
            return Self::zeroed(ctx, 0, label);
        }
        let size = checked_size::<T>(ctx, data.len(), label)?;
        let (buffer, error) = ctx.scoped(wgpu::ErrorFilter::OutOfMemory, |device| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_SRC
                    | wgpu::BufferUsages::COPY_DST,
            })
        });
        if let Some(error) = error {
            return Err(allocation_error(label, size, error));
        }
        trace!("Uploaded '{}' ({} bytes)", label, size);
        Ok(Self::wrap(ctx, buffer, data.len(), label))
    }

    fn wrap(ctx: &'ctx DeviceContext, buffer: wgpu::Buffer, len: usize, label: &str) -> Self {
        Self {
            ctx,
            buffer,
            len,
            label: label.to_string(),
            _marker: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn size_bytes(&self) -> u64 {
        (self.len * std::mem::size_of::<T>()) as u64
    }

    pub(crate) fn binding(&self) -> wgpu::BindingResource<'_> {
        self.buffer.as_entire_binding()
    }

    /// Copy the buffer back to the host.
    ///
    /// Blocks until every previously submitted command touching the buffer has
    /// completed.
    pub fn to_vec(&self) -> KernelResult<Vec<T>> {
        if self.len == 0 {
            return Ok(Vec::new());
        }
        let size = self.size_bytes();
        let device = self.ctx.device();

        let (staging, error) = self.ctx.scoped(wgpu::ErrorFilter::OutOfMemory, |device| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("readback staging"),
                size,
                usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });
        if let Some(error) = error {
            return Err(allocation_error(&self.label, size, error));
        }

        let (_, error) = self.ctx.scoped(wgpu::ErrorFilter::Validation, |device| {
            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("readback"),
            });
            encoder.copy_buffer_to_buffer(&self.buffer, 0, &staging, 0, size);
            self.ctx.queue().submit(Some(encoder.finish()));
        });
        if let Some(error) = error {
            staging.destroy();
            return Err(KernelError::transfer(&self.label, error.to_string()));
        }

        let slice = staging.slice(..);
        let (sender, receiver) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        let _ = device.poll(wgpu::Maintain::Wait);

        let mapped = receiver
            .recv()
            .map_err(|_| KernelError::transfer(&self.label, "map callback was dropped"))
            .and_then(|result| {
                result.map_err(|e| KernelError::transfer(&self.label, e.to_string()))
            });
        if let Err(error) = mapped {
            staging.destroy();
            return Err(error);
        }

        let data = slice.get_mapped_range();
        let result: Vec<T> = bytemuck::cast_slice(&data).to_vec();
        drop(data);
        staging.unmap();
        staging.destroy();

        trace!("Downloaded '{}' ({} bytes)", self.label, size);
        Ok(result)
    }
}

impl<T: Pod> Drop for DeviceBuffer<'_, T> {
    fn drop(&mut self) {
        trace!("Releasing '{}'", self.label);
        self.buffer.destroy();
    }
}

impl<T: Pod> std::fmt::Debug for DeviceBuffer<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceBuffer")
            .field("label", &self.label)
            .field("len", &self.len)
            .finish()
    }
}

/// A small uniform block, such as kernel parameters.
pub(crate) fn uniform<P: Pod>(
    ctx: &DeviceContext,
    params: &P,
    label: &str,
) -> KernelResult<wgpu::Buffer> {
    let (buffer, error) = ctx.scoped(wgpu::ErrorFilter::OutOfMemory, |device| {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(params),
            usage: wgpu::BufferUsages::UNIFORM,
        })
    });
    match error {
        Some(error) => Err(allocation_error(
            label,
            std::mem::size_of::<P>() as u64,
            error,
        )),
        None => Ok(buffer),
    }
}

/// Byte size of `len` elements, rejected up front when it cannot be bound.
fn checked_size<T: Pod>(ctx: &DeviceContext, len: usize, label: &str) -> KernelResult<u64> {
    let requested_bytes = (len as u64).saturating_mul(std::mem::size_of::<T>() as u64);
    let limit = (ctx.limits().max_storage_buffer_binding_size as u64)
        .min(ctx.limits().max_buffer_size);
    if requested_bytes > limit {
        return Err(KernelError::ResourceExhaustion {
            label: label.to_string(),
            requested_bytes,
            message: format!("exceeds the device storage binding limit of {limit} bytes"),
        });
    }
    // Zero-sized buffers cannot be bound; keep one element of backing store.
    Ok(requested_bytes.max(std::mem::size_of::<T>() as u64))
}

fn allocation_error(label: &str, requested_bytes: u64, error: wgpu::Error) -> KernelError {
    KernelError::ResourceExhaustion {
        label: label.to_string(),
        requested_bytes,
        message: error.to_string(),
    }
}
