//! Launch timing.
//!
//! With `TIMESTAMP_QUERY` the elapsed time is read from the device: one
//! timestamp at the start of the first compute pass, one at the end of the
//! last. Without it the host measures submit-to-idle wall-clock time.

use std::sync::mpsc;
use std::time::Instant;

use serde::Serialize;

use crate::errors::{KernelError, KernelResult};
use crate::gpu::context::DeviceContext;

/// Where a device time came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimingSource {
    DeviceTimestamps,
    HostWallClock,
}

/// Elapsed time of one launch.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DeviceTiming {
    pub elapsed_ms: f64,
    pub source: TimingSource,
}

const QUERY_COUNT: u32 = 2;
const QUERY_BYTES: u64 = QUERY_COUNT as u64 * std::mem::size_of::<u64>() as u64;

/// Timestamp query resources for a single launch.
pub(crate) struct DeviceTimer<'ctx> {
    ctx: &'ctx DeviceContext,
    queries: Option<(wgpu::QuerySet, wgpu::Buffer, wgpu::Buffer)>,
    started: Option<Instant>,
}

impl<'ctx> DeviceTimer<'ctx> {
    pub(crate) fn new(ctx: &'ctx DeviceContext) -> Self {
        let queries = ctx.has_timestamps().then(|| {
            let device = ctx.device();
            let set = device.create_query_set(&wgpu::QuerySetDescriptor {
                label: Some("launch timestamps"),
                ty: wgpu::QueryType::Timestamp,
                count: QUERY_COUNT,
            });
            let resolve = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("timestamp resolve"),
                size: QUERY_BYTES,
                usage: wgpu::BufferUsages::QUERY_RESOLVE | wgpu::BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            });
            let readback = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("timestamp readback"),
                size: QUERY_BYTES,
                usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            (set, resolve, readback)
        });
        Self {
            ctx,
            queries,
            started: None,
        }
    }

    /// Timestamp writes for pass `index` of `count` passes.
    pub(crate) fn pass_writes(
        &self,
        index: usize,
        count: usize,
    ) -> Option<wgpu::ComputePassTimestampWrites<'_>> {
        let (set, _, _) = self.queries.as_ref()?;
        let first = index == 0;
        let last = index + 1 == count;
        if !first && !last {
            return None;
        }
        Some(wgpu::ComputePassTimestampWrites {
            query_set: set,
            beginning_of_pass_write_index: first.then_some(0),
            end_of_pass_write_index: last.then_some(1),
        })
    }

    /// Append query resolution to the launch's encoder.
    pub(crate) fn resolve(&self, encoder: &mut wgpu::CommandEncoder) {
        if let Some((set, resolve, readback)) = &self.queries {
            encoder.resolve_query_set(set, 0..QUERY_COUNT, resolve, 0);
            encoder.copy_buffer_to_buffer(resolve, 0, readback, 0, QUERY_BYTES);
        }
    }

    /// Mark the host-side submission instant.
    pub(crate) fn submitted(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Wait for the launch and report its duration.
    pub(crate) fn finish(self, kernel: &str) -> KernelResult<DeviceTiming> {
        self.ctx.wait_idle();
        let wall_ms = self
            .started
            .map(|start| start.elapsed().as_secs_f64() * 1000.0)
            .unwrap_or(0.0);

        let Some((set, resolve, readback)) = self.queries else {
            return Ok(DeviceTiming {
                elapsed_ms: wall_ms,
                source: TimingSource::HostWallClock,
            });
        };

        let slice = readback.slice(..);
        let (sender, receiver) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        self.ctx.wait_idle();
        receiver
            .recv()
            .map_err(|_| KernelError::launch(kernel, "timestamp map callback was dropped"))?
            .map_err(|e| KernelError::launch(kernel, format!("timestamp readback: {e}")))?;

        let ticks: [u64; 2] = {
            let data = slice.get_mapped_range();
            [
                bytemuck::pod_read_unaligned(&data[0..8]),
                bytemuck::pod_read_unaligned(&data[8..16]),
            ]
        };
        readback.unmap();
        readback.destroy();
        resolve.destroy();
        drop(set);

        let period_ns = self.ctx.queue().get_timestamp_period() as f64;
        let elapsed_ms = ticks[1].saturating_sub(ticks[0]) as f64 * period_ns / 1_000_000.0;
        Ok(DeviceTiming {
            elapsed_ms,
            source: TimingSource::DeviceTimestamps,
        })
    }
}
