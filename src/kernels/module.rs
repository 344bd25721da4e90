//! Compiled kernel module: shader modules, bind group layouts and pipelines.
//!
//! A [`KernelModule`] is loaded once per device and handed explicitly to every
//! launcher. There is no process-wide cache; unloading is an explicit call (or
//! the drop at the end of the owning scope).

use log::{debug, info};

use super::{BindingKind, Kernel, shaders};
use crate::errors::{KernelError, KernelResult};
use crate::gpu::{DeviceContext, DeviceTiming, DeviceTimer};
use crate::launch::LaunchGeometry;

/// Pipeline state for one kernel.
struct CompiledKernel {
    layout: wgpu::BindGroupLayout,
    pipeline: wgpu::ComputePipeline,
}

/// One recorded dispatch of a launch.
pub(crate) struct Dispatch {
    pub bind_group: wgpu::BindGroup,
    pub geometry: LaunchGeometry,
}

/// Handle to the compiled kernel set on one device.
pub struct KernelModule<'ctx> {
    ctx: &'ctx DeviceContext,
    compiled: [CompiledKernel; 3],
}

impl<'ctx> KernelModule<'ctx> {
    /// Compile every kernel for `ctx`.
    pub fn load(ctx: &'ctx DeviceContext) -> KernelResult<Self> {
        let limits = ctx.limits();
        for kernel in Kernel::ALL {
            if kernel.shared_memory_bytes() > limits.max_compute_workgroup_storage_size {
                return Err(KernelError::launch(
                    kernel.name(),
                    format!(
                        "needs {} bytes of workgroup memory, device allows {}",
                        kernel.shared_memory_bytes(),
                        limits.max_compute_workgroup_storage_size
                    ),
                ));
            }
        }

        let compiled = [
            compile(ctx, Kernel::VectorAdd)?,
            compile(ctx, Kernel::Reduce)?,
            compile(ctx, Kernel::TiledMatMul)?,
        ];
        info!("Loaded {} kernels on '{}'", compiled.len(), ctx.adapter().name);
        Ok(Self { ctx, compiled })
    }

    pub fn context(&self) -> &'ctx DeviceContext {
        self.ctx
    }

    /// Release the compiled pipelines.
    pub fn unload(self) {
        debug!("Unloading kernel module");
        drop(self);
    }

    /// Create a bind group for `kernel` from resources in binding order.
    pub(crate) fn bind(
        &self,
        kernel: Kernel,
        resources: Vec<wgpu::BindingResource<'_>>,
    ) -> KernelResult<wgpu::BindGroup> {
        let expected = kernel.bindings().len();
        if resources.len() != expected {
            return Err(KernelError::launch(
                kernel.name(),
                format!("expected {expected} bindings, got {}", resources.len()),
            ));
        }
        let entries: Vec<wgpu::BindGroupEntry> = resources
            .into_iter()
            .enumerate()
            .map(|(binding, resource)| wgpu::BindGroupEntry {
                binding: binding as u32,
                resource,
            })
            .collect();

        let (bind_group, error) = self.ctx.scoped(wgpu::ErrorFilter::Validation, |device| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(kernel.name()),
                layout: &self.compiled[kernel.index()].layout,
                entries: &entries,
            })
        });
        match error {
            Some(error) => Err(KernelError::launch(kernel.name(), error.to_string())),
            None => Ok(bind_group),
        }
    }

    /// Record `dispatches` in order, submit them together and wait.
    ///
    /// Consecutive compute passes are ordered by the queue, so a pass may read
    /// what the previous one wrote. The host blocks only until the submission
    /// completes.
    pub(crate) fn launch(
        &self,
        kernel: Kernel,
        dispatches: &[Dispatch],
    ) -> KernelResult<DeviceTiming> {
        let limits = self.ctx.limits();
        for dispatch in dispatches {
            dispatch.geometry.check_limits(kernel.name(), limits)?;
        }

        let pipeline = &self.compiled[kernel.index()].pipeline;
        let mut timer = DeviceTimer::new(self.ctx);

        let (_, error) = self.ctx.scoped(wgpu::ErrorFilter::Validation, |device| {
            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some(kernel.name()),
            });
            for (index, dispatch) in dispatches.iter().enumerate() {
                let grid = dispatch.geometry.grid();
                let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                    label: Some(kernel.entry_point()),
                    timestamp_writes: timer.pass_writes(index, dispatches.len()),
                });
                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, &dispatch.bind_group, &[]);
                if grid.volume() > 0 {
                    pass.dispatch_workgroups(grid.x, grid.y, grid.z);
                }
            }
            timer.resolve(&mut encoder);
            timer.submitted();
            self.ctx.queue().submit(Some(encoder.finish()));
        });
        if let Some(error) = error {
            return Err(KernelError::launch(kernel.name(), error.to_string()));
        }

        let timing = timer.finish(kernel.name())?;
        debug!(
            "{}: {} pass(es) in {:.3} ms ({:?})",
            kernel.name(),
            dispatches.len(),
            timing.elapsed_ms,
            timing.source
        );
        Ok(timing)
    }
}

fn compile(ctx: &DeviceContext, kernel: Kernel) -> KernelResult<CompiledKernel> {
    let source = shaders::kernel_wgsl(kernel);

    let (compiled, error) = ctx.scoped(wgpu::ErrorFilter::Validation, |device| {
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(kernel.name()),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let entries: Vec<wgpu::BindGroupLayoutEntry> = kernel
            .bindings()
            .iter()
            .enumerate()
            .map(|(binding, kind)| wgpu::BindGroupLayoutEntry {
                binding: binding as u32,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: match kind {
                        BindingKind::ReadOnlyStorage => {
                            wgpu::BufferBindingType::Storage { read_only: true }
                        }
                        BindingKind::ReadWriteStorage => {
                            wgpu::BufferBindingType::Storage { read_only: false }
                        }
                        BindingKind::Uniform => wgpu::BufferBindingType::Uniform,
                    },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            })
            .collect();

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(kernel.name()),
            entries: &entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(kernel.name()),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(kernel.name()),
            layout: Some(&pipeline_layout),
            module: &module,
            entry_point: Some(kernel.entry_point()),
            compilation_options: Default::default(),
            cache: None,
        });

        CompiledKernel { layout, pipeline }
    });

    match error {
        Some(error) => Err(KernelError::ShaderCompilationFailed {
            kernel: kernel.name().to_string(),
            message: error.to_string(),
        }),
        None => {
            debug!("Compiled {} ({})", kernel.name(), kernel.entry_point());
            Ok(compiled)
        }
    }
}
