//! Explicit device context: one adapter, one device, one queue.
//!
//! A context is acquired in scope and released when it is dropped. Buffers and
//! kernel modules borrow it, so none of them can outlive the device they were
//! created on.

use log::{debug, info, warn};
use pollster::FutureExt;
use serde::{Deserialize, Serialize};

use crate::errors::{KernelError, KernelResult};

/// Adapter selection preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Prefer the discrete, high-performance adapter when several exist.
    pub high_performance: bool,
    /// Use the software fallback adapter (useful on headless CI machines).
    pub force_fallback_adapter: bool,
    /// Request timestamp queries so launches are timed on the device.
    pub enable_timestamps: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            high_performance: true,
            force_fallback_adapter: false,
            enable_timestamps: true,
        }
    }
}

/// Adapter details captured at acquisition time.
#[derive(Debug, Clone, Serialize)]
pub struct AdapterSummary {
    pub name: String,
    pub backend: String,
    pub device_type: String,
}

/// Owns the wgpu device and queue for the lifetime of a run.
pub struct DeviceContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    limits: wgpu::Limits,
    adapter: AdapterSummary,
    timestamps: bool,
}

impl DeviceContext {
    /// Acquire a device, blocking the calling thread until it is ready.
    pub fn acquire(config: &DeviceConfig) -> KernelResult<Self> {
        Self::acquire_async(config).block_on()
    }

    pub async fn acquire_async(config: &DeviceConfig) -> KernelResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let power_preference = if config.high_performance {
            wgpu::PowerPreference::HighPerformance
        } else {
            wgpu::PowerPreference::LowPower
        };
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: None,
                force_fallback_adapter: config.force_fallback_adapter,
            })
            .await
            .ok_or(KernelError::NoAdapter)?;

        let info = adapter.get_info();
        let adapter_summary = AdapterSummary {
            name: info.name.clone(),
            backend: format!("{:?}", info.backend),
            device_type: format!("{:?}", info.device_type),
        };

        // Large reductions need the adapter's full storage binding size, not
        // the conservative defaults.
        let adapter_limits = adapter.limits();
        let required_limits = wgpu::Limits {
            max_storage_buffer_binding_size: adapter_limits.max_storage_buffer_binding_size,
            max_buffer_size: adapter_limits.max_buffer_size,
            ..Default::default()
        };

        let timestamps =
            config.enable_timestamps && adapter.features().contains(wgpu::Features::TIMESTAMP_QUERY);
        if config.enable_timestamps && !timestamps {
            warn!(
                "Adapter '{}' has no timestamp queries, falling back to host wall-clock timing",
                info.name
            );
        }
        let required_features = if timestamps {
            wgpu::Features::TIMESTAMP_QUERY
        } else {
            wgpu::Features::empty()
        };

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("tiled-kernels device"),
                    required_features,
                    required_limits: required_limits.clone(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await
            .map_err(|e| KernelError::DeviceRequestFailed {
                message: e.to_string(),
            })?;

        info!(
            "Acquired GPU '{}' ({}, {})",
            adapter_summary.name, adapter_summary.backend, adapter_summary.device_type
        );

        Ok(Self {
            device,
            queue,
            limits: required_limits,
            adapter: adapter_summary,
            timestamps,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn limits(&self) -> &wgpu::Limits {
        &self.limits
    }

    pub fn adapter(&self) -> &AdapterSummary {
        &self.adapter
    }

    /// Whether launches are timed with device timestamp queries.
    pub fn has_timestamps(&self) -> bool {
        self.timestamps
    }

    /// Block until all submitted work has finished.
    pub fn wait_idle(&self) {
        let _ = self.device.poll(wgpu::Maintain::Wait);
    }

    /// Run `f` inside a wgpu error scope and return the first captured error.
    ///
    /// wgpu reports most failures asynchronously through error scopes; this
    /// turns them back into a value the caller can map onto [`KernelError`].
    pub(crate) fn scoped<T>(
        &self,
        filter: wgpu::ErrorFilter,
        f: impl FnOnce(&wgpu::Device) -> T,
    ) -> (T, Option<wgpu::Error>) {
        self.device.push_error_scope(filter);
        let value = f(&self.device);
        let error = self.device.pop_error_scope().block_on();
        (value, error)
    }
}

impl Drop for DeviceContext {
    fn drop(&mut self) {
        debug!("Releasing GPU '{}'", self.adapter.name);
        self.wait_idle();
        self.device.destroy();
    }
}

impl std::fmt::Debug for DeviceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceContext")
            .field("adapter", &self.adapter)
            .field("timestamps", &self.timestamps)
            .finish()
    }
}
