//! The kernel set: vector addition, tree reduction and tiled matrix multiply.
//!
//! Kernels form a closed set. Each variant carries a fixed launch-geometry
//! rule, a fixed shared-memory footprint and its binding layout, all known at
//! compile time.
//!
//! # Usage
//!
//! ```ignore
//! use tiled_kernels::gpu::{DeviceConfig, DeviceContext};
//! use tiled_kernels::kernels::{KernelModule, vector_add};
//!
//! let ctx = DeviceContext::acquire(&DeviceConfig::default())?;
//! let module = KernelModule::load(&ctx)?;
//! let sum = vector_add(&module, &a, &b)?;
//! module.unload();
//! ```

pub mod matmul;
pub mod module;
pub mod reduce;
pub mod shaders;
pub mod vector_add;

use serde::{Deserialize, Serialize};

use crate::errors::{KernelError, KernelResult};
use crate::gpu::{DeviceTiming, TimingSource};
use crate::launch::{Dim3, LaunchGeometry};

pub use matmul::tiled_matmul;
pub use module::KernelModule;
pub use reduce::{ReduceCombine, reduce_sum};
pub use vector_add::vector_add;

/// Invocations per workgroup for the 1-D kernels. Must be a power of two for
/// the reduction's halving stride schedule.
pub const BLOCK_SIZE: u32 = 256;

/// Edge of the square matrix tile held in workgroup memory.
pub const TILE_SIZE: u32 = 16;

const _: () = assert!(BLOCK_SIZE.is_power_of_two());
const _: () = assert!(TILE_SIZE * TILE_SIZE <= 256);

/// Absolute tolerance for accumulated dot products.
pub const MATMUL_TOLERANCE: f32 = 1e-3;

/// Lower bound on the reduction tolerance.
pub const REDUCE_MIN_TOLERANCE: f32 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kernel {
    #[serde(rename = "vector_add")]
    VectorAdd,
    #[serde(rename = "reduce")]
    Reduce,
    #[serde(rename = "tiled_matmul")]
    TiledMatMul,
}

/// How a kernel binding is accessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    ReadOnlyStorage,
    ReadWriteStorage,
    Uniform,
}

impl Kernel {
    pub const ALL: [Kernel; 3] = [Kernel::VectorAdd, Kernel::Reduce, Kernel::TiledMatMul];

    pub fn name(&self) -> &'static str {
        match self {
            Kernel::VectorAdd => "vector_add",
            Kernel::Reduce => "reduce",
            Kernel::TiledMatMul => "tiled_matmul",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kernel| kernel.name() == name)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Kernel::VectorAdd => "Element-wise addition of two f32 vectors",
            Kernel::Reduce => "Tree reduction (sum) of an f32 vector",
            Kernel::TiledMatMul => "Square f32 matrix multiply with shared-memory tiles",
        }
    }

    /// WGSL entry point name.
    pub fn entry_point(&self) -> &'static str {
        match self {
            Kernel::VectorAdd => "vector_add",
            Kernel::Reduce => "reduce_sum",
            Kernel::TiledMatMul => "tiled_matmul",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Kernel::VectorAdd => 0,
            Kernel::Reduce => 1,
            Kernel::TiledMatMul => 2,
        }
    }

    pub fn block_shape(&self) -> Dim3 {
        match self {
            Kernel::VectorAdd | Kernel::Reduce => Dim3::linear(BLOCK_SIZE),
            Kernel::TiledMatMul => Dim3::planar(TILE_SIZE, TILE_SIZE),
        }
    }

    /// Bytes of workgroup memory one workgroup uses.
    pub fn shared_memory_bytes(&self) -> u32 {
        let f32_bytes = std::mem::size_of::<f32>() as u32;
        match self {
            Kernel::VectorAdd => 0,
            Kernel::Reduce => BLOCK_SIZE * f32_bytes,
            Kernel::TiledMatMul => 2 * TILE_SIZE * TILE_SIZE * f32_bytes,
        }
    }

    /// Binding layout, in binding-index order.
    pub fn bindings(&self) -> &'static [BindingKind] {
        use BindingKind::*;
        match self {
            Kernel::VectorAdd | Kernel::TiledMatMul => {
                &[ReadOnlyStorage, ReadOnlyStorage, ReadWriteStorage, Uniform]
            }
            Kernel::Reduce => &[ReadOnlyStorage, ReadWriteStorage, Uniform],
        }
    }

    /// Launch geometry for a problem of `problem_size`.
    ///
    /// `problem_size` is the element count for the 1-D kernels and the matrix
    /// width for the matrix multiply.
    pub fn geometry(&self, problem_size: usize) -> KernelResult<LaunchGeometry> {
        match self {
            Kernel::VectorAdd | Kernel::Reduce => {
                LaunchGeometry::linear(self.name(), problem_size, BLOCK_SIZE)
            }
            Kernel::TiledMatMul => {
                LaunchGeometry::tiled(self.name(), problem_size, problem_size, TILE_SIZE)
            }
        }
    }

    /// Absolute error allowed against the sequential reference.
    ///
    /// `magnitude` is the sum of absolute input values for the reduction and is
    /// ignored by the other kernels.
    pub fn tolerance(&self, problem_size: usize, magnitude: f32) -> f32 {
        match self {
            Kernel::VectorAdd => 0.0,
            Kernel::Reduce => {
                let depth = (problem_size.max(2) as f32).log2();
                (depth * f32::EPSILON * magnitude).max(REDUCE_MIN_TOLERANCE)
            }
            Kernel::TiledMatMul => MATMUL_TOLERANCE,
        }
    }
}

impl std::fmt::Display for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Uniform parameters, laid out to match `KernelParams` in WGSL.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct KernelParams {
    pub len: u32,
    pub width: u32,
    pub _pad: [u32; 2],
}

impl KernelParams {
    pub(crate) fn new(kernel: Kernel, len: usize, width: usize) -> KernelResult<Self> {
        let field = |value: usize| {
            u32::try_from(value).map_err(|_| {
                KernelError::launch(kernel.name(), format!("{value} does not fit in 32 bits"))
            })
        };
        Ok(Self {
            len: field(len)?,
            width: field(width)?,
            _pad: [0; 2],
        })
    }
}

/// A device result with the launch that produced it.
#[derive(Debug, Clone)]
pub struct KernelOutput<T> {
    pub value: T,
    pub timing: DeviceTiming,
    /// Geometry of the first (or only) dispatch.
    pub geometry: LaunchGeometry,
    /// Number of dispatches recorded for the launch.
    pub passes: usize,
}

impl<T> KernelOutput<T> {
    /// Output of an empty problem: nothing was sent to the device.
    pub(crate) fn skipped(value: T, geometry: LaunchGeometry) -> Self {
        Self {
            value,
            timing: DeviceTiming {
                elapsed_ms: 0.0,
                source: TimingSource::HostWallClock,
            },
            geometry,
            passes: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for kernel in Kernel::ALL {
            assert_eq!(Kernel::from_name(kernel.name()), Some(kernel));
        }
        assert_eq!(Kernel::from_name("softmax"), None);
    }

    #[test]
    fn test_params_layout_is_uniform_sized() {
        assert_eq!(std::mem::size_of::<KernelParams>(), 16);
    }

    #[test]
    fn test_shared_memory_within_default_limit() {
        let limit = wgpu::Limits::default().max_compute_workgroup_storage_size;
        for kernel in Kernel::ALL {
            assert!(kernel.shared_memory_bytes() <= limit);
        }
    }

    #[test]
    fn test_bindings_match_shader_order() {
        assert_eq!(Kernel::Reduce.bindings().len(), 3);
        assert_eq!(Kernel::VectorAdd.bindings()[2], BindingKind::ReadWriteStorage);
        assert_eq!(Kernel::TiledMatMul.bindings()[3], BindingKind::Uniform);
    }

    #[test]
    fn test_tolerances() {
        assert_eq!(Kernel::VectorAdd.tolerance(1000, 1.0), 0.0);
        assert_eq!(Kernel::TiledMatMul.tolerance(512, 0.0), MATMUL_TOLERANCE);
        assert_eq!(Kernel::Reduce.tolerance(1, 1.0), REDUCE_MIN_TOLERANCE);

        let large = Kernel::Reduce.tolerance(10_000_000, 10_000_000.0);
        assert!(large > 1.0 && large < 100.0);
    }

    #[test]
    fn test_matmul_geometry_is_square() {
        let geometry = Kernel::TiledMatMul.geometry(17).unwrap();
        assert_eq!(geometry.grid(), Dim3::planar(2, 2));
        assert_eq!(geometry.block(), Dim3::planar(TILE_SIZE, TILE_SIZE));
    }
}
