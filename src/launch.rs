//! Launch geometry: how many workgroups to dispatch and how they are shaped.
//!
//! Every axis is sized as `ceil(problem_dim / block_dim)`, so the dispatched
//! invocations always cover the problem. Kernels discard the surplus with
//! bounds checks.
//!
//! 1-D launches that need more than [`MAX_WORKGROUPS_PER_DIMENSION`]
//! workgroups are folded onto `grid.y`. Kernels recover the flat workgroup
//! index as `workgroup_id.y * num_workgroups.x + workgroup_id.x`.

use serde::Serialize;

use crate::errors::{KernelError, KernelResult};

/// Workgroups per grid axis every WebGPU device accepts.
pub const MAX_WORKGROUPS_PER_DIMENSION: u32 = 65_535;

/// A 3-D extent. Unused axes are 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dim3 {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl Dim3 {
    pub const fn linear(x: u32) -> Self {
        Self { x, y: 1, z: 1 }
    }

    pub const fn planar(x: u32, y: u32) -> Self {
        Self { x, y, z: 1 }
    }

    /// Total number of elements in the extent.
    pub fn volume(&self) -> u64 {
        self.x as u64 * self.y as u64 * self.z as u64
    }
}

/// Grid and block shape for one kernel invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LaunchGeometry {
    grid: Dim3,
    block: Dim3,
}

impl LaunchGeometry {
    /// One invocation per element of a 1-D problem of `len` elements.
    pub fn linear(kernel: &str, len: usize, block_size: u32) -> KernelResult<Self> {
        let len = to_u32(kernel, len)?;
        let block = Dim3::linear(block_size.max(1));
        let groups = len.div_ceil(block.x);
        let grid = if groups <= MAX_WORKGROUPS_PER_DIMENSION {
            Dim3::linear(groups)
        } else {
            Dim3::planar(
                MAX_WORKGROUPS_PER_DIMENSION,
                groups.div_ceil(MAX_WORKGROUPS_PER_DIMENSION),
            )
        };
        Ok(Self { grid, block })
    }

    /// Number of workgroups a 1-D problem of `len` elements needs.
    ///
    /// A folded grid dispatches up to one row more than this; kernels skip
    /// workgroups at or past this count.
    pub fn linear_groups(len: usize, block_size: u32) -> usize {
        len.div_ceil(block_size.max(1) as usize)
    }

    /// One invocation per cell of a `rows x cols` problem, in square tiles.
    ///
    /// The grid's x axis walks columns and y walks rows.
    pub fn tiled(kernel: &str, rows: usize, cols: usize, tile: u32) -> KernelResult<Self> {
        let rows = to_u32(kernel, rows)?;
        let cols = to_u32(kernel, cols)?;
        let tile = tile.max(1);
        Ok(Self {
            grid: Dim3::planar(cols.div_ceil(tile), rows.div_ceil(tile)),
            block: Dim3::planar(tile, tile),
        })
    }

    pub fn grid(&self) -> Dim3 {
        self.grid
    }

    pub fn block(&self) -> Dim3 {
        self.block
    }

    /// Number of invocations spawned by the launch, surplus included.
    pub fn total_invocations(&self) -> u64 {
        self.grid.volume() * self.block.volume()
    }

    /// True when the launch reaches every cell of `problem`: `grid * block >=
    /// problem` on every axis, or in total for a 1-D problem.
    pub fn covers(&self, problem: Dim3) -> bool {
        if problem.y == 1 && problem.z == 1 && self.block.y == 1 && self.block.z == 1 {
            // 1-D launches may be folded onto grid.y.
            return self.total_invocations() >= problem.x as u64;
        }
        let axis = |g: u32, b: u32, p: u32| g as u64 * b as u64 >= p as u64;
        axis(self.grid.x, self.block.x, problem.x)
            && axis(self.grid.y, self.block.y, problem.y)
            && axis(self.grid.z, self.block.z, problem.z)
    }

    /// Rejects geometries the device cannot dispatch.
    pub fn check_limits(&self, kernel: &str, limits: &wgpu::Limits) -> KernelResult<()> {
        let max_groups = limits.max_compute_workgroups_per_dimension;
        for (axis, groups) in [("x", self.grid.x), ("y", self.grid.y), ("z", self.grid.z)] {
            if groups > max_groups {
                return Err(KernelError::launch(
                    kernel,
                    format!("grid.{axis} = {groups} exceeds the device limit of {max_groups} workgroups"),
                ));
            }
        }

        let invocations = self.block.volume();
        if invocations > limits.max_compute_invocations_per_workgroup as u64 {
            return Err(KernelError::launch(
                kernel,
                format!(
                    "block of {invocations} invocations exceeds the device limit of {}",
                    limits.max_compute_invocations_per_workgroup
                ),
            ));
        }
        if self.block.x > limits.max_compute_workgroup_size_x
            || self.block.y > limits.max_compute_workgroup_size_y
            || self.block.z > limits.max_compute_workgroup_size_z
        {
            return Err(KernelError::launch(
                kernel,
                format!("block shape {:?} exceeds the device workgroup size limits", self.block),
            ));
        }
        Ok(())
    }
}

fn to_u32(kernel: &str, value: usize) -> KernelResult<u32> {
    u32::try_from(value).map_err(|_| {
        KernelError::launch(kernel, format!("problem size {value} does not fit in 32 bits"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_rounds_up() {
        let geometry = LaunchGeometry::linear("test", 257, 256).unwrap();
        assert_eq!(geometry.grid(), Dim3::linear(2));
        assert_eq!(geometry.block(), Dim3::linear(256));
        assert_eq!(geometry.total_invocations(), 512);
    }

    #[test]
    fn test_linear_exact_multiple() {
        let geometry = LaunchGeometry::linear("test", 512, 256).unwrap();
        assert_eq!(geometry.grid().x, 2);
    }

    #[test]
    fn test_linear_empty_problem_dispatches_nothing() {
        let geometry = LaunchGeometry::linear("test", 0, 256).unwrap();
        assert_eq!(geometry.grid().x, 0);
    }

    #[test]
    fn test_tiled_axes() {
        let geometry = LaunchGeometry::tiled("test", 17, 33, 16).unwrap();
        assert_eq!(geometry.grid(), Dim3::planar(3, 2));
        assert_eq!(geometry.block(), Dim3::planar(16, 16));
        assert!(geometry.covers(Dim3::planar(33, 17)));
    }

    #[test]
    fn test_large_linear_grid_folds_onto_y() {
        let limits = wgpu::Limits::default();
        let len = (MAX_WORKGROUPS_PER_DIMENSION as usize + 1) * 256;
        let geometry = LaunchGeometry::linear("vector_add", len, 256).unwrap();
        assert_eq!(geometry.grid(), Dim3::planar(MAX_WORKGROUPS_PER_DIMENSION, 2));
        assert!(geometry.covers(Dim3::linear(len as u32)));
        assert!(geometry.check_limits("vector_add", &limits).is_ok());
    }

    #[test]
    fn test_grid_over_limit_is_launch_failure() {
        let limits = wgpu::Limits::default();
        let rows = (limits.max_compute_workgroups_per_dimension as usize + 1) * 16;
        let geometry = LaunchGeometry::tiled("tiled_matmul", rows, 16, 16).unwrap();
        let result = geometry.check_limits("tiled_matmul", &limits);
        assert!(matches!(result, Err(KernelError::LaunchFailure { .. })));
    }

    #[test]
    fn test_default_limits_accept_standard_blocks() {
        let limits = wgpu::Limits::default();
        LaunchGeometry::linear("reduce", 10_000_000, 256)
            .unwrap()
            .check_limits("reduce", &limits)
            .unwrap();
        LaunchGeometry::tiled("tiled_matmul", 512, 512, 16)
            .unwrap()
            .check_limits("tiled_matmul", &limits)
            .unwrap();
    }
}
