//! WGSL sources for the kernel set.
//!
//! Each kernel is compiled as its own shader module: a generated header with
//! the block/tile constants, the shared parameter block, then the kernel body.

use super::{BLOCK_SIZE, Kernel, TILE_SIZE};

const COMMON: &str = include_str!("common.wgsl");
const VECTOR_ADD: &str = include_str!("vector_add.wgsl");
const REDUCE: &str = include_str!("reduce.wgsl");
const TILED_MATMUL: &str = include_str!("tiled_matmul.wgsl");

/// Get the complete WGSL source for one kernel.
pub fn kernel_wgsl(kernel: Kernel) -> String {
    let body = match kernel {
        Kernel::VectorAdd => VECTOR_ADD,
        Kernel::Reduce => REDUCE,
        Kernel::TiledMatMul => TILED_MATMUL,
    };

    format!(
        r#"// {name} kernel
// Generated with BLOCK_SIZE = {block_size}, TILE_SIZE = {tile_size}

const BLOCK_SIZE: u32 = {block_size}u;
const TILE_SIZE: u32 = {tile_size}u;

{common}

{body}
"#,
        name = kernel.name(),
        block_size = BLOCK_SIZE,
        tile_size = TILE_SIZE,
        common = COMMON,
        body = body,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::naga;

    /// Parse and validate a shader the way the device would, without a device.
    fn validate_wgsl(source: &str) -> Result<naga::valid::ModuleInfo, String> {
        let module = naga::front::wgsl::parse_str(source)
            .map_err(|e| format!("WGSL parse error: {}", e.emit_to_string(source)))?;
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::empty(),
        )
        .validate(&module)
        .map_err(|e| format!("WGSL validation error: {e:?}"))
    }

    #[test]
    fn test_all_kernels_validate() {
        for kernel in Kernel::ALL {
            let source = kernel_wgsl(kernel);
            validate_wgsl(&source).unwrap_or_else(|e| {
                panic!("{} shader is invalid:\n{}\n\nShader:\n{}", kernel.name(), e, source)
            });
        }
    }

    #[test]
    fn test_entry_points_present() {
        for kernel in Kernel::ALL {
            let source = kernel_wgsl(kernel);
            assert!(
                source.contains(&format!("fn {}(", kernel.entry_point())),
                "{} is missing its entry point",
                kernel.name()
            );
        }
    }

    #[test]
    fn test_constant_substitution() {
        let source = kernel_wgsl(Kernel::Reduce);
        assert!(source.contains(&format!("const BLOCK_SIZE: u32 = {}u;", BLOCK_SIZE)));
        assert!(source.contains(&format!("const TILE_SIZE: u32 = {}u;", TILE_SIZE)));
    }

    #[test]
    fn test_barriers_per_kernel() {
        let barriers = |kernel| kernel_wgsl(kernel).matches("workgroupBarrier()").count();
        assert_eq!(barriers(Kernel::VectorAdd), 0);
        assert_eq!(barriers(Kernel::Reduce), 2);
        assert_eq!(barriers(Kernel::TiledMatMul), 2);
    }
}
