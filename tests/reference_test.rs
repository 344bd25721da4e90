//! Tests for the sequential CPU reference.

use tiled_kernels::kernels::{BLOCK_SIZE, Kernel};
use tiled_kernels::reference;

fn generate_data(len: usize, seed: u64) -> Vec<f32> {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            ((state >> 40) as f32) / (1u64 << 24) as f32 * 2.0 - 1.0
        })
        .collect()
}

#[cfg(test)]
mod reduction_tests {
    use super::*;

    #[test]
    fn test_tree_sum_of_ones_is_exact() {
        for n in [1usize, 255, 256, 257, 65_536, 65_537, 1_000_000] {
            let ones = vec![1.0f32; n];
            assert_eq!(
                reference::tree_reduce_sum(&ones, BLOCK_SIZE as usize),
                n as f32
            );
            assert_eq!(reference::sum(&ones), n as f32);
        }
    }

    #[test]
    fn test_tree_sum_within_reduction_tolerance() {
        for n in [1_000usize, 100_000, 1_000_000] {
            let input = generate_data(n, n as u64);
            let tolerance = Kernel::Reduce.tolerance(n, reference::sum_abs(&input));
            let tree = reference::tree_reduce_sum(&input, BLOCK_SIZE as usize);
            let sequential = reference::sum(&input);
            assert!(
                (tree - sequential).abs() <= tolerance,
                "n = {}: tree={}, sequential={}, tolerance={}",
                n,
                tree,
                sequential,
                tolerance
            );
        }
    }

    #[test]
    fn test_tree_sum_ignores_block_padding() {
        let input = generate_data(1_000, 8);
        let padded_blocks = reference::tree_reduce_sum(&input, 256);
        let single_block = reference::tree_reduce_sum(&input, 1024);
        let tolerance = Kernel::Reduce.tolerance(input.len(), reference::sum_abs(&input));
        assert!((padded_blocks - single_block).abs() <= tolerance);
    }
}

#[cfg(test)]
mod matmul_tests {
    use super::*;

    #[test]
    fn test_matmul_known_product() {
        // [1 2] [5 6]   [19 22]
        // [3 4] [7 8] = [43 50]
        let c = reference::matmul(&[1.0, 2.0, 3.0, 4.0], &[5.0, 6.0, 7.0, 8.0], 2);
        assert_eq!(c, vec![19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn test_matmul_512_constants() {
        let width = 512;
        let c = reference::matmul(&vec![1.0; width * width], &vec![2.0; width * width], width);
        assert!(c.iter().all(|&v| v == 1024.0));
    }

    #[test]
    fn test_matmul_empty() {
        assert!(reference::matmul(&[], &[], 0).is_empty());
    }
}

#[cfg(test)]
mod vector_add_tests {
    use super::*;

    #[test]
    fn test_vector_add_matches_elementwise_sum() {
        let a = generate_data(1_000, 1);
        let b = generate_data(1_000, 2);
        let c = reference::vector_add(&a, &b);
        for i in 0..a.len() {
            assert_eq!(c[i], a[i] + b[i]);
        }
        assert_eq!(reference::max_abs_error(&c, &c), 0.0);
    }
}
