//! Sequential CPU implementations used to check device results.

/// `a[i] + b[i]` over the common prefix of both inputs.
pub fn vector_add(a: &[f32], b: &[f32]) -> Vec<f32> {
    a.iter().zip(b).map(|(x, y)| x + y).collect()
}

/// Left-to-right sum, accumulated in f64 and rounded once at the end.
pub fn sum(input: &[f32]) -> f32 {
    input.iter().map(|&x| x as f64).sum::<f64>() as f32
}

/// Sum of absolute values; scales the reduction tolerance.
pub fn sum_abs(input: &[f32]) -> f32 {
    input.iter().map(|&x| x.abs() as f64).sum::<f64>() as f32
}

/// Sum in exactly the order the device reduction uses.
///
/// Each block of `block_size` elements (zero padded) is folded with the
/// halving stride schedule, and the per-block partials are folded again the
/// same way until one value is left. With f32 arithmetic this reproduces the
/// device's rounding step for step.
pub fn tree_reduce_sum(input: &[f32], block_size: usize) -> f32 {
    assert!(
        block_size.is_power_of_two(),
        "block size must be a power of two"
    );
    if input.is_empty() {
        return 0.0;
    }

    let mut level = input.to_vec();
    let mut scratch = vec![0.0f32; block_size];
    loop {
        let partials: Vec<f32> = level
            .chunks(block_size)
            .map(|block| {
                scratch.fill(0.0);
                scratch[..block.len()].copy_from_slice(block);
                let mut stride = block_size / 2;
                while stride > 0 {
                    for lid in 0..stride {
                        scratch[lid] += scratch[lid + stride];
                    }
                    stride /= 2;
                }
                scratch[0]
            })
            .collect();
        if partials.len() == 1 {
            return partials[0];
        }
        level = partials;
    }
}

/// Row-major `C = A * B` for square matrices, triple loop in i, j, k order.
pub fn matmul(a: &[f32], b: &[f32], width: usize) -> Vec<f32> {
    let mut c = vec![0.0f32; width * width];
    for row in 0..width {
        for col in 0..width {
            let mut acc = 0.0f32;
            for k in 0..width {
                acc += a[row * width + k] * b[k * width + col];
            }
            c[row * width + col] = acc;
        }
    }
    c
}

/// Largest absolute difference between two equally long slices.
///
/// A NaN difference anywhere makes the result NaN.
pub fn max_abs_error(expected: &[f32], actual: &[f32]) -> f32 {
    expected
        .iter()
        .zip(actual)
        .map(|(e, a)| (e - a).abs())
        .fold(0.0f32, |max, error| {
            if error.is_nan() || error > max {
                error
            } else {
                max
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_add() {
        assert_eq!(
            vector_add(&[1.0, 2.0, 3.0], &[10.0, 20.0, 30.0]),
            vec![11.0, 22.0, 33.0]
        );
    }

    #[test]
    fn test_sum_and_magnitude() {
        let input = [1.0, -2.0, 3.5];
        assert_eq!(sum(&input), 2.5);
        assert_eq!(sum_abs(&input), 6.5);
        assert_eq!(sum(&[]), 0.0);
    }

    #[test]
    fn test_tree_reduce_padding() {
        // 5 elements in blocks of 4: [1,2,3,4] and [5,0,0,0].
        assert_eq!(tree_reduce_sum(&[1.0, 2.0, 3.0, 4.0, 5.0], 4), 15.0);
    }

    #[test]
    fn test_tree_reduce_empty_and_single() {
        assert_eq!(tree_reduce_sum(&[], 256), 0.0);
        assert_eq!(tree_reduce_sum(&[42.0], 256), 42.0);
    }

    #[test]
    fn test_tree_order_differs_from_sequential_order() {
        // 1e8 swallows 1.0 sequentially but the tree pairs the ones first.
        let input = [1e8f32, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        let sequential: f32 = input.iter().sum();
        let tree = tree_reduce_sum(&input, 8);
        assert_eq!(sequential, 1e8);
        assert_eq!(tree, 1e8 + 8.0);
    }

    #[test]
    fn test_matmul_identity() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let identity = [1.0, 0.0, 0.0, 1.0];
        assert_eq!(matmul(&a, &identity, 2), a.to_vec());
    }

    #[test]
    fn test_matmul_constants() {
        let width = 7;
        let c = matmul(&vec![1.5; width * width], &vec![2.0; width * width], width);
        assert!(c.iter().all(|&v| v == 1.5 * 2.0 * width as f32));
    }

    #[test]
    fn test_max_abs_error() {
        assert_eq!(max_abs_error(&[1.0, 2.0, 3.0], &[1.0, 2.5, 2.0]), 1.0);
        assert_eq!(max_abs_error(&[], &[]), 0.0);
    }

    #[test]
    fn test_max_abs_error_propagates_nan() {
        assert!(max_abs_error(&[1.0, 2.0, 3.0], &[f32::NAN, 2.0, 9.0]).is_nan());
        assert!(max_abs_error(&[1.0, 2.0], &[1.5, f32::NAN]).is_nan());
    }
}
