//! Benchmark inputs for each kernel.

use crate::kernels::{Kernel, ReduceCombine};
use crate::reference;

/// Inputs for one kernel run.
#[derive(Debug, Clone)]
pub enum Workload {
    VectorAdd {
        a: Vec<f32>,
        b: Vec<f32>,
    },
    Reduce {
        input: Vec<f32>,
        combine: ReduceCombine,
    },
    TiledMatMul {
        a: Vec<f32>,
        b: Vec<f32>,
        width: usize,
    },
}

impl Workload {
    pub fn vector_add(a: Vec<f32>, b: Vec<f32>) -> Self {
        Workload::VectorAdd { a, b }
    }

    pub fn reduce(input: Vec<f32>, combine: ReduceCombine) -> Self {
        Workload::Reduce { input, combine }
    }

    pub fn tiled_matmul(a: Vec<f32>, b: Vec<f32>, width: usize) -> Self {
        Workload::TiledMatMul { a, b, width }
    }

    /// Reproducible pseudo-random inputs in [-1, 1).
    pub fn random(kernel: Kernel, problem_size: usize, seed: u64, combine: ReduceCombine) -> Self {
        let mut rng = Lcg::new(seed);
        match kernel {
            Kernel::VectorAdd => {
                Self::vector_add(rng.fill(problem_size), rng.fill(problem_size))
            }
            Kernel::Reduce => Self::reduce(rng.fill(problem_size), combine),
            Kernel::TiledMatMul => {
                let elements = problem_size * problem_size;
                Self::tiled_matmul(rng.fill(elements), rng.fill(elements), problem_size)
            }
        }
    }

    /// Constant inputs: `lhs` everywhere in the first operand and `rhs` in the
    /// second. The reduction only uses `lhs`.
    pub fn constant(
        kernel: Kernel,
        problem_size: usize,
        lhs: f32,
        rhs: f32,
        combine: ReduceCombine,
    ) -> Self {
        match kernel {
            Kernel::VectorAdd => {
                Self::vector_add(vec![lhs; problem_size], vec![rhs; problem_size])
            }
            Kernel::Reduce => Self::reduce(vec![lhs; problem_size], combine),
            Kernel::TiledMatMul => {
                let elements = problem_size * problem_size;
                Self::tiled_matmul(vec![lhs; elements], vec![rhs; elements], problem_size)
            }
        }
    }

    pub fn kernel(&self) -> Kernel {
        match self {
            Workload::VectorAdd { .. } => Kernel::VectorAdd,
            Workload::Reduce { .. } => Kernel::Reduce,
            Workload::TiledMatMul { .. } => Kernel::TiledMatMul,
        }
    }

    /// Element count, or matrix width for the matrix multiply.
    pub fn problem_size(&self) -> usize {
        match self {
            Workload::VectorAdd { a, .. } => a.len(),
            Workload::Reduce { input, .. } => input.len(),
            Workload::TiledMatMul { width, .. } => *width,
        }
    }

    /// Absolute error allowed for this workload's result.
    pub fn tolerance(&self) -> f32 {
        let magnitude = match self {
            Workload::Reduce { input, .. } => reference::sum_abs(input),
            _ => 0.0,
        };
        self.kernel().tolerance(self.problem_size(), magnitude)
    }
}

/// Linear congruential generator (MMIX constants).
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Lcg(seed)
    }

    fn next_f32(&mut self) -> f32 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        // Top 24 bits map exactly onto the f32 mantissa.
        ((self.0 >> 40) as f32) / (1u64 << 24) as f32 * 2.0 - 1.0
    }

    fn fill(&mut self, len: usize) -> Vec<f32> {
        (0..len).map(|_| self.next_f32()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_is_reproducible() {
        let first = Workload::random(Kernel::Reduce, 1000, 7, ReduceCombine::Device);
        let second = Workload::random(Kernel::Reduce, 1000, 7, ReduceCombine::Device);
        match (first, second) {
            (Workload::Reduce { input: a, .. }, Workload::Reduce { input: b, .. }) => {
                assert_eq!(a, b);
                assert!(a.iter().all(|v| (-1.0..1.0).contains(v)));
            }
            _ => panic!("expected reduce workloads"),
        }
    }

    #[test]
    fn test_matmul_problem_size_is_width() {
        let workload = Workload::constant(Kernel::TiledMatMul, 17, 1.0, 2.0, ReduceCombine::Host);
        assert_eq!(workload.kernel(), Kernel::TiledMatMul);
        assert_eq!(workload.problem_size(), 17);
        match workload {
            Workload::TiledMatMul { a, b, .. } => {
                assert_eq!(a.len(), 17 * 17);
                assert_eq!(b.len(), 17 * 17);
            }
            _ => panic!("expected a matmul workload"),
        }
    }

    #[test]
    fn test_tolerance_follows_kernel() {
        let add = Workload::constant(Kernel::VectorAdd, 10, 1.0, 1.0, ReduceCombine::Device);
        assert_eq!(add.tolerance(), 0.0);

        let reduce = Workload::constant(Kernel::Reduce, 4, 0.5, 0.0, ReduceCombine::Device);
        assert_eq!(reduce.tolerance(), crate::kernels::REDUCE_MIN_TOLERANCE);
    }
}
