//! Dense linear algebra for the element-local Jacobian blocks.
//!
//! Matrices are `Vec<Vec<F>>` stored as `a[row][col]`.

use tangent::Float;

use crate::error::{OptimError, Result};

/// Equilibrated LU factorization with partial pivoting.
///
/// Factors `R·A·C = P⁻¹·L·U` where `R`, `C` are diagonal row and column
/// scalings chosen so that every row and column of the scaled matrix has
/// largest entry one. L is stored below the diagonal (unit diagonal
/// implicit), U on and above it.
pub struct EquilibratedLu<F> {
    lu: Vec<Vec<F>>,
    /// `perm[i]` is the original row index for factored row `i`.
    perm: Vec<usize>,
    row_scale: Vec<F>,
    col_scale: Vec<F>,
    n: usize,
}

impl<F: Float> EquilibratedLu<F> {
    /// Factorize an `n x n` matrix. The input is copied, never overwritten.
    ///
    /// Fails with [`OptimError::SingularMatrix`] on a zero row or column, or
    /// when the largest available pivot of the scaled matrix is below
    /// `pivot_tol`.
    // Explicit indexing is clearer for pivoted LU: row/col indices drive pivot search and elimination
    #[allow(clippy::needless_range_loop)]
    pub fn factor(a: &[Vec<F>], pivot_tol: F) -> Result<Self> {
        let n = a.len();
        debug_assert!(a.iter().all(|row| row.len() == n));

        let mut row_scale = vec![F::zero(); n];
        for i in 0..n {
            let big = a[i].iter().fold(F::zero(), |m, &v| m.max(v.abs()));
            if big == F::zero() {
                return Err(OptimError::SingularMatrix { column: i });
            }
            row_scale[i] = big.recip();
        }

        let mut col_scale = vec![F::zero(); n];
        for j in 0..n {
            let mut big = F::zero();
            for i in 0..n {
                big = big.max((a[i][j] * row_scale[i]).abs());
            }
            if big == F::zero() {
                return Err(OptimError::SingularMatrix { column: j });
            }
            col_scale[j] = big.recip();
        }

        let mut lu: Vec<Vec<F>> = (0..n)
            .map(|i| (0..n).map(|j| row_scale[i] * a[i][j] * col_scale[j]).collect())
            .collect();
        let mut perm: Vec<usize> = (0..n).collect();

        for col in 0..n {
            // Find pivot
            let mut max_val = lu[col][col].abs();
            let mut max_row = col;
            for row in (col + 1)..n {
                let v = lu[row][col].abs();
                if v > max_val {
                    max_val = v;
                    max_row = row;
                }
            }

            if max_val < pivot_tol {
                return Err(OptimError::SingularMatrix { column: col });
            }

            if max_row != col {
                lu.swap(col, max_row);
                perm.swap(col, max_row);
            }

            let pivot = lu[col][col];

            for row in (col + 1)..n {
                let factor = lu[row][col] / pivot;
                lu[row][col] = factor;
                for j in (col + 1)..n {
                    let val = lu[col][j];
                    lu[row][j] -= factor * val;
                }
            }
        }

        Ok(EquilibratedLu {
            lu,
            perm,
            row_scale,
            col_scale,
            n,
        })
    }

    /// Dimension of the factored matrix.
    pub fn dim(&self) -> usize {
        self.n
    }

    /// Solve `A·x = b`.
    // Explicit indexing is clearer for forward/back substitution with permuted indices
    #[allow(clippy::needless_range_loop)]
    pub fn solve(&self, b: &[F]) -> Result<Vec<F>> {
        let n = self.n;
        assert_eq!(b.len(), n, "rhs length ({}) must equal matrix size ({})", b.len(), n);

        // Scale and permute: y = P·R·b
        let mut y = vec![F::zero(); n];
        for i in 0..n {
            let src = self.perm[i];
            y[i] = self.row_scale[src] * b[src];
        }

        // Forward substitution, L has unit diagonal
        for i in 1..n {
            for j in 0..i {
                let l_ij = self.lu[i][j];
                let y_j = y[j];
                y[i] -= l_ij * y_j;
            }
        }

        // Back substitution with U
        let mut x = vec![F::zero(); n];
        for i in (0..n).rev() {
            let mut sum = y[i];
            for j in (i + 1)..n {
                sum -= self.lu[i][j] * x[j];
            }
            x[i] = sum / self.lu[i][i];
        }

        for j in 0..n {
            x[j] *= self.col_scale[j];
        }
        finite(x)
    }

    /// Solve `Aᵀ·x = b` with the same factors.
    ///
    /// `Aᵀ = C⁻¹·Uᵀ·Lᵀ·P·R⁻¹`, so the substitutions run in reverse order on
    /// the transposed factors.
    #[allow(clippy::needless_range_loop)]
    pub fn solve_transpose(&self, b: &[F]) -> Result<Vec<F>> {
        let n = self.n;
        assert_eq!(b.len(), n, "rhs length ({}) must equal matrix size ({})", b.len(), n);

        // Uᵀ·y = C·b (forward substitution)
        let mut y = vec![F::zero(); n];
        for i in 0..n {
            let mut sum = self.col_scale[i] * b[i];
            for j in 0..i {
                sum -= self.lu[j][i] * y[j];
            }
            y[i] = sum / self.lu[i][i];
        }

        // Lᵀ·w = y (back substitution, unit diagonal)
        for i in (0..n).rev() {
            for j in (i + 1)..n {
                let l_ji = self.lu[j][i];
                let w_j = y[j];
                y[i] -= l_ji * w_j;
            }
        }

        // Undo the permutation and the row scaling
        let mut x = vec![F::zero(); n];
        for i in 0..n {
            let dst = self.perm[i];
            x[dst] = self.row_scale[dst] * y[i];
        }
        finite(x)
    }
}

fn finite<F: Float>(x: Vec<F>) -> Result<Vec<F>> {
    if x.iter().all(|v| v.is_finite()) {
        Ok(x)
    } else {
        Err(OptimError::NonFinite)
    }
}

/// `y = A·x`.
pub fn mat_vec<F: Float>(a: &[Vec<F>], x: &[F], y: &mut [F]) {
    debug_assert_eq!(a.len(), y.len());
    for (yi, row) in y.iter_mut().zip(a.iter()) {
        let mut s = F::zero();
        for (&aij, &xj) in row.iter().zip(x.iter()) {
            s += aij * xj;
        }
        *yi = s;
    }
}

/// `y = Aᵀ·x`.
pub fn mat_vec_transpose<F: Float>(a: &[Vec<F>], x: &[F], y: &mut [F]) {
    debug_assert_eq!(a.len(), x.len());
    y.fill(F::zero());
    for (row, &xi) in a.iter().zip(x.iter()) {
        for (yj, &aij) in y.iter_mut().zip(row.iter()) {
            *yj += aij * xi;
        }
    }
}
