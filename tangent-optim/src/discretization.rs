//! Finite-element data consumed by the residual and the mass operator.
//!
//! A [`Discretization`] is pure data: per-cell cubature points, transformed
//! basis values and gradients (plain and quadrature-weighted), the per-cell
//! mass matrix and the dof map. It never sees dual numbers.

use tangent::Float;

use crate::error::{OptimError, Result};

/// Per-cell quadrature data for `N` basis functions (fields) per cell.
///
/// Cells share their endpoint dofs, so `num_dofs = num_cells·(N − 1) + 1` and
/// field `f` of cell `c` sits at dof `c·(N − 1) + f`.
pub trait Discretization<F: Float, const N: usize> {
    fn num_cells(&self) -> usize;

    fn num_cub_pts(&self) -> usize;

    fn num_fields(&self) -> usize {
        N
    }

    fn space_dim(&self) -> usize;

    fn num_dofs(&self) -> usize {
        self.num_cells() * (N - 1) + 1
    }

    /// Global dof index of `field` in `cell`.
    #[inline]
    fn dof(&self, cell: usize, field: usize) -> usize {
        cell * (N - 1) + field
    }

    /// Physical coordinates of cubature point `q` in `cell` (`space_dim` entries).
    fn phys_cub_pt(&self, cell: usize, q: usize) -> &[F];

    /// Basis function `field` evaluated at cubature point `q`.
    fn tran_val(&self, cell: usize, field: usize, q: usize) -> F;

    /// Physical gradient component `d` of basis function `field` at `q`.
    fn tran_grad(&self, cell: usize, field: usize, q: usize, d: usize) -> F;

    /// [`tran_val`](Discretization::tran_val) times the cubature weight and
    /// the cell measure.
    fn wtd_tran_val(&self, cell: usize, field: usize, q: usize) -> F;

    /// [`tran_grad`](Discretization::tran_grad) times the cubature weight and
    /// the cell measure.
    fn wtd_tran_grad(&self, cell: usize, field: usize, q: usize, d: usize) -> F;

    /// Entry `(row, col)` of the mass matrix of `cell`.
    fn mass(&self, cell: usize, row: usize, col: usize) -> F;
}

/// Gauss-Legendre points and weights on `[-1, 1]`.
fn gauss_legendre(n: usize) -> Option<(Vec<f64>, Vec<f64>)> {
    let rule = match n {
        1 => (vec![0.0], vec![2.0]),
        2 => {
            let p = 1.0 / 3.0_f64.sqrt();
            (vec![-p, p], vec![1.0, 1.0])
        }
        3 => {
            let p = (3.0_f64 / 5.0).sqrt();
            (vec![-p, 0.0, p], vec![5.0 / 9.0, 8.0 / 9.0, 5.0 / 9.0])
        }
        4 => (
            vec![
                -0.861_136_311_594_052_6,
                -0.339_981_043_584_856_3,
                0.339_981_043_584_856_3,
                0.861_136_311_594_052_6,
            ],
            vec![
                0.347_854_845_137_453_8,
                0.652_145_154_862_546_1,
                0.652_145_154_862_546_1,
                0.347_854_845_137_453_8,
            ],
        ),
        5 => (
            vec![
                -0.906_179_845_938_664_0,
                -0.538_469_310_105_683_1,
                0.0,
                0.538_469_310_105_683_1,
                0.906_179_845_938_664_0,
            ],
            vec![
                0.236_926_885_056_189_1,
                0.478_628_670_499_366_5,
                0.568_888_888_888_888_9,
                0.478_628_670_499_366_5,
                0.236_926_885_056_189_1,
            ],
        ),
        _ => return None,
    };
    Some(rule)
}

/// Lagrange basis on equispaced nodes: value and derivative of `φ_k` at `xi`.
fn lagrange(nodes: &[f64], k: usize, xi: f64) -> (f64, f64) {
    let mut val = 1.0;
    let mut der = 0.0;
    for (m, &xm) in nodes.iter().enumerate() {
        if m == k {
            continue;
        }
        let denom = nodes[k] - xm;
        // product rule: d(val·(xi − xm)/denom) = der·(xi − xm)/denom + val/denom
        der = der * (xi - xm) / denom + val / denom;
        val *= (xi - xm) / denom;
    }
    (val, der)
}

/// Uniform 1-D mesh of `[a, b]` with continuous Lagrange elements of degree
/// `N − 1` and a Gauss-Legendre rule per cell.
#[derive(Debug, Clone)]
pub struct IntervalMesh<F, const N: usize> {
    num_cells: usize,
    num_cub_pts: usize,
    /// `x_cub[cell·Q + q]`.
    x_cub: Vec<F>,
    /// Reference-cell tables indexed `[field·Q + q]`; all cells are congruent.
    val: Vec<F>,
    grad: Vec<F>,
    wtd_val: Vec<F>,
    wtd_grad: Vec<F>,
    mass: [[F; N]; N],
}

impl<F: Float, const N: usize> IntervalMesh<F, N> {
    /// Mesh `domain = (a, b)` with `num_cells` cells and `num_cub_pts`
    /// Gauss points per cell (1 to 5).
    pub fn new(num_cells: usize, num_cub_pts: usize, domain: (F, F)) -> Result<Self> {
        if N < 2 {
            return Err(OptimError::invalid_params(format!(
                "need at least 2 fields per cell, got {N}"
            )));
        }
        if num_cells == 0 {
            return Err(OptimError::invalid_params("mesh needs at least one cell"));
        }
        let (a, b) = domain;
        if !(b > a) {
            return Err(OptimError::invalid_params(format!(
                "empty domain [{a}, {b}]"
            )));
        }
        let (pts, wts) = gauss_legendre(num_cub_pts).ok_or_else(|| {
            OptimError::invalid_params(format!(
                "unsupported cubature size {num_cub_pts} (1 to 5 points)"
            ))
        })?;

        let (Some(a64), Some(b64)) = (a.to_f64(), b.to_f64()) else {
            return Err(OptimError::invalid_params("domain bounds not representable"));
        };
        let h = (b64 - a64) / num_cells as f64;
        let jac = 0.5 * h;

        let nodes: Vec<f64> = (0..N)
            .map(|k| -1.0 + 2.0 * k as f64 / (N - 1) as f64)
            .collect();

        let q_len = pts.len();
        let mut val = vec![F::zero(); N * q_len];
        let mut grad = vec![F::zero(); N * q_len];
        let mut wtd_val = vec![F::zero(); N * q_len];
        let mut wtd_grad = vec![F::zero(); N * q_len];
        for f in 0..N {
            for (q, (&xi, &w)) in pts.iter().zip(wts.iter()).enumerate() {
                let (phi, dphi) = lagrange(&nodes, f, xi);
                let g = dphi / jac;
                val[f * q_len + q] = F::lit(phi);
                grad[f * q_len + q] = F::lit(g);
                wtd_val[f * q_len + q] = F::lit(w * jac * phi);
                wtd_grad[f * q_len + q] = F::lit(w * jac * g);
            }
        }

        let mut mass = [[F::zero(); N]; N];
        for (r, row) in mass.iter_mut().enumerate() {
            for (c, m) in row.iter_mut().enumerate() {
                for q in 0..q_len {
                    *m += wtd_val[r * q_len + q] * val[c * q_len + q];
                }
            }
        }

        let mut x_cub = Vec::with_capacity(num_cells * q_len);
        for cell in 0..num_cells {
            let mid = a64 + (cell as f64 + 0.5) * h;
            for &xi in &pts {
                x_cub.push(F::lit(mid + jac * xi));
            }
        }

        Ok(IntervalMesh {
            num_cells,
            num_cub_pts: q_len,
            x_cub,
            val,
            grad,
            wtd_val,
            wtd_grad,
            mass,
        })
    }

    #[inline]
    fn idx(&self, field: usize, q: usize) -> usize {
        field * self.num_cub_pts + q
    }
}

impl<F: Float, const N: usize> Discretization<F, N> for IntervalMesh<F, N> {
    fn num_cells(&self) -> usize {
        self.num_cells
    }

    fn num_cub_pts(&self) -> usize {
        self.num_cub_pts
    }

    fn space_dim(&self) -> usize {
        1
    }

    fn phys_cub_pt(&self, cell: usize, q: usize) -> &[F] {
        std::slice::from_ref(&self.x_cub[cell * self.num_cub_pts + q])
    }

    fn tran_val(&self, _cell: usize, field: usize, q: usize) -> F {
        self.val[self.idx(field, q)]
    }

    fn tran_grad(&self, _cell: usize, field: usize, q: usize, _d: usize) -> F {
        self.grad[self.idx(field, q)]
    }

    fn wtd_tran_val(&self, _cell: usize, field: usize, q: usize) -> F {
        self.wtd_val[self.idx(field, q)]
    }

    fn wtd_tran_grad(&self, _cell: usize, field: usize, q: usize, _d: usize) -> F {
        self.wtd_grad[self.idx(field, q)]
    }

    fn mass(&self, _cell: usize, row: usize, col: usize) -> F {
        self.mass[row][col]
    }
}
