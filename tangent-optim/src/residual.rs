//! Type-generic cell residual of the nonlinear boundary value problem
//!
//! ```text
//! −∇·(κ(u, z)∇u) + b(u, z)·∇u + r(u, z) = 0
//! ```
//!
//! in weak form. The same code runs at `F` for values, at `DualVec<F, N>` for
//! element Jacobians and at `DualVec<Dual<F>, N>` for adjoint Hessians; which
//! derivatives come out depends only on how the caller seeds the inputs.

use std::sync::Arc;

use tangent::{Float, Scalar};

use crate::coefficient::{Coefficient, CoefficientParams};
use crate::discretization::Discretization;

/// Residual evaluator over a discretization `D` and constitutive model `C`.
pub struct Residual<F, D, C, const N: usize> {
    disc: Arc<D>,
    coeff: C,
    params: CoefficientParams<F>,
}

impl<F, D, C, const N: usize> Residual<F, D, C, N>
where
    F: Float,
    D: Discretization<F, N>,
    C: Coefficient<F>,
{
    pub fn new(disc: Arc<D>, coeff: C, params: CoefficientParams<F>) -> Self {
        Residual {
            disc,
            coeff,
            params,
        }
    }

    pub fn discretization(&self) -> &Arc<D> {
        &self.disc
    }

    pub fn params(&self) -> &CoefficientParams<F> {
        &self.params
    }

    /// Residual of every cell. `u` and `z` hold one array of nodal values
    /// per cell.
    pub fn evaluate<T: Scalar<Float = F>>(&self, u: &[[T; N]], z: &[[T; N]]) -> Vec<[T; N]> {
        let n_cells = self.disc.num_cells();
        assert_eq!(u.len(), n_cells, "state has {} cells, expected {}", u.len(), n_cells);
        assert_eq!(z.len(), n_cells, "control has {} cells, expected {}", z.len(), n_cells);

        let mut adv = vec![T::zero(); self.disc.space_dim()];
        let mut grad = vec![T::zero(); self.disc.space_dim()];
        u.iter()
            .zip(z.iter())
            .enumerate()
            .map(|(cell, (uc, zc))| self.evaluate_cell(cell, uc, zc, &mut adv, &mut grad))
            .collect()
    }

    /// `c[f] = Σ_q κ ∇u_q·∇̃φ_f(q) + Σ_q (b·∇u_q + r) φ̃_f(q)` for one cell.
    ///
    /// `adv` and `grad` are scratch buffers of length `space_dim`.
    fn evaluate_cell<T: Scalar<Float = F>>(
        &self,
        cell: usize,
        u: &[T; N],
        z: &[T; N],
        adv: &mut [T],
        grad: &mut [T],
    ) -> [T; N] {
        let disc = &*self.disc;
        let dim = disc.space_dim();
        let mut c = [T::zero(); N];

        for q in 0..disc.num_cub_pts() {
            let mut u_q = T::zero();
            let mut z_q = T::zero();
            for f in 0..N {
                let phi = T::from_f(disc.tran_val(cell, f, q));
                u_q += u[f] * phi;
                z_q += z[f] * phi;
            }
            for (d, g) in grad.iter_mut().enumerate() {
                *g = T::zero();
                for f in 0..N {
                    *g += u[f] * T::from_f(disc.tran_grad(cell, f, q, d));
                }
            }

            let x = disc.phys_cub_pt(cell, q);
            let kappa = self.coeff.diffusion(x, u_q, z_q, &self.params.diffusion);
            self.coeff
                .advection(x, u_q, z_q, &self.params.advection, adv);
            let react = self.coeff.reaction(x, u_q, z_q, &self.params.reaction);

            let mut adv_term = T::zero();
            for d in 0..dim {
                adv_term += adv[d] * grad[d];
            }
            let source = adv_term + react;

            for (f, cf) in c.iter_mut().enumerate() {
                for d in 0..dim {
                    *cf += kappa * grad[d] * T::from_f(disc.wtd_tran_grad(cell, f, q, d));
                }
                *cf += source * T::from_f(disc.wtd_tran_val(cell, f, q));
            }
        }
        c
    }

    /// Per-cell nodal arrays from a flat dof vector.
    ///
    /// `seed(cell, field, value)` builds the numeric value placed at each
    /// node, which is where callers attach dual-number tangents.
    pub fn gather<T, S>(&self, v: &[F], mut seed: S) -> Vec<[T; N]>
    where
        T: Scalar<Float = F>,
        S: FnMut(usize, usize, F) -> T,
    {
        let disc = &*self.disc;
        assert_eq!(
            v.len(),
            disc.num_dofs(),
            "vector has length {}, expected {}",
            v.len(),
            disc.num_dofs()
        );
        (0..disc.num_cells())
            .map(|cell| {
                let mut nodal = [T::zero(); N];
                for (f, slot) in nodal.iter_mut().enumerate() {
                    *slot = seed(cell, f, v[disc.dof(cell, f)]);
                }
                nodal
            })
            .collect()
    }

    /// Sum per-cell contributions into `out`, which is zeroed first.
    pub fn scatter(&self, cells: &[[F; N]], out: &mut [F]) {
        let disc = &*self.disc;
        out.fill(F::zero());
        for (cell, vals) in cells.iter().enumerate() {
            for (f, &val) in vals.iter().enumerate() {
                out[disc.dof(cell, f)] += val;
            }
        }
    }

    /// Residual at plain values, as a flat dof vector.
    pub fn value(&self, u: &[F], z: &[F], out: &mut [F]) {
        let uc = self.gather(u, |_, _, x| x);
        let zc = self.gather(z, |_, _, x| x);
        let cells = self.evaluate(&uc, &zc);
        self.scatter(&cells, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coefficient::ExampleCoefficient;
    use crate::discretization::IntervalMesh;
    use approx::assert_relative_eq;
    use tangent::DualVec;

    fn residual(cells: usize) -> Residual<f64, IntervalMesh<f64, 2>, ExampleCoefficient, 2> {
        let mesh = Arc::new(IntervalMesh::new(cells, 3, (0.0, 1.0)).unwrap());
        Residual::new(mesh, ExampleCoefficient, CoefficientParams::default())
    }

    #[test]
    fn zero_input_gives_zero_residual() {
        let r = residual(4);
        let zero = vec![0.0; 5];
        let mut out = vec![1.0; 5];
        r.value(&zero, &zero, &mut out);
        assert!(out.iter().all(|&c| c == 0.0));
    }

    #[test]
    fn constant_state_reduces_to_reaction() {
        // u ≡ 1, z ≡ 0: gradient terms vanish, r = 2, so c = 2·∫φ_f
        let r = residual(2);
        let u = vec![1.0; 3];
        let z = vec![0.0; 3];
        let mut out = vec![0.0; 3];
        r.value(&u, &z, &mut out);
        assert_relative_eq!(out[0], 0.5, epsilon = 1e-13);
        assert_relative_eq!(out[1], 1.0, epsilon = 1e-13);
        assert_relative_eq!(out[2], 0.5, epsilon = 1e-13);
    }

    #[test]
    fn gather_shares_endpoint_dofs() {
        let r = residual(3);
        let v = [0.0, 1.0, 2.0, 3.0];
        let cells: Vec<[f64; 2]> = r.gather(&v, |_, _, x| x);
        assert_eq!(cells, vec![[0.0, 1.0], [1.0, 2.0], [2.0, 3.0]]);
    }

    #[test]
    fn tagged_evaluation_matches_plain_value() {
        let r = residual(3);
        let u = [0.1, -0.2, 0.4, 0.3];
        let z = [0.5, 0.0, -0.5, 1.0];
        let uc: Vec<[DualVec<f64, 2>; 2]> = r.gather(&u, |_, f, x| DualVec::with_tangent(x, f));
        let zc = r.gather(&z, |_, _, x| DualVec::constant(x));
        let dual = r.evaluate(&uc, &zc);

        let plain = r.evaluate(&r.gather(&u, |_, _, x| x), &r.gather(&z, |_, _, x| x));
        for (d, p) in dual.iter().zip(plain.iter()) {
            for f in 0..2 {
                assert_relative_eq!(d[f].re, p[f], epsilon = 1e-15);
            }
        }
    }

    #[test]
    #[should_panic(expected = "expected 4")]
    fn gather_rejects_wrong_length() {
        let r = residual(3);
        let _: Vec<[f64; 2]> = r.gather(&[0.0; 3], |_, _, x| x);
    }
}
