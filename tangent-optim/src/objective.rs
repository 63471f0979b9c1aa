//! Objective interfaces and the quadratic tracking objective.

use std::sync::Arc;

use tangent::Float;

use crate::discretization::Discretization;
use crate::error::{OptimError, Result};
use crate::vector::{check_dim, FlatVector, Vector};

/// Objective `f(u, z)` of a state `u` and a control `z`, with block
/// derivatives.
///
/// Outputs are written into `&mut V` arguments, which implementations zero
/// before accumulating. `hess_vec_12` takes a control-space direction and
/// returns a state-space vector (`f_uz·v`); `hess_vec_21` the reverse.
pub trait ObjectiveSimOpt<F: Float, V: Vector<F>> {
    /// Notify the objective that the iterate moved.
    fn update(&mut self, _u: &V, _z: &V, _accepted: bool, _iter: usize) {}

    fn value(&self, u: &V, z: &V) -> F;

    /// `∇_u f`.
    fn gradient_1(&self, g: &mut V, u: &V, z: &V);

    /// `∇_z f`.
    fn gradient_2(&self, g: &mut V, u: &V, z: &V);

    /// `f_uu·v`.
    fn hess_vec_11(&self, hv: &mut V, v: &V, u: &V, z: &V);

    /// `f_uz·v`.
    fn hess_vec_12(&self, hv: &mut V, v: &V, u: &V, z: &V);

    /// `f_zu·v`.
    fn hess_vec_21(&self, hv: &mut V, v: &V, u: &V, z: &V);

    /// `f_zz·v`.
    fn hess_vec_22(&self, hv: &mut V, v: &V, u: &V, z: &V);
}

/// Objective of a single variable, as consumed by optimization steps.
///
/// Methods take `&mut self` to allow caching (a reduced objective keeps the
/// state and adjoint of its last evaluation) and are fallible because
/// evaluating may require solving the state equation.
pub trait Objective<F: Float, V: Vector<F>> {
    /// Notify the objective that `x` is the new iterate.
    fn update(&mut self, _x: &V, _accepted: bool, _iter: usize) -> Result<()> {
        Ok(())
    }

    fn value(&mut self, x: &V) -> Result<F>;

    fn gradient(&mut self, g: &mut V, x: &V) -> Result<()>;

    /// Hessian-vector product `∇²f(x)·v`.
    ///
    /// Default: one-sided finite difference of the gradient with step
    /// `√ε·max(1, ‖x‖)/‖v‖`.
    fn hess_vec(&mut self, hv: &mut V, v: &V, x: &V) -> Result<()> {
        let vnorm = v.norm();
        if vnorm == F::zero() {
            hv.zero();
            return Ok(());
        }
        let h = F::epsilon().sqrt() * x.norm().max(F::one()) / vnorm;

        let mut g0 = x.clone();
        self.gradient(&mut g0, x)?;

        let mut xh = x.clone();
        xh.axpy(h, v);
        self.gradient(hv, &xh)?;
        hv.axpy(-F::one(), &g0);
        hv.scale(h.recip());
        Ok(())
    }
}

/// `f(u, z) = ½(u − û)ᵀM(u − û) + ½γ zᵀMz`
///
/// with `M` the assembled mass matrix of `D`, applied cell by cell without
/// being formed.
pub struct TrackingObjective<F, V, D, const N: usize> {
    disc: Arc<D>,
    target: V,
    gamma: F,
}

impl<F, V, D, const N: usize> TrackingObjective<F, V, D, N>
where
    F: Float,
    V: FlatVector<F>,
    D: Discretization<F, N>,
{
    /// Build from a target state `û` and a regularization weight `γ ≥ 0`.
    pub fn new(disc: Arc<D>, target: V, gamma: F) -> Result<Self> {
        if target.dimension() != disc.num_dofs() {
            return Err(OptimError::invalid_params(format!(
                "target has dimension {}, expected {}",
                target.dimension(),
                disc.num_dofs()
            )));
        }
        if gamma < F::zero() {
            return Err(OptimError::invalid_params(format!(
                "negative regularization weight {gamma}"
            )));
        }
        Ok(TrackingObjective {
            disc,
            target,
            gamma,
        })
    }

    pub fn target(&self) -> &V {
        &self.target
    }

    pub fn gamma(&self) -> F {
        self.gamma
    }

    /// `mv ← M·v`, summing the contributions of every cell sharing a dof.
    pub fn apply_mass(&self, mv: &mut V, v: &V) {
        let disc = &*self.disc;
        check_dim(v, disc.num_dofs(), "mass operand");
        check_dim(mv, disc.num_dofs(), "mass output");
        mv.zero();
        let vs = v.as_slice();
        let out = mv.as_mut_slice();
        for cell in 0..disc.num_cells() {
            for r in 0..N {
                let i = disc.dof(cell, r);
                for c in 0..N {
                    out[i] += disc.mass(cell, r, c) * vs[disc.dof(cell, c)];
                }
            }
        }
    }

    fn misfit(&self, u: &V) -> V {
        let mut err = u.clone();
        err.axpy(-F::one(), &self.target);
        err
    }
}

impl<F, V, D, const N: usize> ObjectiveSimOpt<F, V> for TrackingObjective<F, V, D, N>
where
    F: Float,
    V: FlatVector<F>,
    D: Discretization<F, N>,
{
    fn value(&self, u: &V, z: &V) -> F {
        let err = self.misfit(u);
        let mut m_err = u.clone();
        self.apply_mass(&mut m_err, &err);
        let mut m_z = z.clone();
        self.apply_mass(&mut m_z, z);
        F::lit(0.5) * (m_err.dot(&err) + self.gamma * m_z.dot(z))
    }

    fn gradient_1(&self, g: &mut V, u: &V, _z: &V) {
        let err = self.misfit(u);
        self.apply_mass(g, &err);
    }

    fn gradient_2(&self, g: &mut V, _u: &V, z: &V) {
        self.apply_mass(g, z);
        g.scale(self.gamma);
    }

    fn hess_vec_11(&self, hv: &mut V, v: &V, _u: &V, _z: &V) {
        self.apply_mass(hv, v);
    }

    fn hess_vec_12(&self, hv: &mut V, _v: &V, _u: &V, _z: &V) {
        hv.zero();
    }

    fn hess_vec_21(&self, hv: &mut V, _v: &V, _u: &V, _z: &V) {
        hv.zero();
    }

    fn hess_vec_22(&self, hv: &mut V, v: &V, _u: &V, _z: &V) {
        self.apply_mass(hv, v);
        hv.scale(self.gamma);
    }
}
