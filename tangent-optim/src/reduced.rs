//! Reduced objective `F(z) = f(u(z), z)` with `u(z)` defined by `c(u, z) = 0`.

use std::marker::PhantomData;

use tangent::Float;
use tracing::debug;

use crate::constraint::EqualityConstraintSimOpt;
use crate::error::Result;
use crate::objective::{Objective, ObjectiveSimOpt};
use crate::vector::Vector;

/// Eliminates the state through the constraint and exposes an [`Objective`]
/// of the control alone.
///
/// The state is cached together with the control it was solved for and
/// reused, warm-starting the next Newton solve, whenever the control moves.
/// Gradients use one adjoint solve; Hessian-vector products use the
/// second-order adjoint (two more linear solves and four adjoint-Hessian
/// products).
pub struct ReducedObjective<F, V, O, C> {
    obj: O,
    con: C,
    state: V,
    adjoint: V,
    control: V,
    state_current: bool,
    adjoint_current: bool,
    state_solves: usize,
    _marker: PhantomData<F>,
}

impl<F, V, O, C> ReducedObjective<F, V, O, C>
where
    F: Float,
    V: Vector<F>,
    O: ObjectiveSimOpt<F, V>,
    C: EqualityConstraintSimOpt<F, V>,
{
    /// `state` is the initial guess for the first state solve; `control` only
    /// fixes the dimension of the control space.
    pub fn new(obj: O, con: C, state: V, control: &V) -> Self {
        let adjoint = state.clone();
        ReducedObjective {
            obj,
            con,
            state,
            adjoint,
            control: control.clone(),
            state_current: false,
            adjoint_current: false,
            state_solves: 0,
            _marker: PhantomData,
        }
    }

    /// State of the most recent solve.
    pub fn state(&self) -> &V {
        &self.state
    }

    /// Adjoint `λ = −c_u⁻ᵀ f_u` of the most recent gradient evaluation.
    pub fn adjoint(&self) -> &V {
        &self.adjoint
    }

    pub fn objective(&self) -> &O {
        &self.obj
    }

    pub fn constraint(&self) -> &C {
        &self.con
    }

    pub fn constraint_mut(&mut self) -> &mut C {
        &mut self.con
    }

    /// Number of state solves performed so far.
    pub fn state_solves(&self) -> usize {
        self.state_solves
    }

    pub fn into_parts(self) -> (O, C) {
        (self.obj, self.con)
    }

    fn at_cached_control(&self, z: &V) -> bool {
        let mut diff = z.clone();
        diff.axpy(-F::one(), &self.control);
        diff.norm() == F::zero()
    }

    /// Make `self.state` solve `c(u, z) = 0` and linearize the constraint there.
    fn solve_state(&mut self, z: &V) -> Result<()> {
        if self.state_current && self.at_cached_control(z) {
            return Ok(());
        }
        let mut u = self.state.clone();
        let iterations = self.con.solve(&mut u, z)?;
        self.con.update(&u, z);
        self.state.set(&u);
        self.control.set(z);
        self.state_current = true;
        self.adjoint_current = false;
        self.state_solves += 1;
        debug!(iterations, "reduced objective state solve");
        Ok(())
    }

    /// `λ = c_u⁻ᵀ(−f_u)` at the current state.
    fn solve_adjoint(&mut self, z: &V) -> Result<()> {
        if self.adjoint_current {
            return Ok(());
        }
        let mut rhs = self.state.clone();
        self.obj.gradient_1(&mut rhs, &self.state, z);
        rhs.scale(-F::one());
        self.con
            .apply_inverse_adjoint_jacobian_1(&mut self.adjoint, &rhs, &self.state, z)?;
        self.adjoint_current = true;
        Ok(())
    }
}

impl<F, V, O, C> Objective<F, V> for ReducedObjective<F, V, O, C>
where
    F: Float,
    V: Vector<F>,
    O: ObjectiveSimOpt<F, V>,
    C: EqualityConstraintSimOpt<F, V>,
{
    fn update(&mut self, x: &V, accepted: bool, iter: usize) -> Result<()> {
        self.solve_state(x)?;
        self.obj.update(&self.state, x, accepted, iter);
        Ok(())
    }

    fn value(&mut self, x: &V) -> Result<F> {
        self.solve_state(x)?;
        Ok(self.obj.value(&self.state, x))
    }

    /// `g = f_z + c_zᵀλ`.
    fn gradient(&mut self, g: &mut V, x: &V) -> Result<()> {
        self.solve_state(x)?;
        self.solve_adjoint(x)?;
        let u = &self.state;
        self.obj.gradient_2(g, u, x);
        let mut jz_lambda = x.clone();
        self.con
            .apply_adjoint_jacobian_2(&mut jz_lambda, &self.adjoint, u, x);
        g.plus(&jz_lambda);
        Ok(())
    }

    /// Second-order adjoint:
    ///
    /// ```text
    /// w  = c_u⁻¹(−c_z v)
    /// p  = f_uu w + H11(λ, w) + f_uz v + H21(λ, v)
    /// μ  = c_u⁻ᵀ(−p)
    /// hv = c_zᵀμ + f_zu w + f_zz v + H12(λ, w) + H22(λ, v)
    /// ```
    fn hess_vec(&mut self, hv: &mut V, v: &V, x: &V) -> Result<()> {
        self.solve_state(x)?;
        self.solve_adjoint(x)?;
        let u = &self.state;
        let lambda = &self.adjoint;
        let mut tmp = u.clone();

        // Linearized state sensitivity
        let mut jzv = u.clone();
        self.con.apply_jacobian_2(&mut jzv, v, u, x);
        jzv.scale(-F::one());
        let mut w = u.clone();
        self.con.apply_inverse_jacobian_1(&mut w, &jzv, u, x)?;

        // Second-order adjoint right-hand side, state space
        let mut p = u.clone();
        self.obj.hess_vec_11(&mut p, &w, u, x);
        self.con.apply_adjoint_hessian_11(&mut tmp, lambda, &w, u, x);
        p.plus(&tmp);
        self.obj.hess_vec_12(&mut tmp, v, u, x);
        p.plus(&tmp);
        self.con.apply_adjoint_hessian_21(&mut tmp, lambda, v, u, x);
        p.plus(&tmp);

        p.scale(-F::one());
        let mut mu = u.clone();
        self.con
            .apply_inverse_adjoint_jacobian_1(&mut mu, &p, u, x)?;

        // Assemble in control space
        self.con.apply_adjoint_jacobian_2(hv, &mu, u, x);
        let mut tmp = x.clone();
        self.obj.hess_vec_21(&mut tmp, &w, u, x);
        hv.plus(&tmp);
        self.obj.hess_vec_22(&mut tmp, v, u, x);
        hv.plus(&tmp);
        self.con.apply_adjoint_hessian_12(&mut tmp, lambda, &w, u, x);
        hv.plus(&tmp);
        self.con.apply_adjoint_hessian_22(&mut tmp, lambda, v, u, x);
        hv.plus(&tmp);
        Ok(())
    }
}
