use tangent::Float;
use tracing::debug;

use crate::error::Result;
use crate::line_search::{backtracking_armijo, ArmijoParams};
use crate::objective::Objective;
use crate::step::{accept_step, not_initialized, AlgorithmState, Step, StepState};
use crate::vector::Vector;

/// Configuration for the truncated Newton-CG step.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NewtonCgConfig<F> {
    /// Maximum CG iterations per step (default: 50).
    pub max_cg_iter: usize,
    /// Upper bound on the relative CG residual (default: 0.5).
    pub max_forcing: F,
    pub armijo: ArmijoParams<F>,
}

impl Default for NewtonCgConfig<f64> {
    fn default() -> Self {
        NewtonCgConfig {
            max_cg_iter: 50,
            max_forcing: 0.5,
            armijo: ArmijoParams::default(),
        }
    }
}

impl Default for NewtonCgConfig<f32> {
    fn default() -> Self {
        NewtonCgConfig {
            max_cg_iter: 50,
            max_forcing: 0.5,
            armijo: ArmijoParams::default(),
        }
    }
}

/// Inexact Newton: truncated CG on Hessian-vector products for `H d = −g`,
/// globalized by a backtracking Armijo search.
pub struct NewtonCgStep<F, V> {
    config: NewtonCgConfig<F>,
    state: Option<StepState<V>>,
    cg_iters: usize,
    hess_vecs: usize,
}

impl<F: Float, V: Vector<F>> NewtonCgStep<F, V> {
    pub fn new(config: NewtonCgConfig<F>) -> Self {
        NewtonCgStep {
            config,
            state: None,
            cg_iters: 0,
            hess_vecs: 0,
        }
    }

    /// CG iterations of the last `compute`.
    pub fn cg_iters(&self) -> usize {
        self.cg_iters
    }

    /// Hessian-vector products since construction.
    pub fn hess_vecs(&self) -> usize {
        self.hess_vecs
    }
}

/// Truncated CG for `H d = −g` from `d = 0`.
///
/// Stops on relative residual `‖r‖ ≤ tol·‖g‖`, on non-positive curvature, or
/// after `max_iter` iterations. Non-positive curvature in the very first
/// direction leaves `d = −g`. Returns the number of iterations.
fn truncated_cg<F, V, O>(
    obj: &mut O,
    d: &mut V,
    x: &V,
    grad: &V,
    tol: F,
    max_iter: usize,
    hess_vecs: &mut usize,
) -> Result<usize>
where
    F: Float,
    V: Vector<F>,
    O: Objective<F, V>,
{
    let gnorm = grad.norm();
    let mut r = grad.clone();
    r.scale(-F::one());
    let mut p = r.clone();
    let mut hp = grad.clone();
    let mut r_dot_r = r.dot(&r);
    d.zero();

    for k in 0..max_iter {
        obj.hess_vec(&mut hp, &p, x)?;
        *hess_vecs += 1;

        let curvature = p.dot(&hp);
        if curvature <= F::zero() {
            if k == 0 {
                d.set(&r);
            }
            debug!(k, "negative curvature in cg");
            return Ok(k);
        }

        let alpha = r_dot_r / curvature;
        d.axpy(alpha, &p);
        r.axpy(-alpha, &hp);

        let r_dot_r_new = r.dot(&r);
        if r_dot_r_new.sqrt() <= tol * gnorm {
            return Ok(k + 1);
        }

        let beta = r_dot_r_new / r_dot_r;
        r_dot_r = r_dot_r_new;
        p.scale(beta);
        p.plus(&r);
    }
    Ok(max_iter)
}

impl<F: Float, V: Vector<F>> Step<F, V> for NewtonCgStep<F, V> {
    fn step_state(&self) -> Option<&StepState<V>> {
        self.state.as_ref()
    }

    fn step_state_mut(&mut self) -> &mut Option<StepState<V>> {
        &mut self.state
    }

    fn compute<O: Objective<F, V>>(
        &mut self,
        s: &mut V,
        x: &V,
        obj: &mut O,
        algo_state: &mut AlgorithmState<F, V>,
    ) -> Result<()> {
        let st = self
            .state
            .as_mut()
            .ok_or_else(|| not_initialized("Newton-CG step"))?;

        let tol = self.config.max_forcing.min(algo_state.gnorm.sqrt());
        self.cg_iters = truncated_cg(
            obj,
            &mut st.descent,
            x,
            &st.gradient,
            tol,
            self.config.max_cg_iter,
            &mut self.hess_vecs,
        )?;

        // Guard against a CG direction that is not downhill.
        if !(st.descent.dot(&st.gradient) < F::zero()) {
            st.descent.set(&st.gradient);
            st.descent.scale(-F::one());
        }

        let ls = backtracking_armijo(
            obj,
            x,
            &st.descent,
            algo_state.value,
            &st.gradient,
            &self.config.armijo,
        )?;
        algo_state.nfval += ls.evals;

        s.set(&st.descent);
        s.scale(ls.alpha);
        Ok(())
    }

    fn update<O: Objective<F, V>>(
        &mut self,
        x: &mut V,
        s: &V,
        obj: &mut O,
        algo_state: &mut AlgorithmState<F, V>,
    ) -> Result<()> {
        let st = self
            .state
            .as_mut()
            .ok_or_else(|| not_initialized("Newton-CG step"))?;
        accept_step(st, x, s, obj, algo_state)
    }

    fn name(&self) -> &'static str {
        "Newton-CG with backtracking Armijo"
    }
}
