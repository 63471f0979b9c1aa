use tangent::Float;

use crate::error::Result;
use crate::line_search::{backtracking_armijo, ArmijoParams};
use crate::objective::Objective;
use crate::step::{accept_step, not_initialized, AlgorithmState, Step, StepState};
use crate::vector::Vector;

/// Steepest descent with a backtracking Armijo line search.
pub struct GradientStep<F, V> {
    armijo: ArmijoParams<F>,
    state: Option<StepState<V>>,
    last_alpha: F,
}

impl<F: Float, V: Vector<F>> GradientStep<F, V> {
    pub fn new(armijo: ArmijoParams<F>) -> Self {
        GradientStep {
            armijo,
            state: None,
            last_alpha: F::zero(),
        }
    }

    /// Step length accepted by the last line search.
    pub fn last_alpha(&self) -> F {
        self.last_alpha
    }
}

impl<F: Float, V: Vector<F>> Step<F, V> for GradientStep<F, V> {
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
            .ok_or_else(|| not_initialized("gradient step"))?;
        st.descent.set(&st.gradient);
        st.descent.scale(-F::one());

        let ls = backtracking_armijo(
            obj,
            x,
            &st.descent,
            algo_state.value,
            &st.gradient,
            &self.armijo,
        )?;
        algo_state.nfval += ls.evals;
        self.last_alpha = ls.alpha;

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
            .ok_or_else(|| not_initialized("gradient step"))?;
        accept_step(st, x, s, obj, algo_state)
    }

    fn name(&self) -> &'static str {
        "Steepest descent with backtracking Armijo"
    }
}
