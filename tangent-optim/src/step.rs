//! Algorithm bookkeeping and the lifecycle contract of an optimization step.
//!
//! A [`Step`] is driven as `initialize`, then repeatedly `compute` and
//! `update`. Whether to keep iterating is decided outside the step, from the
//! [`AlgorithmState`] it maintains.

use tangent::Float;

use crate::error::{OptimError, Result};
use crate::objective::Objective;
use crate::vector::Vector;

/// Iteration counters and the latest accepted iterate.
#[derive(Debug, Clone)]
pub struct AlgorithmState<F, V> {
    /// Completed iterations.
    pub iter: usize,
    /// Objective evaluations.
    pub nfval: usize,
    /// Gradient evaluations.
    pub ngrad: usize,
    /// Objective value at `iterate`.
    pub value: F,
    /// Gradient norm at `iterate`.
    pub gnorm: F,
    /// Norm of the last accepted step.
    pub snorm: F,
    pub iterate: V,
}

impl<F: Float, V: Vector<F>> AlgorithmState<F, V> {
    /// Fresh state with zero counters, holding a copy of `x`.
    pub fn new(x: &V) -> Self {
        AlgorithmState {
            iter: 0,
            nfval: 0,
            ngrad: 0,
            value: F::zero(),
            gnorm: F::zero(),
            snorm: F::zero(),
            iterate: x.clone(),
        }
    }
}

/// Working vectors owned by a step.
#[derive(Debug, Clone)]
pub struct StepState<V> {
    /// Gradient at the current iterate.
    pub gradient: V,
    /// Last search direction.
    pub descent: V,
}

/// Step-size sentinel reported before the first step is taken.
pub const INITIAL_STEP_NORM: f64 = 1e10;

/// One optimization strategy, driven through a fixed lifecycle.
pub trait Step<F: Float, V: Vector<F>> {
    fn step_state(&self) -> Option<&StepState<V>>;

    fn step_state_mut(&mut self) -> &mut Option<StepState<V>>;

    /// Allocate working storage from `x` and evaluate the objective there.
    ///
    /// Leaves `ngrad = nfval = 1`, `gnorm = ‖∇f(x)‖` and `snorm` at
    /// [`INITIAL_STEP_NORM`].
    fn initialize<O: Objective<F, V>>(
        &mut self,
        x: &V,
        obj: &mut O,
        algo_state: &mut AlgorithmState<F, V>,
    ) -> Result<()> {
        let mut gradient = x.clone();
        let descent = x.clone();

        obj.update(x, true, algo_state.iter)?;
        obj.gradient(&mut gradient, x)?;
        algo_state.ngrad = 1;
        algo_state.value = obj.value(x)?;
        algo_state.nfval = 1;
        algo_state.gnorm = gradient.norm();
        algo_state.snorm = F::lit(INITIAL_STEP_NORM);
        algo_state.iterate.set(x);

        *self.step_state_mut() = Some(StepState { gradient, descent });
        Ok(())
    }

    /// Fill `s` with the step to take from `x`.
    fn compute<O: Objective<F, V>>(
        &mut self,
        s: &mut V,
        x: &V,
        obj: &mut O,
        algo_state: &mut AlgorithmState<F, V>,
    ) -> Result<()>;

    /// Take the step `s` from `x` and refresh `algo_state`.
    fn update<O: Objective<F, V>>(
        &mut self,
        x: &mut V,
        s: &V,
        obj: &mut O,
        algo_state: &mut AlgorithmState<F, V>,
    ) -> Result<()>;

    fn name(&self) -> &'static str;

    fn print_header(&self) -> String {
        format!(
            "  {:>6}  {:>14}  {:>14}  {:>14}  {:>6}  {:>6}",
            "iter", "value", "gnorm", "snorm", "#fval", "#grad"
        )
    }

    /// One-line report of `algo_state`, preceded by the step name and column
    /// header when `header` is set.
    fn print(&self, algo_state: &AlgorithmState<F, V>, header: bool) -> String {
        let line = format!(
            "  {:>6}  {:>14.6e}  {:>14.6e}  {:>14.6e}  {:>6}  {:>6}",
            algo_state.iter,
            algo_state.value.to_f64().unwrap_or(f64::NAN),
            algo_state.gnorm.to_f64().unwrap_or(f64::NAN),
            algo_state.snorm.to_f64().unwrap_or(f64::NAN),
            algo_state.nfval,
            algo_state.ngrad,
        );
        if header {
            format!("{}\n{}\n{}", self.name(), self.print_header(), line)
        } else {
            line
        }
    }
}

/// Shared `update` of line-search steps: `x ← x + s`, then re-evaluate.
pub(crate) fn accept_step<F, V, O>(
    state: &mut StepState<V>,
    x: &mut V,
    s: &V,
    obj: &mut O,
    algo_state: &mut AlgorithmState<F, V>,
) -> Result<()>
where
    F: Float,
    V: Vector<F>,
    O: Objective<F, V>,
{
    x.plus(s);
    obj.update(x, true, algo_state.iter + 1)?;
    obj.gradient(&mut state.gradient, x)?;
    algo_state.ngrad += 1;
    algo_state.value = obj.value(x)?;
    algo_state.nfval += 1;
    algo_state.iter += 1;
    algo_state.snorm = s.norm();
    algo_state.gnorm = state.gradient.norm();
    algo_state.iterate.set(x);
    Ok(())
}

pub(crate) fn not_initialized(name: &str) -> OptimError {
    OptimError::invalid_params(format!("{name} used before initialize"))
}
