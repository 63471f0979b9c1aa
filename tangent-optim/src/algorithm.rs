use tangent::Float;
use tracing::{info, warn};

use crate::convergence::{ConvergenceParams, StatusTest};
use crate::error::{OptimError, Result};
use crate::objective::Objective;
use crate::result::{OptimResult, TerminationReason};
use crate::step::{AlgorithmState, Step};
use crate::vector::Vector;

/// Drives a [`Step`] through its lifecycle until the status test fires.
#[derive(Debug, Clone)]
pub struct Algorithm<F> {
    status: StatusTest<F>,
}

impl<F: Float> Algorithm<F> {
    pub fn new(params: ConvergenceParams<F>) -> Self {
        Algorithm {
            status: StatusTest::new(params),
        }
    }

    /// Minimize `obj` from `x0`.
    ///
    /// A failed line search ends the run with
    /// [`TerminationReason::LineSearchFailed`] at the last accepted iterate;
    /// every other error is returned.
    pub fn run<V, S, O>(&self, step: &mut S, x0: &V, obj: &mut O) -> Result<OptimResult<F, V>>
    where
        V: Vector<F>,
        S: Step<F, V>,
        O: Objective<F, V>,
    {
        let mut x = x0.clone();
        let mut s = x0.clone();
        let mut state = AlgorithmState::new(x0);

        step.initialize(&x, obj, &mut state)?;
        info!("{}", step.print(&state, true));

        let termination = loop {
            if let Some(reason) = self.status.check(&state) {
                break reason;
            }
            match step.compute(&mut s, &x, obj, &mut state) {
                Ok(()) => {}
                Err(OptimError::LineSearchFailed { alpha }) => {
                    warn!(iter = state.iter, alpha, "line search failed");
                    break TerminationReason::LineSearchFailed;
                }
                Err(err) => return Err(err),
            }
            step.update(&mut x, &s, obj, &mut state)?;
            info!("{}", step.print(&state, false));
        };

        info!(%termination, iterations = state.iter, "optimization finished");
        Ok(OptimResult {
            x: state.iterate,
            value: state.value,
            gradient_norm: state.gnorm,
            step_norm: state.snorm,
            iterations: state.iter,
            func_evals: state.nfval,
            grad_evals: state.ngrad,
            termination,
        })
    }
}

impl Default for Algorithm<f64> {
    fn default() -> Self {
        Algorithm::new(ConvergenceParams::default())
    }
}

impl Default for Algorithm<f32> {
    fn default() -> Self {
        Algorithm::new(ConvergenceParams::default())
    }
}
