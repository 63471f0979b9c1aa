use tangent::Float;

use crate::result::TerminationReason;
use crate::step::AlgorithmState;

/// Parameters controlling convergence checks.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConvergenceParams<F> {
    /// Maximum number of iterations (default: 100).
    pub max_iter: usize,
    /// Gradient norm tolerance: stop when `||g|| <= grad_tol` (default: 1e-8).
    pub grad_tol: F,
    /// Step size tolerance: stop when `||x_{k+1} - x_k|| <= step_tol` (default: 1e-12).
    pub step_tol: F,
}

impl Default for ConvergenceParams<f64> {
    fn default() -> Self {
        ConvergenceParams {
            max_iter: 100,
            grad_tol: 1e-8,
            step_tol: 1e-12,
        }
    }
}

impl Default for ConvergenceParams<f32> {
    fn default() -> Self {
        ConvergenceParams {
            max_iter: 100,
            grad_tol: 1e-5,
            step_tol: 1e-7,
        }
    }
}

/// Decides between iterations whether the run is over.
#[derive(Debug, Clone)]
pub struct StatusTest<F> {
    params: ConvergenceParams<F>,
}

impl<F: Float> StatusTest<F> {
    pub fn new(params: ConvergenceParams<F>) -> Self {
        StatusTest { params }
    }

    pub fn params(&self) -> &ConvergenceParams<F> {
        &self.params
    }

    /// `None` while iteration should continue.
    ///
    /// Checked in order: gradient norm, step norm, iteration budget.
    pub fn check<V>(&self, state: &AlgorithmState<F, V>) -> Option<TerminationReason> {
        if state.gnorm <= self.params.grad_tol {
            Some(TerminationReason::GradientNorm)
        } else if state.snorm <= self.params.step_tol {
            Some(TerminationReason::StepSize)
        } else if state.iter >= self.params.max_iter {
            Some(TerminationReason::MaxIterations)
        } else {
            None
        }
    }
}
