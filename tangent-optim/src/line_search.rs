use tangent::Float;
use tracing::debug;

use crate::error::{OptimError, Result};
use crate::objective::Objective;
use crate::vector::Vector;

/// Parameters for the backtracking Armijo line search.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArmijoParams<F> {
    /// Sufficient decrease parameter (default: 1e-4).
    pub c: F,
    /// Backtracking factor (default: 0.5).
    pub rho: F,
    /// Initial step size (default: 1.0).
    pub alpha_init: F,
    /// Minimum step size before declaring failure (default: 1e-16).
    pub alpha_min: F,
}

impl Default for ArmijoParams<f64> {
    fn default() -> Self {
        ArmijoParams {
            c: 1e-4,
            rho: 0.5,
            alpha_init: 1.0,
            alpha_min: 1e-16,
        }
    }
}

impl Default for ArmijoParams<f32> {
    fn default() -> Self {
        ArmijoParams {
            c: 1e-4,
            rho: 0.5,
            alpha_init: 1.0,
            alpha_min: 1e-8,
        }
    }
}

/// Result of a successful line search.
#[derive(Debug, Clone, Copy)]
pub struct LineSearchResult<F> {
    /// The accepted step size.
    pub alpha: F,
    /// Objective value at `x + alpha * d`.
    pub value: F,
    /// Number of function evaluations used.
    pub evals: usize,
}

/// Backtracking line search satisfying the Armijo (sufficient decrease) condition.
///
/// Searches for `alpha` such that `f(x + alpha*d) <= f(x) + c * alpha * g^T d`.
///
/// Fails with [`OptimError::LineSearchFailed`] if `d` is not a descent
/// direction, `alpha` falls below `alpha_min`, or the trial step
/// `alpha * d` is lost in the rounding of `x` (`alpha‖d‖ ≤ ε‖x‖`).
pub fn backtracking_armijo<F, V, O>(
    obj: &mut O,
    x: &V,
    d: &V,
    f_x: F,
    grad_x: &V,
    params: &ArmijoParams<F>,
) -> Result<LineSearchResult<F>>
where
    F: Float,
    V: Vector<F>,
    O: Objective<F, V> + ?Sized,
{
    let dg = grad_x.dot(d);

    // Not a descent direction
    if !(dg < F::zero()) {
        return Err(OptimError::LineSearchFailed {
            alpha: params.alpha_init.to_f64().unwrap_or(f64::NAN),
        });
    }

    let x_norm = x.norm();
    let d_norm = d.norm();
    let mut alpha = params.alpha_init;
    let mut x_new = x.clone();
    let mut evals = 0;

    loop {
        if alpha < params.alpha_min || alpha * d_norm <= F::epsilon() * x_norm {
            return Err(OptimError::LineSearchFailed {
                alpha: alpha.to_f64().unwrap_or(f64::NAN),
            });
        }

        x_new.set(x);
        x_new.axpy(alpha, d);
        // A failed state solve at a long trial step counts as no decrease.
        let f_new = match obj.value(&x_new) {
            Ok(f) => f,
            Err(err) if err.is_numerical() => {
                debug!(alpha = ?alpha.to_f64(), %err, "trial point rejected");
                F::max_value()
            }
            Err(err) => return Err(err),
        };
        evals += 1;

        if f_new <= f_x + params.c * alpha * dg {
            return Ok(LineSearchResult {
                alpha,
                value: f_new,
                evals,
            });
        }

        debug!(alpha = ?alpha.to_f64(), "armijo backtrack");
        alpha = alpha * params.rho;
    }
}
