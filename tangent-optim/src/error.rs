//! Error types for the sensitivity engine.

use thiserror::Error;

/// Result type alias for fallible engine operations.
pub type Result<T> = std::result::Result<T, OptimError>;

/// Errors raised for numerical reasons.
///
/// Contract violations (vector lengths that do not match the number of
/// degrees of freedom) are not represented here; they panic.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimError {
    /// A dense factorization met a zero row or a pivot below tolerance.
    #[error("singular matrix: no usable pivot in column {column}")]
    SingularMatrix {
        /// Column (or row, for a zero row) where elimination broke down.
        column: usize,
    },

    /// A linear solve produced NaN or infinite values.
    #[error("linear solve produced non-finite values")]
    NonFinite,

    /// Newton iteration for the state equation did not converge.
    #[error("state solve did not converge after {iterations} iterations (residual norm {residual:e})")]
    StateSolveFailed {
        /// Iterations performed.
        iterations: usize,
        /// Residual norm at the last iterate.
        residual: f64,
    },

    /// Backtracking could not find sufficient decrease.
    #[error("line search failed (step length {alpha:e})")]
    LineSearchFailed {
        /// Last step length tried.
        alpha: f64,
    },

    /// Invalid construction parameters.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
}

impl OptimError {
    /// Create an invalid params error.
    #[must_use]
    pub fn invalid_params(details: impl Into<String>) -> Self {
        Self::InvalidParams(details.into())
    }

    /// Whether retrying with a different iterate could plausibly succeed.
    #[must_use]
    pub const fn is_numerical(&self) -> bool {
        !matches!(self, Self::InvalidParams(_))
    }
}
