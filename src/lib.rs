//! Nestable forward-mode automatic differentiation.
//!
//! Write numeric code once against [`Scalar`] and evaluate it at plain floats
//! for values, at [`Dual`] or [`DualVec`] for first derivatives, and at nested
//! towers such as `DualVec<Dual<f64>, N>` for exact mixed second derivatives.

pub mod api;
pub mod dual;
pub mod dual_vec;
pub mod float;
pub mod scalar;
mod traits;

pub use api::{hvp, jacobian, jacobian_batched, jvp};
pub use dual::Dual;
pub use dual_vec::DualVec;
pub use float::Float;
pub use scalar::Scalar;

/// Type alias for forward-mode dual numbers over `f64`.
pub type Dual64 = Dual<f64>;
/// Type alias for forward-mode dual numbers over `f32`.
pub type Dual32 = Dual<f32>;
/// Type alias for second-order (forward-over-forward) dual numbers over `f64`.
pub type HyperDual64 = Dual<Dual<f64>>;
