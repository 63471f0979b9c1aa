//! Concrete line-search steps.

mod gradient;
mod newton_cg;

pub use gradient::GradientStep;
pub use newton_cg::{NewtonCgConfig, NewtonCgStep};
