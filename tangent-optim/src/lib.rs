//! Adjoint sensitivities for simulation-constrained optimization.
//!
//! A state `u` and a control `z` are tied by a discretized boundary value
//! problem `c(u, z) = 0`. [`BvpConstraint`] provides the Jacobian blocks of
//! `c`, their adjoints and inverses, and the four adjoint-Hessian blocks, all
//! derived by evaluating one type-generic [`Residual`] at dual numbers.
//! [`ReducedObjective`] combines it with an [`ObjectiveSimOpt`] into an
//! [`Objective`] of `z` alone, which any [`Step`] can minimize under the
//! [`Algorithm`] driver.

pub mod algorithm;
pub mod checks;
pub mod coefficient;
pub mod constraint;
pub mod convergence;
pub mod discretization;
pub mod error;
pub mod line_search;
pub mod linalg;
pub mod objective;
pub mod reduced;
pub mod residual;
pub mod result;
pub mod step;
pub mod steps;
pub mod vector;

pub use algorithm::Algorithm;
pub use coefficient::{Coefficient, CoefficientParams, ExampleCoefficient};
pub use constraint::{
    newton_solve, BvpConstraint, ConstraintConfig, EqualityConstraintSimOpt, StateSolveParams,
};
pub use convergence::{ConvergenceParams, StatusTest};
pub use discretization::{Discretization, IntervalMesh};
pub use error::{OptimError, Result};
pub use line_search::{backtracking_armijo, ArmijoParams, LineSearchResult};
pub use linalg::EquilibratedLu;
pub use objective::{Objective, ObjectiveSimOpt, TrackingObjective};
pub use reduced::ReducedObjective;
pub use residual::Residual;
pub use result::{OptimResult, TerminationReason};
pub use step::{AlgorithmState, Step, StepState};
pub use steps::{GradientStep, NewtonCgConfig, NewtonCgStep};
pub use vector::{check_vector, FlatVector, StdVector, Vector};
