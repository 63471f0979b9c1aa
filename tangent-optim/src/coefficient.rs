//! Constitutive coefficient functions evaluated at cubature points.

use tangent::{Float, Scalar};

/// Diffusion, advection and reaction as functions of position, state and
/// control.
///
/// Every method is generic over the numeric type so that the residual can be
/// evaluated at plain floats or at any dual-number tower without the model
/// knowing which.
pub trait Coefficient<F: Float> {
    /// Scalar diffusivity `κ(x, u, z)`.
    fn diffusion<T: Scalar<Float = F>>(&self, x: &[F], u: T, z: T, params: &[F]) -> T;

    /// Advection velocity `b(x, u, z)`; writes `x.len()` components.
    fn advection<T: Scalar<Float = F>>(&self, x: &[F], u: T, z: T, params: &[F], out: &mut [T]);

    /// Reaction term `r(x, u, z)`.
    fn reaction<T: Scalar<Float = F>>(&self, x: &[F], u: T, z: T, params: &[F]) -> T;
}

/// Parameter lists handed to the three coefficient routines.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoefficientParams<F> {
    pub diffusion: Vec<F>,
    pub advection: Vec<F>,
    pub reaction: Vec<F>,
}

impl<F> CoefficientParams<F> {
    /// Parameters with only a reaction source term.
    pub fn with_source(source: F) -> Self {
        CoefficientParams {
            diffusion: Vec::new(),
            advection: Vec::new(),
            reaction: vec![source],
        }
    }
}

/// Nonlinear model problem
///
/// ```text
/// κ = 1 + u²,   b = u,   r = u + u³ − z − s
/// ```
///
/// where the constant source `s` is `params.reaction[0]` (zero when absent).
/// The reaction derivative `1 + 3u²` keeps the state Jacobian coercive.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExampleCoefficient;

impl<F: Float> Coefficient<F> for ExampleCoefficient {
    fn diffusion<T: Scalar<Float = F>>(&self, _x: &[F], u: T, _z: T, _params: &[F]) -> T {
        T::one() + u * u
    }

    fn advection<T: Scalar<Float = F>>(
        &self,
        _x: &[F],
        u: T,
        _z: T,
        _params: &[F],
        out: &mut [T],
    ) {
        for b in out.iter_mut() {
            *b = u;
        }
    }

    fn reaction<T: Scalar<Float = F>>(&self, _x: &[F], u: T, z: T, params: &[F]) -> T {
        let source = params.first().copied().unwrap_or_else(F::zero);
        u + u.powi(3) - z - T::from_f(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tangent::Dual64;

    #[test]
    fn reaction_derivatives() {
        let c = ExampleCoefficient;
        let x = [0.3];
        let u = Dual64::variable(2.0);
        let z = Dual64::constant(0.5);
        let r = c.reaction(&x, u, z, &[1.0]);
        assert_relative_eq!(r.re, 2.0 + 8.0 - 0.5 - 1.0);
        assert_relative_eq!(r.eps, 1.0 + 12.0);

        let r = c.reaction(&x, Dual64::constant(2.0), Dual64::variable(0.5), &[]);
        assert_relative_eq!(r.eps, -1.0);
    }

    #[test]
    fn diffusion_and_advection() {
        let c = ExampleCoefficient;
        let x: [f64; 1] = [0.0];
        let k = c.diffusion(&x, 3.0, 0.0, &[]);
        assert_relative_eq!(k, 10.0);
        let mut b = [0.0; 1];
        c.advection(&x, -1.5, 0.0, &[], &mut b);
        assert_relative_eq!(b[0], -1.5);
    }
}
