#![allow(dead_code)]

use std::f64::consts::PI;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::Rng;
use tangent::{Float, Scalar};
use tangent_optim::{
    BvpConstraint, Coefficient, CoefficientParams, ConstraintConfig, EqualityConstraintSimOpt,
    ExampleCoefficient, IntervalMesh, ReducedObjective, StdVector, TrackingObjective, Vector,
};

// ─── Quadratic elements on [0, 1] ──────────────────────────────────────────

pub const CELLS: usize = 5;
pub const NDOF: usize = CELLS * 2 + 1;

pub type Mesh = IntervalMesh<f64, 3>;
pub type Bvp = BvpConstraint<f64, Mesh, ExampleCoefficient, 3>;
pub type Tracking = TrackingObjective<f64, StdVector<f64>, Mesh, 3>;

pub fn mesh() -> Arc<Mesh> {
    Arc::new(IntervalMesh::new(CELLS, 4, (0.0, 1.0)).unwrap())
}

pub fn constraint_with(mesh: Arc<Mesh>, source: f64, eager_update: bool) -> Bvp {
    let config = ConstraintConfig {
        eager_update,
        ..ConstraintConfig::default()
    };
    BvpConstraint::new(
        mesh,
        ExampleCoefficient,
        CoefficientParams::with_source(source),
        config,
    )
    .unwrap()
}

pub fn constraint(eager_update: bool) -> Bvp {
    constraint_with(mesh(), 0.5, eager_update)
}

// ─── Control coupled nonlinearly ───────────────────────────────────────────

/// ```text
/// κ = 1 + u²(1 + z²),   b = u(1 + z),   r = u + u³ + u z² − z − s
/// ```
///
/// Every second derivative involving `z` is nonzero, so all four adjoint
/// Hessian blocks carry information.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoupledCoefficient;

impl<F: Float> Coefficient<F> for CoupledCoefficient {
    fn diffusion<T: Scalar<Float = F>>(&self, _x: &[F], u: T, z: T, _params: &[F]) -> T {
        T::one() + u * u * (T::one() + z * z)
    }

    fn advection<T: Scalar<Float = F>>(
        &self,
        _x: &[F],
        u: T,
        z: T,
        _params: &[F],
        out: &mut [T],
    ) {
        for b in out.iter_mut() {
            *b = u * (T::one() + z);
        }
    }

    fn reaction<T: Scalar<Float = F>>(&self, _x: &[F], u: T, z: T, params: &[F]) -> T {
        let source = params.first().copied().unwrap_or_else(F::zero);
        u + u.powi(3) + u * z * z - z - T::from_f(source)
    }
}

pub type CoupledBvp = BvpConstraint<f64, Mesh, CoupledCoefficient, 3>;
pub type CoupledReduced = ReducedObjective<f64, StdVector<f64>, Tracking, CoupledBvp>;

pub fn coupled_constraint(mesh: Arc<Mesh>) -> CoupledBvp {
    BvpConstraint::new(
        mesh,
        CoupledCoefficient,
        CoefficientParams::with_source(0.5),
        ConstraintConfig::default(),
    )
    .unwrap()
}

pub fn coupled_reduced(gamma: f64) -> CoupledReduced {
    let m = mesh();
    let obj = tracking(m.clone(), gamma);
    let con = coupled_constraint(m);
    let zero = StdVector::zeros(NDOF);
    ReducedObjective::new(obj, con, zero.clone(), &zero)
}

/// Central difference of `c_bᵀw` along `v` in block `a`.
pub fn fd_adjoint_hessian<C: EqualityConstraintSimOpt<f64, StdVector<f64>>>(
    con: &mut C,
    w: &StdVector<f64>,
    v: &StdVector<f64>,
    u: &StdVector<f64>,
    z: &StdVector<f64>,
    direction_state: bool,
    output_state: bool,
) -> StdVector<f64> {
    let h = 1e-5;
    let mut out = StdVector::zeros(NDOF);
    for (sign, scale) in [(1.0, 0.5 / h), (-1.0, -0.5 / h)] {
        let shift = |base: &StdVector<f64>| {
            let mut p = base.clone();
            p.axpy(sign * h, v);
            p
        };
        let (up, zp) = if direction_state {
            (shift(u), z.clone())
        } else {
            (u.clone(), shift(z))
        };
        con.update(&up, &zp);
        let mut ajw = StdVector::zeros(NDOF);
        if output_state {
            con.apply_adjoint_jacobian_1(&mut ajw, w, &up, &zp);
        } else {
            con.apply_adjoint_jacobian_2(&mut ajw, w, &up, &zp);
        }
        out.axpy(scale, &ajw);
    }
    out
}

/// `H_ab(w, v)` for direction block `a` and output block `b`.
pub fn adjoint_hessian<C: EqualityConstraintSimOpt<f64, StdVector<f64>>>(
    con: &C,
    w: &StdVector<f64>,
    v: &StdVector<f64>,
    u: &StdVector<f64>,
    z: &StdVector<f64>,
    direction_state: bool,
    output_state: bool,
) -> StdVector<f64> {
    let mut out = StdVector::zeros(NDOF);
    match (direction_state, output_state) {
        (true, true) => con.apply_adjoint_hessian_11(&mut out, w, v, u, z),
        (true, false) => con.apply_adjoint_hessian_12(&mut out, w, v, u, z),
        (false, true) => con.apply_adjoint_hessian_21(&mut out, w, v, u, z),
        (false, false) => con.apply_adjoint_hessian_22(&mut out, w, v, u, z),
    }
    out
}

/// Target `½ sin(πx)` sampled at the (equispaced) nodes.
pub fn target() -> StdVector<f64> {
    let h = 1.0 / (NDOF - 1) as f64;
    StdVector::new((0..NDOF).map(|i| 0.5 * (PI * i as f64 * h).sin()).collect())
}

pub fn tracking(mesh: Arc<Mesh>, gamma: f64) -> Tracking {
    TrackingObjective::new(mesh, target(), gamma).unwrap()
}

// ─── Random data ───────────────────────────────────────────────────────────

pub fn random_vector(rng: &mut StdRng, scale: f64) -> StdVector<f64> {
    StdVector::new((0..NDOF).map(|_| scale * rng.gen_range(-1.0..1.0)).collect())
}

/// Smallest error in a finite-difference table.
pub fn best_error(rows: &[tangent_optim::checks::DerivativeCheck<f64>]) -> f64 {
    rows.iter().map(|r| r.error).fold(f64::INFINITY, f64::min)
}
