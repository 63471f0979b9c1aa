mod common;

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tangent_optim::checks::{check_gradient, check_hess_vec};
use tangent_optim::{
    EqualityConstraintSimOpt, Objective, ObjectiveSimOpt, ReducedObjective, StdVector, Vector,
};

use common::{
    best_error, constraint_with, coupled_reduced, mesh, random_vector, tracking, Bvp, Tracking,
    NDOF,
};

type Reduced = ReducedObjective<f64, StdVector<f64>, Tracking, Bvp>;

fn reduced(gamma: f64) -> Reduced {
    let m = mesh();
    let obj = tracking(m.clone(), gamma);
    let con = constraint_with(m, 0.5, false);
    let zero = StdVector::zeros(NDOF);
    ReducedObjective::new(obj, con, zero.clone(), &zero)
}

#[test]
fn gradient_matches_finite_differences() {
    let mut rng = StdRng::seed_from_u64(30);
    let z = random_vector(&mut rng, 0.5);
    let d = random_vector(&mut rng, 0.2);
    let mut red = reduced(1e-2);

    let rows = check_gradient(&mut red, &z, &d, 10).unwrap();
    assert!(best_error(&rows) < 1e-5, "gradient error {}", best_error(&rows));
}

#[test]
fn hess_vec_matches_finite_differences() {
    let mut rng = StdRng::seed_from_u64(31);
    let z = random_vector(&mut rng, 0.5);
    let v = random_vector(&mut rng, 0.2);
    let mut red = reduced(1e-2);

    let rows = check_hess_vec(&mut red, &z, &v, 10).unwrap();
    let scale = rows[0].exact.max(1.0);
    assert!(
        best_error(&rows) < 1e-5 * scale,
        "hess_vec error {}",
        best_error(&rows)
    );
}

#[test]
fn hess_vec_is_symmetric() {
    let mut rng = StdRng::seed_from_u64(32);
    let z = random_vector(&mut rng, 0.5);
    let a = random_vector(&mut rng, 1.0);
    let b = random_vector(&mut rng, 1.0);
    let mut red = reduced(1e-2);

    let mut ha = StdVector::zeros(NDOF);
    let mut hb = StdVector::zeros(NDOF);
    red.hess_vec(&mut ha, &a, &z).unwrap();
    red.hess_vec(&mut hb, &b, &z).unwrap();
    assert_relative_eq!(ha.dot(&b), hb.dot(&a), epsilon = 1e-10, max_relative = 1e-10);
}

#[test]
fn coupled_control_gradient_and_hess_vec_match_finite_differences() {
    let mut rng = StdRng::seed_from_u64(36);
    let z = random_vector(&mut rng, 0.5);
    let d = random_vector(&mut rng, 0.2);
    let mut red = coupled_reduced(1e-2);

    let rows = check_gradient(&mut red, &z, &d, 10).unwrap();
    assert!(best_error(&rows) < 1e-5, "gradient error {}", best_error(&rows));

    let rows = check_hess_vec(&mut red, &z, &d, 10).unwrap();
    let scale = rows[0].exact.max(1.0);
    assert!(
        best_error(&rows) < 1e-5 * scale,
        "hess_vec error {}",
        best_error(&rows)
    );
}

#[test]
fn coupled_control_hess_vec_is_symmetric() {
    let mut rng = StdRng::seed_from_u64(37);
    let z = random_vector(&mut rng, 0.5);
    let a = random_vector(&mut rng, 1.0);
    let b = random_vector(&mut rng, 1.0);
    let mut red = coupled_reduced(1e-2);

    let mut ha = StdVector::zeros(NDOF);
    let mut hb = StdVector::zeros(NDOF);
    red.hess_vec(&mut ha, &a, &z).unwrap();
    red.hess_vec(&mut hb, &b, &z).unwrap();
    assert_relative_eq!(ha.dot(&b), hb.dot(&a), epsilon = 1e-10, max_relative = 1e-10);
}

#[test]
fn adjoint_solves_adjoint_equation() {
    let mut rng = StdRng::seed_from_u64(33);
    let z = random_vector(&mut rng, 0.5);
    let mut red = reduced(1e-2);
    let mut g = StdVector::zeros(NDOF);
    red.gradient(&mut g, &z).unwrap();

    // c_uᵀλ + f_u = 0
    let u = red.state().clone();
    let lambda = red.adjoint().clone();
    let mut residual = StdVector::zeros(NDOF);
    red.objective().gradient_1(&mut residual, &u, &z);
    let mut ajl = StdVector::zeros(NDOF);
    red.constraint_mut()
        .apply_adjoint_jacobian_1(&mut ajl, &lambda, &u, &z);
    residual.plus(&ajl);
    assert!(residual.norm() < 1e-12, "adjoint residual {}", residual.norm());

    let mut c = StdVector::zeros(NDOF);
    red.constraint().value(&mut c, &u, &z);
    assert!(c.norm() < 1e-10);
}

#[test]
fn state_is_solved_once_per_control() {
    let mut rng = StdRng::seed_from_u64(34);
    let z0 = random_vector(&mut rng, 0.5);
    let z1 = random_vector(&mut rng, 0.5);
    let mut red = reduced(1e-2);
    assert_eq!(red.state_solves(), 0);

    let f0 = red.value(&z0).unwrap();
    let mut g = StdVector::zeros(NDOF);
    red.gradient(&mut g, &z0).unwrap();
    red.update(&z0, true, 0).unwrap();
    assert_eq!(red.state_solves(), 1);

    red.value(&z1).unwrap();
    assert_eq!(red.state_solves(), 2);

    // returning to z0 re-solves and reproduces the value
    assert_relative_eq!(red.value(&z0).unwrap(), f0, epsilon = 1e-12);
    assert_eq!(red.state_solves(), 3);
}

#[test]
fn into_parts_returns_linearized_constraint() {
    let mut rng = StdRng::seed_from_u64(35);
    let z = random_vector(&mut rng, 0.5);
    let mut red = reduced(1e-2);
    red.value(&z).unwrap();
    let (obj, con) = red.into_parts();
    assert!(con.is_linearized());
    assert_eq!(obj.gamma(), 1e-2);
}
