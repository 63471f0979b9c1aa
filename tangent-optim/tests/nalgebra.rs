#![cfg(feature = "nalgebra")]

use std::sync::Arc;

use approx::assert_relative_eq;
use nalgebra::DVector;
use tangent_optim::{
    check_vector, BvpConstraint, CoefficientParams, ConstraintConfig, EqualityConstraintSimOpt,
    ExampleCoefficient, FlatVector, IntervalMesh, Objective, ReducedObjective, StdVector,
    TrackingObjective, Vector,
};

#[test]
fn dvector_satisfies_vector_laws() {
    let x = DVector::from_vec(vec![1.0, -2.0, 0.5]);
    let y = DVector::from_vec(vec![0.3, 4.0, -1.5]);
    let z = DVector::from_vec(vec![-0.7, 0.1, 2.0]);
    for err in check_vector(&x, &y, &z) {
        assert!(err < 1e-14, "vector law violated: {err}");
    }
}

#[test]
fn dvector_arithmetic_matches_std_vector() {
    let a = vec![1.0, -2.0, 0.5, 3.0];
    let b = vec![0.3, 4.0, -1.5, -0.25];

    let mut na = DVector::from_vec(a.clone());
    let nb = DVector::from_vec(b.clone());
    let mut sa = StdVector::new(a);
    let sb = StdVector::new(b);

    assert_relative_eq!(Vector::dot(&na, &nb), sa.dot(&sb), max_relative = 1e-15);
    Vector::axpy(&mut na, -0.5, &nb);
    sa.axpy(-0.5, &sb);
    Vector::scale(&mut na, 2.0);
    sa.scale(2.0);
    assert_eq!(na.as_slice(), sa.as_slice());
    assert_relative_eq!(Vector::norm(&na), sa.norm(), max_relative = 1e-15);
}

#[test]
fn dvector_and_std_vector_give_same_reduced_gradient() {
    let mesh = Arc::new(IntervalMesh::<f64, 2>::new(8, 3, (0.0, 1.0)).unwrap());
    let n = 9;
    let target: Vec<f64> = (0..n).map(|i| 0.1 * i as f64).collect();
    let control: Vec<f64> = (0..n).map(|i| 0.3 - 0.05 * i as f64).collect();

    let con = || {
        BvpConstraint::new(
            mesh.clone(),
            ExampleCoefficient,
            CoefficientParams::with_source(0.5),
            ConstraintConfig::default(),
        )
        .unwrap()
    };

    let mut red_na = ReducedObjective::new(
        TrackingObjective::new(mesh.clone(), DVector::from_vec(target.clone()), 1e-2).unwrap(),
        con(),
        DVector::zeros(n),
        &DVector::zeros(n),
    );
    let mut red_std = ReducedObjective::new(
        TrackingObjective::new(mesh.clone(), StdVector::new(target), 1e-2).unwrap(),
        con(),
        StdVector::zeros(n),
        &StdVector::zeros(n),
    );

    let z_na = DVector::from_vec(control.clone());
    let z_std = StdVector::new(control);
    let mut g_na = DVector::zeros(n);
    let mut g_std = StdVector::zeros(n);
    red_na.gradient(&mut g_na, &z_na).unwrap();
    red_std.gradient(&mut g_std, &z_std).unwrap();

    for i in 0..n {
        assert!((g_na[i] - g_std[i]).abs() < 1e-14);
    }
    assert!(red_na.constraint().is_linearized());
    let mut c = DVector::zeros(n);
    red_na.constraint().value(&mut c, red_na.state(), &z_na);
    assert!(c.norm() < 1e-10);
}
