use approx::assert_relative_eq;
use tangent::{jacobian, jacobian_batched, jvp, Dual, Dual64, DualVec, Scalar};

/// Central finite difference: (f(x+h) - f(x-h)) / 2h
fn finite_diff(f: impl Fn(f64) -> f64, x: f64) -> f64 {
    let h = 1e-7;
    (f(x + h) - f(x - h)) / (2.0 * h)
}

/// Test a dual elemental against finite differences.
fn check_elemental(
    f_dual: impl Fn(Dual64) -> Dual64,
    f_f64: impl Fn(f64) -> f64,
    x: f64,
    tol: f64,
) {
    let d = f_dual(Dual::variable(x));
    let expected_deriv = finite_diff(&f_f64, x);
    assert_relative_eq!(d.re, f_f64(x), max_relative = 1e-12);
    assert_relative_eq!(d.eps, expected_deriv, max_relative = tol);
}

// ── Arithmetic ──

#[test]
fn product_rule() {
    // (3 + ε)(4 + ε) = 12 + 7ε
    let a = Dual::new(3.0, 1.0);
    let b = Dual::new(4.0, 1.0);
    let c = a * b;
    assert_relative_eq!(c.re, 12.0);
    assert_relative_eq!(c.eps, 7.0);
}

#[test]
fn quotient_rule() {
    // d/dx (x / (x+1)) at x=2: 1/(x+1)^2 = 1/9
    let x = Dual::variable(2.0);
    let one = Dual::constant(1.0);
    let y = x / (x + one);
    assert_relative_eq!(y.re, 2.0 / 3.0, max_relative = 1e-12);
    assert_relative_eq!(y.eps, 1.0 / 9.0, max_relative = 1e-12);
}

#[test]
fn mixed_scalar_ops() {
    let x = Dual::<f64>::variable(3.0);
    let y = 2.0 * (x * 2.0 - 1.0) / 4.0 + 0.5;
    assert_relative_eq!(y.re, 3.0);
    assert_relative_eq!(y.eps, 1.0);
}

#[test]
fn compound_assignment() {
    let mut acc = Dual::<f64>::constant(1.0);
    let x = Dual::variable(2.0);
    acc += x;
    acc *= x;
    acc -= Dual::constant(1.0);
    acc /= x;
    // (x(1 + x) - 1)/x = 1 + x - 1/x
    assert_relative_eq!(acc.re, 2.5, max_relative = 1e-15);
    assert_relative_eq!(acc.eps, 1.25, max_relative = 1e-15);
}

// ── Elementals ──

#[test]
fn elementals_match_finite_differences() {
    for &x in &[0.3, 1.1, 2.7] {
        check_elemental(|d| d.sin(), f64::sin, x, 1e-7);
        check_elemental(|d| d.cos(), f64::cos, x, 1e-7);
        check_elemental(|d| d.tanh(), f64::tanh, x, 1e-6);
        check_elemental(|d| d.exp(), f64::exp, x, 1e-7);
        check_elemental(|d| d.ln(), f64::ln, x, 1e-7);
        check_elemental(|d| d.sqrt(), f64::sqrt, x, 1e-7);
        check_elemental(|d| d.recip(), f64::recip, x, 1e-7);
        check_elemental(|d| d.powi(3), |v| v.powi(3), x, 1e-7);
        check_elemental(|d| d.powi(-2), |v| v.powi(-2), x, 1e-7);
    }
}

#[test]
fn powi_zero_is_constant() {
    let y = Dual::variable(1.7_f64).powi(0);
    assert_eq!(y.re, 1.0);
    assert_eq!(y.eps, 0.0);
}

#[test]
fn abs_picks_branch() {
    let neg = Dual::new(-2.0_f64, 1.0).abs();
    assert_eq!((neg.re, neg.eps), (2.0, -1.0));
    let zero = Dual::new(0.0_f64, 1.0).abs();
    assert_eq!(zero.eps, 1.0);
}

// ── Generic code ──

/// Diffusion-like flux `(1 + u²)·g + u·sin(u)`.
fn flux<T: Scalar>(u: T, g: T) -> T {
    (T::one() + u * u) * g + u * u.sin()
}

#[test]
fn generic_code_runs_at_every_scalar() {
    let (u, g) = (0.4, -1.3);
    let plain = flux(u, g);

    let du = flux(Dual::variable(u), Dual::constant(g));
    assert_relative_eq!(du.re, plain, max_relative = 1e-15);
    assert_relative_eq!(du.eps, 2.0 * u * g + u.sin() + u * u.cos(), max_relative = 1e-14);

    let both = flux(DualVec::<f64, 2>::with_tangent(u, 0), DualVec::with_tangent(g, 1));
    assert_relative_eq!(both.re, plain, max_relative = 1e-15);
    assert_relative_eq!(both.eps[0], du.eps, max_relative = 1e-14);
    assert_relative_eq!(both.eps[1], 1.0 + u * u, max_relative = 1e-15);
}

#[test]
fn scalar_lifts_constants() {
    let c = <Dual64 as Scalar>::from_f(2.5);
    assert_eq!((c.re, c.eps), (2.5, 0.0));
    let n = <DualVec<f64, 3> as Scalar>::from_int(-4);
    assert_eq!(n.re, -4.0);
    assert!(n.eps.iter().all(|&e| e == 0.0));
    assert_eq!(Dual::new(1.5, 9.0).value(), 1.5);
}

// ── Drivers ──

fn model(x: &[f64; 3]) -> [f64; 2] {
    [x[0] * x[1] + x[2].exp(), x[1].sin() / (1.0 + x[0] * x[0])]
}

fn model_jacobian(x: &[f64; 3]) -> [[f64; 3]; 2] {
    let d = 1.0 + x[0] * x[0];
    [
        [x[1], x[0], x[2].exp()],
        [-2.0 * x[0] * x[1].sin() / (d * d), x[1].cos() / d, 0.0],
    ]
}

fn model_generic<T: Scalar>(x: &[T]) -> Vec<T> {
    vec![
        x[0] * x[1] + x[2].exp(),
        x[1].sin() / (T::one() + x[0] * x[0]),
    ]
}

#[test]
fn jacobian_drivers_agree_with_analytic() {
    let x = [0.7, -0.4, 0.2];
    let expected = model_jacobian(&x);
    let values = model(&x);

    let (v1, j1) = jacobian(|v| model_generic(v), &x);
    let (v2, j2) = jacobian_batched::<f64, 3>(|v| model_generic(v), &x);
    for i in 0..2 {
        assert_relative_eq!(v1[i], values[i], max_relative = 1e-15);
        assert_relative_eq!(v2[i], values[i], max_relative = 1e-15);
        for j in 0..3 {
            assert_relative_eq!(j1[i][j], expected[i][j], epsilon = 1e-14);
            assert_relative_eq!(j2[i][j], expected[i][j], epsilon = 1e-14);
        }
    }
}

#[test]
fn jvp_is_jacobian_times_direction() {
    let x = [0.7, -0.4, 0.2];
    let v = [1.0, 2.0, -0.5];
    let jac = model_jacobian(&x);
    let (_, jv) = jvp(|d| model_generic(d), &x, &v);
    for i in 0..2 {
        let expected: f64 = (0..3).map(|j| jac[i][j] * v[j]).sum();
        assert_relative_eq!(jv[i], expected, epsilon = 1e-14);
    }
}

#[test]
#[should_panic(expected = "must equal the lane count")]
fn batched_jacobian_checks_lane_count() {
    let _ = jacobian_batched::<f64, 2>(|v| model_generic(v), &[0.1, 0.2, 0.3]);
}
