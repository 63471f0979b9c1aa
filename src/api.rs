use crate::dual::Dual;
use crate::dual_vec::DualVec;
use crate::float::Float;

/// Jacobian-vector product (forward mode): `(f(x), J·v)`.
///
/// Evaluates `f` at `x` and computes the directional derivative in direction `v`.
///
/// ```
/// let (y, jv) = tangent::jvp(|x| vec![x[0] * x[1]], &[2.0, 3.0], &[1.0, 0.0]);
/// assert_eq!(y[0], 6.0);
/// assert_eq!(jv[0], 3.0);
/// ```
pub fn jvp<F: Float>(f: impl Fn(&[Dual<F>]) -> Vec<Dual<F>>, x: &[F], v: &[F]) -> (Vec<F>, Vec<F>) {
    assert_eq!(x.len(), v.len(), "x and v must have the same length");
    let inputs: Vec<Dual<F>> = x
        .iter()
        .zip(v.iter())
        .map(|(&xi, &vi)| Dual::new(xi, vi))
        .collect();
    let outputs = f(&inputs);
    let values = outputs.iter().map(|d| d.re).collect();
    let tangents = outputs.iter().map(|d| d.eps).collect();
    (values, tangents)
}

/// Compute the full Jacobian of `f : R^n → R^m` using forward mode.
///
/// Returns `(f(x), J)` where `J[i][j] = ∂f_i/∂x_j`. One forward pass per input.
pub fn jacobian<F: Float>(
    f: impl Fn(&[Dual<F>]) -> Vec<Dual<F>>,
    x: &[F],
) -> (Vec<F>, Vec<Vec<F>>) {
    let n = x.len();

    let const_inputs: Vec<Dual<F>> = x.iter().map(|&xi| Dual::constant(xi)).collect();
    let const_outputs = f(&const_inputs);
    let m = const_outputs.len();
    let values: Vec<F> = const_outputs.iter().map(|d| d.re).collect();

    let mut jac = vec![vec![F::zero(); n]; m];
    for j in 0..n {
        let inputs: Vec<Dual<F>> = x
            .iter()
            .enumerate()
            .map(|(k, &xk)| {
                if k == j {
                    Dual::variable(xk)
                } else {
                    Dual::constant(xk)
                }
            })
            .collect();
        let outputs = f(&inputs);
        for (row, out) in jac.iter_mut().zip(outputs.iter()) {
            row[j] = out.eps;
        }
    }

    (values, jac)
}

/// Compute the full Jacobian in a single forward pass with `N` tangent lanes.
///
/// `N` must equal `x.len()`.
pub fn jacobian_batched<F: Float, const N: usize>(
    f: impl Fn(&[DualVec<F, N>]) -> Vec<DualVec<F, N>>,
    x: &[F],
) -> (Vec<F>, Vec<Vec<F>>) {
    assert_eq!(
        x.len(),
        N,
        "x length ({}) must equal the lane count ({})",
        x.len(),
        N
    );
    let inputs: Vec<DualVec<F, N>> = x
        .iter()
        .enumerate()
        .map(|(k, &xk)| DualVec::with_tangent(xk, k))
        .collect();
    let outputs = f(&inputs);
    let values = outputs.iter().map(|d| d.re).collect();
    let jac = outputs.iter().map(|d| d.eps.to_vec()).collect();
    (values, jac)
}

/// Hessian-vector product by forward-over-forward differentiation.
///
/// Returns `(∇f(x), H(x)·v)`. Component `i` uses an inner tag on `x_i` and an
/// outer tag along `v`, so `n` passes give the full product exactly.
pub fn hvp<F: Float>(f: impl Fn(&[Dual<Dual<F>>]) -> Dual<Dual<F>>, x: &[F], v: &[F]) -> (Vec<F>, Vec<F>) {
    assert_eq!(x.len(), v.len(), "x and v must have the same length");
    let n = x.len();
    let mut grad = vec![F::zero(); n];
    let mut hv = vec![F::zero(); n];

    for i in 0..n {
        let inputs: Vec<Dual<Dual<F>>> = (0..n)
            .map(|k| {
                let inner = if k == i { F::one() } else { F::zero() };
                // re carries the inner tag on x_i, eps the outer tag along v
                Dual::new(Dual::new(x[k], inner), Dual::new(v[k], F::zero()))
            })
            .collect();
        let out = f(&inputs);
        grad[i] = out.re.eps;
        hv[i] = out.eps.eps;
    }

    (grad, hv)
}
