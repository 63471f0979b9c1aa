//! Finite-difference and consistency checks for user-supplied operators.
//!
//! Finite-difference tables use steps `h = 1, 0.1, …, 10^{-(steps-1)}`. A
//! correct derivative shows the error falling linearly with `h` until
//! round-off takes over.

use tangent::Float;
use tracing::debug;

use crate::constraint::EqualityConstraintSimOpt;
use crate::error::Result;
use crate::objective::Objective;
use crate::vector::Vector;

pub use crate::vector::check_vector;

/// One row of a finite-difference table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivativeCheck<F> {
    /// Finite-difference step.
    pub step: F,
    /// Analytic quantity (a directional derivative or the norm of a product).
    pub exact: F,
    /// Its finite-difference counterpart.
    pub approx: F,
    /// Absolute error between the two (a norm for vector quantities).
    pub error: F,
}

fn fd_steps<F: Float>(steps: usize) -> impl Iterator<Item = F> {
    let tenth = F::lit(0.1);
    (0..steps).scan(F::one(), move |h, _| {
        let cur = *h;
        *h = cur * tenth;
        Some(cur)
    })
}

fn distance<F: Float, V: Vector<F>>(a: &V, b: &V) -> F {
    let mut d = a.clone();
    d.axpy(-F::one(), b);
    d.norm()
}

/// Compare `⟨∇f(x), d⟩` with `(f(x + hd) − f(x))/h`.
pub fn check_gradient<F, V, O>(
    obj: &mut O,
    x: &V,
    d: &V,
    steps: usize,
) -> Result<Vec<DerivativeCheck<F>>>
where
    F: Float,
    V: Vector<F>,
    O: Objective<F, V>,
{
    let f0 = obj.value(x)?;
    let mut g = x.clone();
    obj.gradient(&mut g, x)?;
    let exact = g.dot(d);

    let mut xh = x.clone();
    let mut rows = Vec::with_capacity(steps);
    for h in fd_steps(steps) {
        xh.set(x);
        xh.axpy(h, d);
        let approx = (obj.value(&xh)? - f0) / h;
        let error = (approx - exact).abs();
        debug!(h = ?h.to_f64(), error = ?error.to_f64(), "gradient check");
        rows.push(DerivativeCheck {
            step: h,
            exact,
            approx,
            error,
        });
    }
    Ok(rows)
}

/// Compare `∇²f(x)·v` with `(∇f(x + hv) − ∇f(x))/h`.
pub fn check_hess_vec<F, V, O>(
    obj: &mut O,
    x: &V,
    v: &V,
    steps: usize,
) -> Result<Vec<DerivativeCheck<F>>>
where
    F: Float,
    V: Vector<F>,
    O: Objective<F, V>,
{
    let mut g0 = x.clone();
    obj.gradient(&mut g0, x)?;
    let mut hv = x.clone();
    obj.hess_vec(&mut hv, v, x)?;

    let mut xh = x.clone();
    let mut gh = x.clone();
    let mut rows = Vec::with_capacity(steps);
    for h in fd_steps(steps) {
        xh.set(x);
        xh.axpy(h, v);
        obj.gradient(&mut gh, &xh)?;
        gh.axpy(-F::one(), &g0);
        gh.scale(h.recip());
        let error = distance(&gh, &hv);
        debug!(h = ?h.to_f64(), error = ?error.to_f64(), "hess_vec check");
        rows.push(DerivativeCheck {
            step: h,
            exact: hv.norm(),
            approx: gh.norm(),
            error,
        });
    }
    // Leave the objective at x.
    obj.value(x)?;
    Ok(rows)
}

fn check_apply_jacobian<F, V, C>(
    con: &mut C,
    u: &V,
    z: &V,
    v: &V,
    steps: usize,
    state_block: bool,
) -> Vec<DerivativeCheck<F>>
where
    F: Float,
    V: Vector<F>,
    C: EqualityConstraintSimOpt<F, V>,
{
    con.update(u, z);
    let mut jv = u.clone();
    if state_block {
        con.apply_jacobian_1(&mut jv, v, u, z);
    } else {
        con.apply_jacobian_2(&mut jv, v, u, z);
    }

    let mut ch = u.clone();
    let mut cm = u.clone();
    let base = if state_block { u } else { z };
    let mut pert = base.clone();
    let mut rows = Vec::with_capacity(steps);
    for h in fd_steps(steps) {
        for (sign, out) in [(F::one(), &mut ch), (-F::one(), &mut cm)] {
            pert.set(base);
            pert.axpy(sign * h, v);
            if state_block {
                con.value(out, &pert, z);
            } else {
                con.value(out, u, &pert);
            }
        }
        ch.axpy(-F::one(), &cm);
        ch.scale((h + h).recip());
        rows.push(DerivativeCheck {
            step: h,
            exact: jv.norm(),
            approx: ch.norm(),
            error: distance(&ch, &jv),
        });
    }
    rows
}

/// Compare `c_u·v` with `(c(u + hv, z) − c(u − hv, z))/2h`. Linearizes `con` at `(u, z)`.
pub fn check_apply_jacobian_1<F, V, C>(
    con: &mut C,
    u: &V,
    z: &V,
    v: &V,
    steps: usize,
) -> Vec<DerivativeCheck<F>>
where
    F: Float,
    V: Vector<F>,
    C: EqualityConstraintSimOpt<F, V>,
{
    check_apply_jacobian(con, u, z, v, steps, true)
}

/// Compare `c_z·v` with `(c(u, z + hv) − c(u, z − hv))/2h`. Linearizes `con` at `(u, z)`.
pub fn check_apply_jacobian_2<F, V, C>(
    con: &mut C,
    u: &V,
    z: &V,
    v: &V,
    steps: usize,
) -> Vec<DerivativeCheck<F>>
where
    F: Float,
    V: Vector<F>,
    C: EqualityConstraintSimOpt<F, V>,
{
    check_apply_jacobian(con, u, z, v, steps, false)
}

/// `|⟨c_u v, w⟩ − ⟨v, c_uᵀ w⟩|`.
pub fn check_adjoint_consistency_1<F, V, C>(con: &mut C, w: &V, v: &V, u: &V, z: &V) -> F
where
    F: Float,
    V: Vector<F>,
    C: EqualityConstraintSimOpt<F, V>,
{
    con.update(u, z);
    let mut jv = v.clone();
    con.apply_jacobian_1(&mut jv, v, u, z);
    let mut ajw = w.clone();
    con.apply_adjoint_jacobian_1(&mut ajw, w, u, z);
    (jv.dot(w) - v.dot(&ajw)).abs()
}

/// `|⟨c_z v, w⟩ − ⟨v, c_zᵀ w⟩|`.
pub fn check_adjoint_consistency_2<F, V, C>(con: &mut C, w: &V, v: &V, u: &V, z: &V) -> F
where
    F: Float,
    V: Vector<F>,
    C: EqualityConstraintSimOpt<F, V>,
{
    con.update(u, z);
    let mut jv = v.clone();
    con.apply_jacobian_2(&mut jv, v, u, z);
    let mut ajw = w.clone();
    con.apply_adjoint_jacobian_2(&mut ajw, w, u, z);
    (jv.dot(w) - v.dot(&ajw)).abs()
}

/// `‖c_u c_u⁻¹ v − v‖`.
pub fn check_inverse_jacobian_1<F, V, C>(con: &mut C, v: &V, u: &V, z: &V) -> Result<F>
where
    F: Float,
    V: Vector<F>,
    C: EqualityConstraintSimOpt<F, V>,
{
    con.update(u, z);
    let mut x = v.clone();
    con.apply_inverse_jacobian_1(&mut x, v, u, z)?;
    let mut jx = v.clone();
    con.apply_jacobian_1(&mut jx, &x, u, z);
    Ok(distance(&jx, v))
}

/// `‖c_uᵀ c_u⁻ᵀ v − v‖`.
pub fn check_inverse_adjoint_jacobian_1<F, V, C>(con: &mut C, v: &V, u: &V, z: &V) -> Result<F>
where
    F: Float,
    V: Vector<F>,
    C: EqualityConstraintSimOpt<F, V>,
{
    con.update(u, z);
    let mut x = v.clone();
    con.apply_inverse_adjoint_jacobian_1(&mut x, v, u, z)?;
    let mut jx = v.clone();
    con.apply_adjoint_jacobian_1(&mut jx, &x, u, z);
    Ok(distance(&jx, v))
}
