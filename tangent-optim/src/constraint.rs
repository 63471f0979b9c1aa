//! Equality constraint `c(u, z) = 0` and its derivative operators.
//!
//! [`BvpConstraint`] never differentiates by hand. Element Jacobians come from
//! one residual evaluation at `DualVec<F, N>` with one lane per local field.
//! Adjoint Hessians come from one evaluation at `DualVec<Dual<F>, N>`: the
//! inner `Dual` carries the direction, the lanes carry the per-field sweep.

use std::sync::Arc;

use num_traits::Zero;
use tangent::{Dual, DualVec, Float, Scalar};
use tracing::{debug, warn};

use crate::coefficient::{Coefficient, CoefficientParams};
use crate::discretization::Discretization;
use crate::error::{OptimError, Result};
use crate::linalg::{mat_vec, mat_vec_transpose, EquilibratedLu};
use crate::residual::Residual;
use crate::vector::{check_dim, FlatVector, Vector};

/// Constraint `c(u, z)` with derivatives in the state block (`_1`) and the
/// control block (`_2`).
///
/// Outputs are zeroed before being written. Methods that may refresh a cached
/// linearization take `&mut self`.
pub trait EqualityConstraintSimOpt<F: Float, V: Vector<F>> {
    /// Linearize at `(u, z)`.
    fn update(&mut self, u: &V, z: &V);

    /// `c ← c(u, z)`.
    fn value(&self, c: &mut V, u: &V, z: &V);

    /// `jv ← c_u·v`.
    fn apply_jacobian_1(&mut self, jv: &mut V, v: &V, u: &V, z: &V);

    /// `jv ← c_z·v`.
    fn apply_jacobian_2(&mut self, jv: &mut V, v: &V, u: &V, z: &V);

    /// `ajv ← c_uᵀ·v`.
    fn apply_adjoint_jacobian_1(&mut self, ajv: &mut V, v: &V, u: &V, z: &V);

    /// `ajv ← c_zᵀ·v`.
    fn apply_adjoint_jacobian_2(&mut self, ajv: &mut V, v: &V, u: &V, z: &V);

    /// `ijv ← c_u⁻¹·v`.
    fn apply_inverse_jacobian_1(&mut self, ijv: &mut V, v: &V, u: &V, z: &V) -> Result<()>;

    /// `iajv ← c_u⁻ᵀ·v`.
    fn apply_inverse_adjoint_jacobian_1(
        &mut self,
        iajv: &mut V,
        v: &V,
        u: &V,
        z: &V,
    ) -> Result<()>;

    /// `ahwv ← ∂_u[c_uᵀw]·v`.
    fn apply_adjoint_hessian_11(&self, ahwv: &mut V, w: &V, v: &V, u: &V, z: &V);

    /// `ahwv ← ∂_u[c_zᵀw]·v`: state direction, control output.
    fn apply_adjoint_hessian_12(&self, ahwv: &mut V, w: &V, v: &V, u: &V, z: &V);

    /// `ahwv ← ∂_z[c_uᵀw]·v`: control direction, state output.
    fn apply_adjoint_hessian_21(&self, ahwv: &mut V, w: &V, v: &V, u: &V, z: &V);

    /// `ahwv ← ∂_z[c_zᵀw]·v`.
    fn apply_adjoint_hessian_22(&self, ahwv: &mut V, w: &V, v: &V, u: &V, z: &V);

    /// Solve `c(u, z) = 0` for `u`, starting from the incoming `u`.
    ///
    /// Returns the number of Newton iterations and leaves the operator
    /// linearized at the solution.
    fn solve(&mut self, u: &mut V, z: &V) -> Result<usize>;
}

/// Newton iteration parameters for the state equation.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StateSolveParams<F> {
    /// Maximum Newton iterations (default: 25).
    pub max_iter: usize,
    /// Absolute residual tolerance (default: 1e-12).
    pub abs_tol: F,
    /// Tolerance relative to the initial residual norm (default: 1e-10).
    pub rel_tol: F,
}

impl Default for StateSolveParams<f64> {
    fn default() -> Self {
        StateSolveParams {
            max_iter: 25,
            abs_tol: 1e-12,
            rel_tol: 1e-10,
        }
    }
}

impl Default for StateSolveParams<f32> {
    fn default() -> Self {
        StateSolveParams {
            max_iter: 25,
            abs_tol: 1e-5,
            rel_tol: 1e-4,
        }
    }
}

/// Configuration of a [`BvpConstraint`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstraintConfig<F> {
    /// Re-linearize on every Jacobian or inverse call instead of using the
    /// blocks of the last [`update`](EqualityConstraintSimOpt::update)
    /// (default: false).
    pub eager_update: bool,
    /// Smallest acceptable pivot of the equilibrated state Jacobian
    /// (default: 1e-12).
    pub pivot_tol: F,
    pub solve: StateSolveParams<F>,
}

impl Default for ConstraintConfig<f64> {
    fn default() -> Self {
        ConstraintConfig {
            eager_update: false,
            pivot_tol: 1e-12,
            solve: StateSolveParams::default(),
        }
    }
}

impl Default for ConstraintConfig<f32> {
    fn default() -> Self {
        ConstraintConfig {
            eager_update: false,
            pivot_tol: 1e-6,
            solve: StateSolveParams::default(),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Block {
    State,
    Control,
}

/// Residual of the nonlinear boundary value problem as an equality
/// constraint, with dense Jacobian blocks cached between updates.
pub struct BvpConstraint<F, D, C, const N: usize> {
    residual: Residual<F, D, C, N>,
    ju: Vec<Vec<F>>,
    jz: Vec<Vec<F>>,
    config: ConstraintConfig<F>,
    linearized: bool,
}

impl<F, D, C, const N: usize> BvpConstraint<F, D, C, N>
where
    F: Float,
    D: Discretization<F, N>,
    C: Coefficient<F>,
{
    pub fn new(
        disc: Arc<D>,
        coeff: C,
        params: CoefficientParams<F>,
        config: ConstraintConfig<F>,
    ) -> Result<Self> {
        if !(config.pivot_tol > F::zero()) {
            return Err(OptimError::invalid_params(format!(
                "pivot tolerance must be positive, got {}",
                config.pivot_tol
            )));
        }
        if config.solve.max_iter == 0 {
            return Err(OptimError::invalid_params("state solve needs max_iter >= 1"));
        }
        let n = disc.num_dofs();
        Ok(BvpConstraint {
            residual: Residual::new(disc, coeff, params),
            ju: vec![vec![F::zero(); n]; n],
            jz: vec![vec![F::zero(); n]; n],
            config,
            linearized: false,
        })
    }

    pub fn num_dofs(&self) -> usize {
        self.residual.discretization().num_dofs()
    }

    pub fn residual(&self) -> &Residual<F, D, C, N> {
        &self.residual
    }

    pub fn config(&self) -> &ConstraintConfig<F> {
        &self.config
    }

    /// Whether [`update`](EqualityConstraintSimOpt::update) has run.
    pub fn is_linearized(&self) -> bool {
        self.linearized
    }

    /// Cached `c_u`, row-major.
    pub fn jacobian_1(&self) -> &[Vec<F>] {
        &self.ju
    }

    /// Cached `c_z`, row-major.
    pub fn jacobian_2(&self) -> &[Vec<F>] {
        &self.jz
    }

    fn check_point<V: FlatVector<F>>(&self, u: &V, z: &V) {
        let n = self.num_dofs();
        check_dim(u, n, "state");
        check_dim(z, n, "control");
    }

    /// Zero both blocks and accumulate the element Jacobians at `(u, z)`.
    fn assemble(&mut self, u: &[F], z: &[F]) {
        let res = &self.residual;
        let disc = res.discretization().clone();

        let u_plain = res.gather(u, |_, _, x| DualVec::<F, N>::constant(x));
        let z_plain = res.gather(z, |_, _, x| DualVec::<F, N>::constant(x));
        let u_tagged = res.gather(u, |_, f, x| DualVec::<F, N>::with_tangent(x, f));
        let z_tagged = res.gather(z, |_, f, x| DualVec::<F, N>::with_tangent(x, f));

        let du = res.evaluate(&u_tagged, &z_plain);
        let dz = res.evaluate(&u_plain, &z_tagged);

        for row in self.ju.iter_mut().chain(self.jz.iter_mut()) {
            row.fill(F::zero());
        }
        for cell in 0..disc.num_cells() {
            for r in 0..N {
                let i = disc.dof(cell, r);
                for k in 0..N {
                    let j = disc.dof(cell, k);
                    self.ju[i][j] += du[cell][r].eps[k];
                    self.jz[i][j] += dz[cell][r].eps[k];
                }
            }
        }
        self.linearized = true;
    }

    /// Refresh the blocks in eager mode; flag stale use otherwise.
    fn prepare<V: FlatVector<F>>(&mut self, u: &V, z: &V) {
        self.check_point(u, z);
        if self.config.eager_update {
            self.assemble(u.as_slice(), z.as_slice());
        } else if !self.linearized {
            warn!("constraint Jacobian used before update; blocks are zero");
        }
    }

    fn apply_block<V: FlatVector<F>>(
        &mut self,
        out: &mut V,
        v: &V,
        u: &V,
        z: &V,
        block: Block,
        transpose: bool,
    ) {
        self.prepare(u, z);
        let n = self.num_dofs();
        check_dim(v, n, "direction");
        check_dim(out, n, "output");
        let j = match block {
            Block::State => &self.ju,
            Block::Control => &self.jz,
        };
        if transpose {
            mat_vec_transpose(j, v.as_slice(), out.as_mut_slice());
        } else {
            mat_vec(j, v.as_slice(), out.as_mut_slice());
        }
    }

    fn inverse_state<V: FlatVector<F>>(
        &mut self,
        out: &mut V,
        v: &V,
        u: &V,
        z: &V,
        transpose: bool,
    ) -> Result<()> {
        self.prepare(u, z);
        let n = self.num_dofs();
        check_dim(v, n, "right-hand side");
        check_dim(out, n, "output");
        // The factorization works on a copy, so the cached block survives.
        let lu = EquilibratedLu::factor(&self.ju, self.config.pivot_tol)?;
        let x = if transpose {
            lu.solve_transpose(v.as_slice())?
        } else {
            lu.solve(v.as_slice())?
        };
        out.as_mut_slice().copy_from_slice(&x);
        Ok(())
    }

    /// `ahwv ← ∂_a[(∂c/∂b)ᵀw]·v`, evaluated at `(u, z)` regardless of the cache.
    #[allow(clippy::too_many_arguments)]
    fn adjoint_hessian<V: FlatVector<F>>(
        &self,
        ahwv: &mut V,
        w: &V,
        v: &V,
        u: &V,
        z: &V,
        direction: Block,
        sweep: Block,
    ) {
        self.check_point(u, z);
        let n = self.num_dofs();
        check_dim(w, n, "multiplier");
        check_dim(v, n, "direction");
        check_dim(ahwv, n, "output");

        let res = &self.residual;
        let disc = &**res.discretization();
        let vs = v.as_slice();
        let seed_block = move |block: Block| {
            move |cell: usize, f: usize, x: F| -> DualVec<Dual<F>, N> {
                let re = if block == direction {
                    Dual::new(x, vs[disc.dof(cell, f)])
                } else {
                    Dual::constant(x)
                };
                if block == sweep {
                    DualVec::with_tangent(re, f)
                } else {
                    DualVec::constant(re)
                }
            }
        };
        let uc = res.gather(u.as_slice(), seed_block(Block::State));
        let zc = res.gather(z.as_slice(), seed_block(Block::Control));
        let cells = res.evaluate(&uc, &zc);

        let ws = w.as_slice();
        let out = ahwv.as_mut_slice();
        out.fill(F::zero());
        for (cell, c) in cells.iter().enumerate() {
            let mut wc = DualVec::<Dual<F>, N>::zero();
            for (r, cr) in c.iter().enumerate() {
                wc += *cr * DualVec::<Dual<F>, N>::from_f(ws[disc.dof(cell, r)]);
            }
            for f in 0..N {
                out[disc.dof(cell, f)] += wc.eps[f].eps;
            }
        }
    }
}

impl<F, V, D, C, const N: usize> EqualityConstraintSimOpt<F, V> for BvpConstraint<F, D, C, N>
where
    F: Float,
    V: FlatVector<F>,
    D: Discretization<F, N>,
    C: Coefficient<F>,
{
    fn update(&mut self, u: &V, z: &V) {
        self.check_point(u, z);
        self.assemble(u.as_slice(), z.as_slice());
    }

    fn value(&self, c: &mut V, u: &V, z: &V) {
        self.check_point(u, z);
        check_dim(c, self.num_dofs(), "residual");
        self.residual
            .value(u.as_slice(), z.as_slice(), c.as_mut_slice());
    }

    fn apply_jacobian_1(&mut self, jv: &mut V, v: &V, u: &V, z: &V) {
        self.apply_block(jv, v, u, z, Block::State, false);
    }

    fn apply_jacobian_2(&mut self, jv: &mut V, v: &V, u: &V, z: &V) {
        self.apply_block(jv, v, u, z, Block::Control, false);
    }

    fn apply_adjoint_jacobian_1(&mut self, ajv: &mut V, v: &V, u: &V, z: &V) {
        self.apply_block(ajv, v, u, z, Block::State, true);
    }

    fn apply_adjoint_jacobian_2(&mut self, ajv: &mut V, v: &V, u: &V, z: &V) {
        self.apply_block(ajv, v, u, z, Block::Control, true);
    }

    fn apply_inverse_jacobian_1(&mut self, ijv: &mut V, v: &V, u: &V, z: &V) -> Result<()> {
        self.inverse_state(ijv, v, u, z, false)
    }

    fn apply_inverse_adjoint_jacobian_1(
        &mut self,
        iajv: &mut V,
        v: &V,
        u: &V,
        z: &V,
    ) -> Result<()> {
        self.inverse_state(iajv, v, u, z, true)
    }

    fn apply_adjoint_hessian_11(&self, ahwv: &mut V, w: &V, v: &V, u: &V, z: &V) {
        self.adjoint_hessian(ahwv, w, v, u, z, Block::State, Block::State);
    }

    fn apply_adjoint_hessian_12(&self, ahwv: &mut V, w: &V, v: &V, u: &V, z: &V) {
        self.adjoint_hessian(ahwv, w, v, u, z, Block::State, Block::Control);
    }

    fn apply_adjoint_hessian_21(&self, ahwv: &mut V, w: &V, v: &V, u: &V, z: &V) {
        self.adjoint_hessian(ahwv, w, v, u, z, Block::Control, Block::State);
    }

    fn apply_adjoint_hessian_22(&self, ahwv: &mut V, w: &V, v: &V, u: &V, z: &V) {
        self.adjoint_hessian(ahwv, w, v, u, z, Block::Control, Block::Control);
    }

    fn solve(&mut self, u: &mut V, z: &V) -> Result<usize> {
        let params = self.config.solve.clone();
        newton_solve(self, u, z, &params)
    }
}

/// Newton's method for `c(u, z) = 0` in `u`: `u ← u − c_u⁻¹c(u, z)` until
/// `‖c‖ ≤ abs_tol + rel_tol·‖c₀‖`.
///
/// The constraint is updated at every iterate, so the caller's
/// linearization mode does not matter; on success it is left linearized
/// at the returned `u`.
pub fn newton_solve<F, V, C>(
    con: &mut C,
    u: &mut V,
    z: &V,
    params: &StateSolveParams<F>,
) -> Result<usize>
where
    F: Float,
    V: Vector<F>,
    C: EqualityConstraintSimOpt<F, V> + ?Sized,
{
    let mut c = u.clone();
    let mut s = u.clone();
    con.value(&mut c, u, z);
    let r0 = c.norm();
    let tol = params.abs_tol + params.rel_tol * r0;
    let mut rnorm = r0;

    for iter in 0..params.max_iter {
        if rnorm <= tol {
            con.update(u, z);
            debug!(iter, residual = ?rnorm.to_f64(), "state solve converged");
            return Ok(iter);
        }
        con.update(u, z);
        con.apply_inverse_jacobian_1(&mut s, &c, u, z)?;
        u.axpy(-F::one(), &s);
        con.value(&mut c, u, z);
        rnorm = c.norm();
        if !rnorm.is_finite() {
            warn!(iter, "state solve diverged");
            return Err(OptimError::NonFinite);
        }
        debug!(iter, residual = ?rnorm.to_f64(), "newton step");
    }

    if rnorm <= tol {
        con.update(u, z);
        return Ok(params.max_iter);
    }
    let residual = rnorm.to_f64().unwrap_or(f64::NAN);
    warn!(iterations = params.max_iter, residual, "state solve did not converge");
    Err(OptimError::StateSolveFailed {
        iterations: params.max_iter,
        residual,
    })
}
