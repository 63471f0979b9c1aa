//! Batched forward-mode dual numbers with `N` tangent lanes.
//!
//! [`DualVec<T, N>`] carries `N` independent tangent directions at once. With
//! one lane per basis function of a cell, a single residual evaluation yields
//! the full element Jacobian. With `T = Dual<F>` each lane is itself a dual
//! number, so the lanes pick up a directional derivative of the Jacobian
//! (forward-over-forward second derivatives).

use std::fmt::{self, Display};

use num_traits::{One, Zero};

use crate::Scalar;

/// Batched forward-mode dual number: a value with N tangent lanes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DualVec<T: Scalar, const N: usize> {
    /// Primal (real) value.
    pub re: T,
    /// Tangent (derivative) values, one per lane.
    pub eps: [T; N],
}

impl<T: Scalar, const N: usize> Default for DualVec<T, N> {
    fn default() -> Self {
        DualVec::constant(T::zero())
    }
}

impl<T: Scalar, const N: usize> Display for DualVec<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.re)?;
        for (i, e) in self.eps.iter().enumerate() {
            write!(f, " + {}\u{03b5}{}", e, i)?;
        }
        Ok(())
    }
}

impl<T: Scalar, const N: usize> From<T> for DualVec<T, N> {
    #[inline]
    fn from(val: T) -> Self {
        DualVec::constant(val)
    }
}

impl<T: Scalar, const N: usize> DualVec<T, N> {
    /// Create a new batched dual number.
    #[inline]
    pub fn new(re: T, eps: [T; N]) -> Self {
        DualVec { re, eps }
    }

    /// Create a constant (zero derivatives in all lanes).
    #[inline]
    pub fn constant(re: T) -> Self {
        DualVec {
            re,
            eps: [T::zero(); N],
        }
    }

    /// Create a variable with unit derivative in lane `lane` and zero elsewhere.
    ///
    /// # Panics
    ///
    /// Panics if `lane >= N`.
    #[inline]
    pub fn with_tangent(re: T, lane: usize) -> Self {
        assert!(lane < N, "lane {} out of range for {} lanes", lane, N);
        DualVec {
            re,
            eps: std::array::from_fn(|k| if k == lane { T::one() } else { T::zero() }),
        }
    }

    /// Apply the chain rule lane by lane.
    #[inline(always)]
    fn chain(self, f_val: T, f_deriv: T) -> Self {
        DualVec {
            re: f_val,
            eps: std::array::from_fn(|k| self.eps[k] * f_deriv),
        }
    }

    // -- Powers --

    #[inline]
    pub fn recip(self) -> Self {
        let inv = self.re.recip();
        self.chain(inv, -(inv * inv))
    }

    #[inline]
    pub fn sqrt(self) -> Self {
        let s = self.re.sqrt();
        self.chain(s, (s + s).recip())
    }

    #[inline]
    pub fn powi(self, n: i32) -> Self {
        if n == 0 {
            return DualVec::constant(T::one());
        }
        let deriv = T::from_int(n) * self.re.powi(n - 1);
        self.chain(self.re.powi(n), deriv)
    }

    // -- Exp/Log --

    #[inline]
    pub fn exp(self) -> Self {
        let e = self.re.exp();
        self.chain(e, e)
    }

    #[inline]
    pub fn ln(self) -> Self {
        self.chain(self.re.ln(), self.re.recip())
    }

    // -- Trig --

    #[inline]
    pub fn sin(self) -> Self {
        self.chain(self.re.sin(), self.re.cos())
    }

    #[inline]
    pub fn cos(self) -> Self {
        self.chain(self.re.cos(), -self.re.sin())
    }

    #[inline]
    pub fn tanh(self) -> Self {
        let t = self.re.tanh();
        self.chain(t, T::one() - t * t)
    }

    // -- Misc --

    #[inline]
    pub fn abs(self) -> Self {
        if self.re.value() < <T::Float as Zero>::zero() {
            -self
        } else {
            self
        }
    }
}

impl<T: Scalar, const N: usize> Zero for DualVec<T, N> {
    #[inline]
    fn zero() -> Self {
        DualVec::constant(T::zero())
    }

    #[inline]
    fn is_zero(&self) -> bool {
        self.re.is_zero() && self.eps.iter().all(Zero::is_zero)
    }
}

impl<T: Scalar, const N: usize> One for DualVec<T, N> {
    #[inline]
    fn one() -> Self {
        DualVec::constant(T::one())
    }
}
