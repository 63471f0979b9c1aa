use std::fmt::{self, Display};

use num_traits::{One, Zero};

use crate::Scalar;

/// Forward-mode dual number: a value paired with its tangent (derivative).
///
/// `Dual { re, eps }` represents `re + eps·ε` where `ε² = 0`.
///
/// The component type is any [`Scalar`], including another `Dual`, so
/// `Dual<Dual<f64>>` carries the second derivative in `eps.eps`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Dual<T: Scalar> {
    /// Primal (real) value.
    pub re: T,
    /// Tangent (derivative) value.
    pub eps: T,
}

impl<T: Scalar> Display for Dual<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} + {}ε", self.re, self.eps)
    }
}

impl<T: Scalar> From<T> for Dual<T> {
    #[inline]
    fn from(val: T) -> Self {
        Dual::constant(val)
    }
}

impl<T: Scalar> Dual<T> {
    /// Create a new dual number.
    #[inline]
    pub fn new(re: T, eps: T) -> Self {
        Dual { re, eps }
    }

    /// Create a constant (zero derivative).
    #[inline]
    pub fn constant(re: T) -> Self {
        Dual { re, eps: T::zero() }
    }

    /// Create a variable (unit derivative) for differentiation.
    #[inline]
    pub fn variable(re: T) -> Self {
        Dual { re, eps: T::one() }
    }

    /// Apply the chain rule: given `f(self.re)` and `f'(self.re)`, produce the dual result.
    #[inline]
    fn chain(self, f_val: T, f_deriv: T) -> Self {
        Dual {
            re: f_val,
            eps: self.eps * f_deriv,
        }
    }

    // ── Powers ──

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
            return Dual::constant(T::one());
        }
        let deriv = T::from_int(n) * self.re.powi(n - 1);
        self.chain(self.re.powi(n), deriv)
    }

    // ── Exp/Log ──

    #[inline]
    pub fn exp(self) -> Self {
        let e = self.re.exp();
        self.chain(e, e)
    }

    #[inline]
    pub fn ln(self) -> Self {
        self.chain(self.re.ln(), self.re.recip())
    }

    // ── Trig ──

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

    // ── Misc ──

    /// Absolute value. The derivative at zero is taken as `+1`.
    #[inline]
    pub fn abs(self) -> Self {
        if self.re.value() < <T::Float as Zero>::zero() {
            -self
        } else {
            self
        }
    }
}

impl<T: Scalar> Zero for Dual<T> {
    #[inline]
    fn zero() -> Self {
        Dual::constant(T::zero())
    }

    #[inline]
    fn is_zero(&self) -> bool {
        self.re.is_zero() && self.eps.is_zero()
    }
}

impl<T: Scalar> One for Dual<T> {
    #[inline]
    fn one() -> Self {
        Dual::constant(T::one())
    }
}
