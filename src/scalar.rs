//! The [`Scalar`] trait for writing AD-generic numeric code.
//!
//! Functions written as `fn f<T: Scalar>(x: T) -> T` work unchanged with plain
//! `f64`, `Dual<f64>`, `DualVec<f64, N>`, and nested towers such as
//! `DualVec<Dual<f64>, N>`. Nesting is what gives exact second derivatives:
//! the outer tag differentiates whatever the inner tag already carries.

use std::fmt::{Debug, Display};
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use num_traits::{One, Zero};

use crate::dual::Dual;
use crate::dual_vec::DualVec;
use crate::float::Float;

/// The central trait for AD-generic numeric code.
///
/// Only the operations a constitutive model or a finite-element residual
/// actually needs are part of the contract, so the trait can be implemented
/// recursively for every dual type whose component type is itself a `Scalar`.
pub trait Scalar:
    Copy
    + Default
    + Debug
    + Display
    + Send
    + Sync
    + 'static
    + Zero
    + One
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
    + DivAssign
{
    /// The underlying primitive float type.
    type Float: Float;

    /// Lift a plain float to this scalar (constant, zero derivative).
    fn from_f(val: Self::Float) -> Self;

    /// Lift a small integer to this scalar (constant, zero derivative).
    fn from_int(n: i32) -> Self;

    /// Extract the primal value.
    fn value(&self) -> Self::Float;

    fn recip(self) -> Self;
    fn sqrt(self) -> Self;
    fn powi(self, n: i32) -> Self;
    fn exp(self) -> Self;
    fn ln(self) -> Self;
    fn sin(self) -> Self;
    fn cos(self) -> Self;
    fn tanh(self) -> Self;
    fn abs(self) -> Self;
}

macro_rules! impl_scalar_primitive {
    ($f:ty) => {
        impl Scalar for $f {
            type Float = $f;

            #[inline]
            fn from_f(val: $f) -> Self {
                val
            }

            #[inline]
            fn from_int(n: i32) -> Self {
                n as $f
            }

            #[inline]
            fn value(&self) -> $f {
                *self
            }

            #[inline]
            fn recip(self) -> Self {
                <$f>::recip(self)
            }

            #[inline]
            fn sqrt(self) -> Self {
                <$f>::sqrt(self)
            }

            #[inline]
            fn powi(self, n: i32) -> Self {
                <$f>::powi(self, n)
            }

            #[inline]
            fn exp(self) -> Self {
                <$f>::exp(self)
            }

            #[inline]
            fn ln(self) -> Self {
                <$f>::ln(self)
            }

            #[inline]
            fn sin(self) -> Self {
                <$f>::sin(self)
            }

            #[inline]
            fn cos(self) -> Self {
                <$f>::cos(self)
            }

            #[inline]
            fn tanh(self) -> Self {
                <$f>::tanh(self)
            }

            #[inline]
            fn abs(self) -> Self {
                <$f>::abs(self)
            }
        }
    };
}

impl_scalar_primitive!(f32);
impl_scalar_primitive!(f64);

impl<T: Scalar> Scalar for Dual<T> {
    type Float = T::Float;

    #[inline]
    fn from_f(val: T::Float) -> Self {
        Dual::constant(T::from_f(val))
    }

    #[inline]
    fn from_int(n: i32) -> Self {
        Dual::constant(T::from_int(n))
    }

    #[inline]
    fn value(&self) -> T::Float {
        self.re.value()
    }

    #[inline]
    fn recip(self) -> Self {
        Dual::recip(self)
    }

    #[inline]
    fn sqrt(self) -> Self {
        Dual::sqrt(self)
    }

    #[inline]
    fn powi(self, n: i32) -> Self {
        Dual::powi(self, n)
    }

    #[inline]
    fn exp(self) -> Self {
        Dual::exp(self)
    }

    #[inline]
    fn ln(self) -> Self {
        Dual::ln(self)
    }

    #[inline]
    fn sin(self) -> Self {
        Dual::sin(self)
    }

    #[inline]
    fn cos(self) -> Self {
        Dual::cos(self)
    }

    #[inline]
    fn tanh(self) -> Self {
        Dual::tanh(self)
    }

    #[inline]
    fn abs(self) -> Self {
        Dual::abs(self)
    }
}

impl<T: Scalar, const N: usize> Scalar for DualVec<T, N> {
    type Float = T::Float;

    #[inline]
    fn from_f(val: T::Float) -> Self {
        DualVec::constant(T::from_f(val))
    }

    #[inline]
    fn from_int(n: i32) -> Self {
        DualVec::constant(T::from_int(n))
    }

    #[inline]
    fn value(&self) -> T::Float {
        self.re.value()
    }

    #[inline]
    fn recip(self) -> Self {
        DualVec::recip(self)
    }

    #[inline]
    fn sqrt(self) -> Self {
        DualVec::sqrt(self)
    }

    #[inline]
    fn powi(self, n: i32) -> Self {
        DualVec::powi(self, n)
    }

    #[inline]
    fn exp(self) -> Self {
        DualVec::exp(self)
    }

    #[inline]
    fn ln(self) -> Self {
        DualVec::ln(self)
    }

    #[inline]
    fn sin(self) -> Self {
        DualVec::sin(self)
    }

    #[inline]
    fn cos(self) -> Self {
        DualVec::cos(self)
    }

    #[inline]
    fn tanh(self) -> Self {
        DualVec::tanh(self)
    }

    #[inline]
    fn abs(self) -> Self {
        DualVec::abs(self)
    }
}
