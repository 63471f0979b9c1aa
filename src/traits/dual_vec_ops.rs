use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::dual_vec::DualVec;
use crate::Scalar;

impl<T: Scalar, const N: usize> DualVec<T, N> {
    #[inline(always)]
    fn lanes(re: T, f: impl FnMut(usize) -> T) -> Self {
        DualVec {
            re,
            eps: std::array::from_fn(f),
        }
    }
}

impl<T: Scalar, const N: usize> Add for DualVec<T, N> {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::lanes(self.re + rhs.re, |k| self.eps[k] + rhs.eps[k])
    }
}

impl<T: Scalar, const N: usize> Sub for DualVec<T, N> {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::lanes(self.re - rhs.re, |k| self.eps[k] - rhs.eps[k])
    }
}

#[allow(clippy::suspicious_arithmetic_impl)]
impl<T: Scalar, const N: usize> Mul for DualVec<T, N> {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self::lanes(self.re * rhs.re, |k| {
            self.re * rhs.eps[k] + self.eps[k] * rhs.re
        })
    }
}

impl<T: Scalar, const N: usize> Div for DualVec<T, N> {
    type Output = Self;
    #[inline]
    fn div(self, rhs: Self) -> Self {
        let inv = rhs.re.recip();
        let q = self.re * inv;
        // (a/b)' = (a' - (a/b) b') / b
        Self::lanes(q, |k| (self.eps[k] - q * rhs.eps[k]) * inv)
    }
}

impl<T: Scalar, const N: usize> Neg for DualVec<T, N> {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::lanes(-self.re, |k| -self.eps[k])
    }
}

impl_assign_via_binary!([T: Scalar, const N: usize] DualVec<T, N>);
