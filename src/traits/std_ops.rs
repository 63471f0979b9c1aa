use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::dual::Dual;
use crate::Scalar;

// Product and quotient rules; `a ± b` and `-a` act componentwise.

impl<T: Scalar> Add for Dual<T> {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Dual::new(self.re + rhs.re, self.eps + rhs.eps)
    }
}

impl<T: Scalar> Sub for Dual<T> {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Dual::new(self.re - rhs.re, self.eps - rhs.eps)
    }
}

impl<T: Scalar> Mul for Dual<T> {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Dual::new(self.re * rhs.re, self.re * rhs.eps + self.eps * rhs.re)
    }
}

impl<T: Scalar> Div for Dual<T> {
    type Output = Self;
    #[inline]
    fn div(self, rhs: Self) -> Self {
        let q = self.re / rhs.re;
        Dual::new(q, (self.eps - q * rhs.eps) / rhs.re)
    }
}

impl<T: Scalar> Neg for Dual<T> {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Dual::new(-self.re, -self.eps)
    }
}

impl_assign_via_binary!([T: Scalar] Dual<T>);

// Mixed arithmetic with a primitive float, so `x * 2.0` reads naturally for a
// first-order `Dual<f64>`. Nested towers lift constants with `Scalar::from_f`.
macro_rules! impl_primitive_rhs {
    ($($f:ty),*) => {$(
        impl Add<$f> for Dual<$f> {
            type Output = Self;
            #[inline]
            fn add(self, c: $f) -> Self {
                Dual::new(self.re + c, self.eps)
            }
        }

        impl Sub<$f> for Dual<$f> {
            type Output = Self;
            #[inline]
            fn sub(self, c: $f) -> Self {
                Dual::new(self.re - c, self.eps)
            }
        }

        impl Mul<$f> for Dual<$f> {
            type Output = Self;
            #[inline]
            fn mul(self, c: $f) -> Self {
                Dual::new(self.re * c, self.eps * c)
            }
        }

        impl Mul<Dual<$f>> for $f {
            type Output = Dual<$f>;
            #[inline]
            fn mul(self, d: Dual<$f>) -> Dual<$f> {
                d * self
            }
        }

        impl Div<$f> for Dual<$f> {
            type Output = Self;
            #[inline]
            fn div(self, c: $f) -> Self {
                self * c.recip()
            }
        }
    )*};
}

impl_primitive_rhs!(f32, f64);
