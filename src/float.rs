use num_traits::{FloatConst, FromPrimitive, ToPrimitive};

use crate::Scalar;

/// Marker trait for the primitive float types (`f32`, `f64`) at the bottom of
/// every dual-number tower.
///
/// A `Float` is its own [`Scalar`] (`Scalar::Float = Self`), so the
/// elementary functions come from `Scalar`. This trait adds what only plain
/// numbers support: ordering, machine constants and lossy conversions.
/// Dual types never implement it.
pub trait Float: Scalar<Float = Self> + PartialOrd + FromPrimitive + ToPrimitive + FloatConst {
    /// Machine epsilon.
    fn epsilon() -> Self;

    /// Largest finite value.
    fn max_value() -> Self;

    /// Convert an `f64` literal, rounding when `Self` is narrower.
    fn lit(x: f64) -> Self;

    fn is_finite(self) -> bool;

    fn max(self, other: Self) -> Self;

    fn min(self, other: Self) -> Self;
}

macro_rules! impl_float {
    ($f:ty) => {
        impl Float for $f {
            #[inline]
            fn epsilon() -> Self {
                <$f>::EPSILON
            }

            #[inline]
            fn max_value() -> Self {
                <$f>::MAX
            }

            #[inline]
            fn lit(x: f64) -> Self {
                x as $f
            }

            #[inline]
            fn is_finite(self) -> bool {
                <$f>::is_finite(self)
            }

            #[inline]
            fn max(self, other: Self) -> Self {
                <$f>::max(self, other)
            }

            #[inline]
            fn min(self, other: Self) -> Self {
                <$f>::min(self, other)
            }
        }
    };
}

impl_float!(f32);
impl_float!(f64);
