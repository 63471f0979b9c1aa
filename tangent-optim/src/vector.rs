//! The vector abstraction every operator in this crate is written against.
//!
//! Algorithms only use [`Vector`]. Operators that gather values cell by cell
//! additionally need [`FlatVector`], the capability of exposing contiguous
//! indexed storage.

use std::fmt::Debug;
use std::ops::{Index, IndexMut};

use tangent::Float;

/// Linear-space operations on an opaque vector.
///
/// `Clone` produces an independent copy holding the same values.
pub trait Vector<F: Float>: Clone + Debug {
    /// Number of entries.
    fn dimension(&self) -> usize;

    /// `self ← x`.
    fn set(&mut self, x: &Self);

    /// `self ← self + alpha·x`.
    fn axpy(&mut self, alpha: F, x: &Self);

    /// `self ← alpha·self`.
    fn scale(&mut self, alpha: F);

    /// Inner product `⟨self, x⟩`.
    fn dot(&self, x: &Self) -> F;

    /// `self ← 0`.
    fn zero(&mut self);

    /// Euclidean norm induced by [`dot`](Vector::dot).
    fn norm(&self) -> F {
        self.dot(self).sqrt()
    }

    /// `self ← self + x`.
    fn plus(&mut self, x: &Self) {
        self.axpy(F::one(), x);
    }

    /// The `i`-th canonical basis vector of the same space.
    fn basis(&self, i: usize) -> Self;
}

/// Vectors whose entries live in one contiguous buffer.
pub trait FlatVector<F: Float>: Vector<F> {
    fn as_slice(&self) -> &[F];
    fn as_mut_slice(&mut self) -> &mut [F];
}

/// Assert that `v` has `expected` entries.
///
/// Length mismatches are caller bugs, never runtime states.
#[track_caller]
pub(crate) fn check_dim<F: Float, V: Vector<F>>(v: &V, expected: usize, what: &str) {
    assert_eq!(
        v.dimension(),
        expected,
        "{} has dimension {}, expected {}",
        what,
        v.dimension(),
        expected
    );
}

/// Contiguous vector backed by a `Vec<F>`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StdVector<F> {
    data: Vec<F>,
}

impl<F: Float> StdVector<F> {
    pub fn new(data: Vec<F>) -> Self {
        StdVector { data }
    }

    /// Zero vector of length `n`.
    pub fn zeros(n: usize) -> Self {
        StdVector {
            data: vec![F::zero(); n],
        }
    }

    /// Vector of length `n` with every entry equal to `value`.
    pub fn from_elem(n: usize, value: F) -> Self {
        StdVector {
            data: vec![value; n],
        }
    }

    pub fn into_inner(self) -> Vec<F> {
        self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, F> {
        self.data.iter()
    }
}

impl<F: Float> From<Vec<F>> for StdVector<F> {
    fn from(data: Vec<F>) -> Self {
        StdVector { data }
    }
}

impl<F> Index<usize> for StdVector<F> {
    type Output = F;
    fn index(&self, i: usize) -> &F {
        &self.data[i]
    }
}

impl<F> IndexMut<usize> for StdVector<F> {
    fn index_mut(&mut self, i: usize) -> &mut F {
        &mut self.data[i]
    }
}

impl<F: Float> Vector<F> for StdVector<F> {
    fn dimension(&self) -> usize {
        self.data.len()
    }

    fn set(&mut self, x: &Self) {
        debug_assert_eq!(self.data.len(), x.data.len());
        self.data.copy_from_slice(&x.data);
    }

    fn axpy(&mut self, alpha: F, x: &Self) {
        debug_assert_eq!(self.data.len(), x.data.len());
        for (yi, &xi) in self.data.iter_mut().zip(x.data.iter()) {
            *yi += alpha * xi;
        }
    }

    fn scale(&mut self, alpha: F) {
        for yi in &mut self.data {
            *yi *= alpha;
        }
    }

    fn dot(&self, x: &Self) -> F {
        debug_assert_eq!(self.data.len(), x.data.len());
        let mut s = F::zero();
        for (&a, &b) in self.data.iter().zip(x.data.iter()) {
            s += a * b;
        }
        s
    }

    fn zero(&mut self) {
        self.data.fill(F::zero());
    }

    fn basis(&self, i: usize) -> Self {
        let mut e = StdVector::zeros(self.data.len());
        e.data[i] = F::one();
        e
    }
}

impl<F: Float> FlatVector<F> for StdVector<F> {
    fn as_slice(&self) -> &[F] {
        &self.data
    }

    fn as_mut_slice(&mut self) -> &mut [F] {
        &mut self.data
    }
}

#[cfg(feature = "nalgebra")]
mod nalgebra_support {
    use nalgebra::DVector;

    use super::{FlatVector, Vector};
    use tangent::Float;

    impl<F: Float + nalgebra::Scalar> Vector<F> for DVector<F> {
        fn dimension(&self) -> usize {
            self.len()
        }

        fn set(&mut self, x: &Self) {
            self.as_mut_slice().copy_from_slice(x.as_slice());
        }

        fn axpy(&mut self, alpha: F, x: &Self) {
            nalgebra::Matrix::axpy(self, alpha, x, F::one());
        }

        fn scale(&mut self, alpha: F) {
            *self *= alpha;
        }

        fn dot(&self, x: &Self) -> F {
            nalgebra::Matrix::dot(self, x)
        }

        fn zero(&mut self) {
            self.fill(F::zero());
        }

        fn basis(&self, i: usize) -> Self {
            let mut e = DVector::from_element(self.len(), F::zero());
            e[i] = F::one();
            e
        }
    }

    impl<F: Float + nalgebra::Scalar> FlatVector<F> for DVector<F> {
        fn as_slice(&self) -> &[F] {
            nalgebra::Matrix::as_slice(self)
        }

        fn as_mut_slice(&mut self) -> &mut [F] {
            nalgebra::Matrix::as_mut_slice(self)
        }
    }
}

/// Check the vector-space axioms for `x`, `y`, `z` of one implementation.
///
/// Returns the absolute consistency error of each check, in order:
/// commutativity and associativity of addition, additive identity and
/// inverse, identity and compatibility of scalar multiplication, the two
/// distributive laws, symmetry of `dot`, and `norm² = dot(x, x)`. Every
/// entry should be at round-off level.
pub fn check_vector<F: Float, V: Vector<F>>(x: &V, y: &V, z: &V) -> Vec<F> {
    let a = F::lit(1.3);
    let b = F::lit(-0.7);
    let mut errors = Vec::with_capacity(10);

    let diff = |p: &V, q: &V| {
        let mut d = p.clone();
        d.axpy(-F::one(), q);
        d.norm()
    };

    // x + y = y + x
    let mut xy = x.clone();
    xy.plus(y);
    let mut yx = y.clone();
    yx.plus(x);
    errors.push(diff(&xy, &yx));

    // (x + y) + z = x + (y + z)
    let mut lhs = xy.clone();
    lhs.plus(z);
    let mut yz = y.clone();
    yz.plus(z);
    let mut rhs = x.clone();
    rhs.plus(&yz);
    errors.push(diff(&lhs, &rhs));

    // x + 0 = x
    let mut zero = x.clone();
    zero.zero();
    let mut x0 = x.clone();
    x0.plus(&zero);
    errors.push(diff(&x0, x));

    // x + (-x) = 0
    let mut neg = x.clone();
    neg.scale(-F::one());
    neg.plus(x);
    errors.push(neg.norm());

    // 1·x = x
    let mut one_x = x.clone();
    one_x.scale(F::one());
    errors.push(diff(&one_x, x));

    // a(bx) = (ab)x
    let mut abx = x.clone();
    abx.scale(b);
    abx.scale(a);
    let mut ab_x = x.clone();
    ab_x.scale(a * b);
    errors.push(diff(&abx, &ab_x));

    // a(x + y) = ax + ay
    let mut lhs = xy.clone();
    lhs.scale(a);
    let mut rhs = x.clone();
    rhs.scale(a);
    rhs.axpy(a, y);
    errors.push(diff(&lhs, &rhs));

    // (a + b)x = ax + bx
    let mut lhs = x.clone();
    lhs.scale(a + b);
    let mut rhs = x.clone();
    rhs.scale(a);
    rhs.axpy(b, x);
    errors.push(diff(&lhs, &rhs));

    // <x, y> = <y, x>
    errors.push((x.dot(y) - y.dot(x)).abs());

    // ||x||² = <x, x>
    let nrm = x.norm();
    errors.push((nrm * nrm - x.dot(x)).abs());

    errors
}
