//! Euclidean space as a Lie group.
//!
//! The translation group (R^n, +) is the flat special case of a Lie group:
//! composition is vector addition, `exp`/`log` are the identity and the
//! adjoint actions are trivial. A cumulative spline on `Rn` therefore
//! reproduces the ordinary blended B-spline.

use nalgebra::{SMatrix, SVector};

use super::LieGroup;
use crate::math::scalar::Scalar;

/// A point of R^D seen as an element of the translation group.
///
/// # Example
/// ```rust
/// use nalgebra::Vector3;
/// use unispline::lie::{rn::Rn, LieGroup};
///
/// let a = Rn::new(Vector3::new(1.0, 2.0, 3.0));
/// let b = Rn::new(Vector3::new(0.5, 0.5, 0.5));
/// assert_eq!(a.compose(&b).into_vector(), Vector3::new(1.5, 2.5, 3.5));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rn<T, const D: usize>
where
    T: Scalar,
{
    /// The point in Euclidean space
    pub vector: SVector<T, D>,
}

impl<T, const D: usize> Rn<T, D>
where
    T: Scalar,
{
    pub fn new(vector: SVector<T, D>) -> Self {
        Self { vector }
    }

    /// Get the underlying vector.
    pub fn as_vector(&self) -> &SVector<T, D> {
        &self.vector
    }

    /// Get the underlying vector mutably.
    pub fn as_vector_mut(&mut self) -> &mut SVector<T, D> {
        &mut self.vector
    }

    /// Convert into the underlying vector.
    pub fn into_vector(self) -> SVector<T, D> {
        self.vector
    }
}

impl<T, const D: usize> LieGroup<T, D> for Rn<T, D>
where
    T: Scalar,
{
    fn identity() -> Self {
        Self::new(SVector::zeros())
    }

    fn compose(&self, other: &Self) -> Self {
        Self::new(self.vector + other.vector)
    }

    fn inverse(&self) -> Self {
        Self::new(-self.vector)
    }

    fn exp(tangent: &SVector<T, D>) -> Self {
        Self::new(*tangent)
    }

    fn log(&self) -> SVector<T, D> {
        self.vector
    }

    fn adjoint(&self) -> SMatrix<T, D, D> {
        SMatrix::identity()
    }

    fn ad(_tangent: &SVector<T, D>) -> SMatrix<T, D, D> {
        SMatrix::zeros()
    }

    fn left_jacobian(_tangent: &SVector<T, D>) -> SMatrix<T, D, D> {
        SMatrix::identity()
    }

    fn left_jacobian_inverse(_tangent: &SVector<T, D>) -> SMatrix<T, D, D> {
        SMatrix::identity()
    }
}
