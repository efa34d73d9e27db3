//! Lie group support for cumulative splines.
//!
//! A cumulative B-spline on a Lie group is a running product of exponentials
//! of scaled increments between consecutive knots. This module provides the
//! capability set the spline evaluator needs from such a group.

use nalgebra::{SMatrix, SVector};

use crate::math::scalar::Scalar;

pub mod rn;
pub mod so3;

/// A matrix Lie group with a `DOF`-dimensional tangent space.
///
/// Tangent vectors are expressed in the Lie algebra, so `exp`/`log` map
/// between the group and `R^DOF`. Perturbations are applied from the left:
/// `retract(x, delta) = exp(delta) * x`.
///
/// # Properties
///
/// Implementations must satisfy:
/// 1. `exp(log(x)) ≈ x` for all `x`
/// 2. `compose(x, inverse(x)) ≈ identity()`
/// 3. `adjoint(x) * v` is the tangent of `x * exp(v) * x⁻¹`
/// 4. `ad(a) * b = [a, b]`
/// 5. `log(exp(d) * exp(phi)) ≈ phi + left_jacobian_inverse(phi) * d` for small `d`
pub trait LieGroup<T: Scalar, const DOF: usize>: Clone + Sized {
    /// The neutral element.
    fn identity() -> Self;

    /// Group product `self * other`.
    fn compose(&self, other: &Self) -> Self;

    fn inverse(&self) -> Self;

    /// Exponential map from the Lie algebra.
    fn exp(tangent: &SVector<T, DOF>) -> Self;

    /// Logarithm map to the Lie algebra.
    fn log(&self) -> SVector<T, DOF>;

    /// Adjoint representation of `self` acting on tangent vectors.
    fn adjoint(&self) -> SMatrix<T, DOF, DOF>;

    /// Adjoint representation of the Lie algebra, `ad(a) * b = [a, b]`.
    fn ad(tangent: &SVector<T, DOF>) -> SMatrix<T, DOF, DOF>;

    /// Left Jacobian of the exponential map: `exp(phi + d) ≈ exp(J_l(phi) d) exp(phi)`.
    fn left_jacobian(tangent: &SVector<T, DOF>) -> SMatrix<T, DOF, DOF>;

    /// Inverse of [`LieGroup::left_jacobian`].
    fn left_jacobian_inverse(tangent: &SVector<T, DOF>) -> SMatrix<T, DOF, DOF>;

    /// Lie bracket `[a, b]`.
    fn lie_bracket(a: &SVector<T, DOF>, b: &SVector<T, DOF>) -> SVector<T, DOF> {
        Self::ad(a) * b
    }

    /// Apply a left-multiplicative update, `exp(delta) * self`.
    ///
    /// This is the local parameterization an optimizer uses for knots of a
    /// Lie spline; the spline Jacobians are expressed in the same chart.
    fn retract(&self, delta: &SVector<T, DOF>) -> Self {
        Self::exp(delta).compose(self)
    }

    /// Tangent vector `delta` such that `self.retract(delta) ≈ other`.
    fn local(&self, other: &Self) -> SVector<T, DOF> {
        other.compose(&self.inverse()).log()
    }
}
