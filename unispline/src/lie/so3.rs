//! SO(3) implemented on unit quaternions.
//!
//! The tangent space is the 3D space of rotation vectors (axis times angle).
//! `exp`/`log` are written with explicit small-angle expansions instead of
//! `UnitQuaternion::from_scaled_axis`/`scaled_axis` so that they stay
//! accurate for tiny rotations and only use arithmetic, `sqrt`, `sin`,
//! `cos` and `atan` on the scalar type.

use core::ops::Mul;

use nalgebra::{Matrix3, Quaternion, UnitQuaternion, Vector3};

use super::LieGroup;
use crate::math::scalar::{Scalar, SMALL_ANGLE_SQ};

/// Squared norm of the quaternion vector part below which `log` uses its
/// series expansion.
const LOG_SERIES_SQ: f64 = 1e-20;

/// Rotation group element backed by a `UnitQuaternion`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct So3<T>
where
    T: Scalar,
{
    quaternion: UnitQuaternion<T>,
}

impl<T> So3<T>
where
    T: Scalar,
{
    /// Construct from a unit quaternion.
    pub fn new(quaternion: UnitQuaternion<T>) -> Self {
        Self { quaternion }
    }

    /// Borrow the underlying quaternion.
    pub fn as_quaternion(&self) -> &UnitQuaternion<T> {
        &self.quaternion
    }

    /// Mutable access to the underlying quaternion.
    pub fn as_quaternion_mut(&mut self) -> &mut UnitQuaternion<T> {
        &mut self.quaternion
    }

    pub fn into_quaternion(self) -> UnitQuaternion<T> {
        self.quaternion
    }

    /// Construct from Euler angles (roll, pitch, yaw).
    pub fn from_euler_angles(roll: T, pitch: T, yaw: T) -> Self {
        Self::new(UnitQuaternion::from_euler_angles(roll, pitch, yaw))
    }

    /// 3x3 rotation matrix.
    pub fn matrix(&self) -> Matrix3<T> {
        self.quaternion.to_rotation_matrix().into_inner()
    }

    /// Rotate a vector.
    pub fn transform_vector(&self, v: &Vector3<T>) -> Vector3<T> {
        self.quaternion.transform_vector(v)
    }

    /// Rotate a vector by the inverse rotation.
    pub fn inverse_transform_vector(&self, v: &Vector3<T>) -> Vector3<T> {
        self.quaternion.inverse_transform_vector(v)
    }
}

impl<T: Scalar> Default for So3<T> {
    fn default() -> Self {
        <Self as LieGroup<T, 3>>::identity()
    }
}

impl<T: Scalar> Mul for So3<T> {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        self.compose(&rhs)
    }
}

impl<T: Scalar> From<UnitQuaternion<T>> for So3<T> {
    fn from(quaternion: UnitQuaternion<T>) -> Self {
        Self::new(quaternion)
    }
}

impl<T> LieGroup<T, 3> for So3<T>
where
    T: Scalar,
{
    fn identity() -> Self {
        Self::new(UnitQuaternion::identity())
    }

    fn compose(&self, other: &Self) -> Self {
        Self::new(self.quaternion * other.quaternion)
    }

    fn inverse(&self) -> Self {
        Self::new(self.quaternion.inverse())
    }

    fn exp(omega: &Vector3<T>) -> Self {
        let theta_sq = omega.norm_squared();
        let (real, imag_factor) = if theta_sq < T::lit(SMALL_ANGLE_SQ) {
            (
                T::one() - theta_sq / T::lit(8.0),
                T::lit(0.5) - theta_sq / T::lit(48.0),
            )
        } else {
            let theta = theta_sq.sqrt();
            let half_theta = theta * T::lit(0.5);
            (half_theta.cos(), half_theta.sin() / theta)
        };

        let imag = omega * imag_factor;
        let quaternion = Quaternion::new(real, imag.x, imag.y, imag.z);
        // Normalize so the Taylor branch stays on the unit sphere.
        Self::new(UnitQuaternion::new_normalize(quaternion))
    }

    fn log(&self) -> Vector3<T> {
        let q = self.quaternion.quaternion();
        let w = q.w;
        let imag = q.imag();
        let n_sq = imag.norm_squared();

        let two = T::lit(2.0);
        let scale = if n_sq < T::lit(LOG_SERIES_SQ) {
            two / w - T::lit(2.0 / 3.0) * n_sq / (w * w * w)
        } else {
            let n = n_sq.sqrt();
            if w.abs() < T::default_epsilon() {
                if w > T::zero() {
                    T::pi() / n
                } else {
                    -T::pi() / n
                }
            } else {
                two * (n / w).atan() / n
            }
        };

        imag * scale
    }

    fn adjoint(&self) -> Matrix3<T> {
        self.matrix()
    }

    fn ad(omega: &Vector3<T>) -> Matrix3<T> {
        omega.cross_matrix()
    }

    fn left_jacobian(omega: &Vector3<T>) -> Matrix3<T> {
        let theta_sq = omega.norm_squared();
        let hat = omega.cross_matrix();

        let (a, b) = if theta_sq < T::lit(SMALL_ANGLE_SQ) {
            (
                T::lit(0.5) - theta_sq / T::lit(24.0),
                T::lit(1.0 / 6.0) - theta_sq / T::lit(120.0),
            )
        } else {
            let theta = theta_sq.sqrt();
            (
                (T::one() - theta.cos()) / theta_sq,
                (theta - theta.sin()) / (theta_sq * theta),
            )
        };

        Matrix3::identity() + hat * a + hat * hat * b
    }

    fn left_jacobian_inverse(omega: &Vector3<T>) -> Matrix3<T> {
        let theta_sq = omega.norm_squared();
        let hat = omega.cross_matrix();

        let c = if theta_sq < T::lit(SMALL_ANGLE_SQ) {
            T::lit(1.0 / 12.0) + theta_sq / T::lit(720.0)
        } else {
            let theta = theta_sq.sqrt();
            T::one() / theta_sq
                - (T::one() + theta.cos()) / (T::lit(2.0) * theta * theta.sin())
        };

        Matrix3::identity() - hat * T::lit(0.5) + hat * hat * c
    }

    fn retract(&self, delta: &Vector3<T>) -> Self {
        let mut result = Self::exp(delta).quaternion * self.quaternion;
        result.renormalize(); // Ensure unit length for low-precision types
        Self::new(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use core::f64::consts::PI;

    fn rotation(x: f64, y: f64, z: f64) -> So3<f64> {
        So3::exp(&Vector3::new(x, y, z))
    }

    #[test]
    fn identity_is_neutral() {
        let r = rotation(0.3, -0.2, 0.9);
        let id = So3::<f64>::identity();
        assert_relative_eq!(r.compose(&id).matrix(), r.matrix(), epsilon = 1e-14);
        assert_relative_eq!(id.compose(&r).matrix(), r.matrix(), epsilon = 1e-14);
        assert!(id.log().norm() < 1e-15);
    }

    #[test]
    fn exp_matches_nalgebra() {
        let omega = Vector3::new(0.4, -1.1, 0.25);
        let ours = So3::<f64>::exp(&omega);
        let reference = UnitQuaternion::from_scaled_axis(omega);
        assert_relative_eq!(ours.matrix(), reference.to_rotation_matrix().into_inner(), epsilon = 1e-14);
    }

    #[test]
    fn log_inverts_exp() {
        for omega in [
            Vector3::new(0.1, -0.2, 0.3),
            Vector3::new(1e-5, 2e-6, -3e-5),
            Vector3::new(1e-9, 0.0, 0.0),
            Vector3::new(PI - 0.1, 0.0, 0.0),
            Vector3::new(-1.2, 0.7, 1.9),
        ] {
            let recovered = So3::<f64>::exp(&omega).log();
            assert_relative_eq!(recovered, omega, epsilon = 1e-12);
        }
    }

    #[test]
    fn log_handles_negative_real_part() {
        let omega = Vector3::new(0.0, 0.2, 0.0);
        let q = So3::<f64>::exp(&omega).into_quaternion();
        let flipped = So3::new(UnitQuaternion::new_unchecked(-q.into_inner()));
        assert_relative_eq!(flipped.log(), omega, epsilon = 1e-12);
    }

    #[test]
    fn adjoint_conjugates_exponential() {
        let r = rotation(0.5, 0.1, -0.4);
        let v = Vector3::new(0.01, -0.03, 0.02);
        let conjugated = r.compose(&So3::exp(&v)).compose(&r.inverse());
        assert_relative_eq!(conjugated.log(), r.adjoint() * v, epsilon = 1e-14);
    }

    #[test]
    fn lie_bracket_is_cross_product() {
        let a = Vector3::new(1.0, 2.0, 3.0);
        let b = Vector3::new(-0.5, 0.25, 4.0);
        assert_relative_eq!(So3::<f64>::lie_bracket(&a, &b), a.cross(&b), epsilon = 1e-14);
    }

    #[test]
    fn left_jacobian_matches_finite_differences() {
        let h = 1e-6;
        for phi in [
            Vector3::new(0.3, -0.7, 0.2),
            Vector3::new(1e-4, -2e-4, 5e-5),
            Vector3::new(2.5, 0.3, -0.4),
        ] {
            let jl = So3::<f64>::left_jacobian(&phi);
            let base = So3::exp(&phi);
            for c in 0..3 {
                let mut step = Vector3::zeros();
                step[c] = h;
                let plus = So3::exp(&(phi + step)).compose(&base.inverse()).log();
                let minus = So3::exp(&(phi - step)).compose(&base.inverse()).log();
                let column = (plus - minus) / (2.0 * h);
                assert_relative_eq!(column, jl.column(c).into_owned(), epsilon = 1e-8);
            }
        }
    }

    #[test]
    fn left_jacobian_inverse_is_inverse() {
        for phi in [
            Vector3::new(0.3, -0.7, 0.2),
            Vector3::new(1e-4, 0.0, 0.0),
            Vector3::new(-1.5, 1.0, 0.5),
        ] {
            let product =
                So3::<f64>::left_jacobian(&phi) * So3::<f64>::left_jacobian_inverse(&phi);
            assert_relative_eq!(product, Matrix3::identity(), epsilon = 1e-12);
        }
    }

    #[test]
    fn retract_then_local_round_trip() {
        let r = rotation(0.2, 0.4, -0.1);
        let delta = Vector3::new(0.1, -0.2, 0.3);
        let r2 = r.retract(&delta);
        assert_relative_eq!(r.local(&r2), delta, epsilon = 1e-12);
        assert_relative_eq!(r2.matrix(), (So3::exp(&delta) * r).matrix(), epsilon = 1e-14);
    }

    #[test]
    fn works_in_single_precision() {
        let omega = Vector3::new(0.1f32, -0.2, 0.3);
        let recovered = So3::<f32>::exp(&omega).log();
        assert!((recovered - omega).norm() < 1e-5);
    }
}
