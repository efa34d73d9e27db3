//! Pose trajectory built from a rotation spline and a position spline.

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use rand::Rng;

use crate::error::SplineError;
use crate::lie::so3::So3;
use crate::math::scalar::Scalar;
use crate::time::TimeGrid;

use super::{RdSpline, So3Spline};

/// Continuous-time pose `T_world_body(t)` of order `N`.
///
/// Orientation and position are separate uniform splines on the same time
/// grid: a cumulative [`So3Spline`] for the rotation and an [`RdSpline`] in
/// R³ for the position of the body in the world frame. Besides poses it
/// evaluates what an IMU rigidly attached to the body would measure.
///
/// The two halves stay aligned as long as knots are added and removed
/// through this type. Mutable access to either spline is provided for
/// optimizer updates of individual knots.
#[derive(Clone, Debug)]
pub struct Se3Spline<const N: usize, T = f64>
where
    T: Scalar,
{
    so3_spline: So3Spline<N, T>,
    pos_spline: RdSpline<3, N, T>,
}

impl<const N: usize, T> Se3Spline<N, T>
where
    T: Scalar,
{
    pub fn new(dt_ns: i64) -> Result<Self, SplineError> {
        Self::with_start_time(dt_ns, 0)
    }

    pub fn with_start_time(dt_ns: i64, start_t_ns: i64) -> Result<Self, SplineError> {
        let grid = TimeGrid::new(dt_ns, start_t_ns)?;
        Ok(Self {
            so3_spline: So3Spline::<N, T>::from_grid(grid),
            pos_spline: RdSpline::<3, N, T>::from_grid(grid),
        })
    }

    /// Append a pose knot.
    pub fn push_knot(&mut self, pose: Isometry3<T>) {
        self.so3_spline.push_knot(So3::new(pose.rotation));
        self.pos_spline.push_knot(pose.translation.vector);
    }

    /// Remove the first pose knot, shifting the start time of both halves.
    ///
    /// Returns `None` without touching either half unless both of them
    /// have a knot to drop and share the same start time.
    pub fn pop_front(&mut self) -> Option<Isometry3<T>> {
        if self.so3_spline.num_knots() == 0
            || self.pos_spline.num_knots() == 0
            || self.so3_spline.min_time_ns() != self.pos_spline.min_time_ns()
        {
            return None;
        }
        let rotation = self.so3_spline.pop_front()?;
        let position = self.pos_spline.pop_front()?;
        Some(Self::compose_pose(rotation.into_quaternion(), position))
    }

    pub fn knot(&self, i: usize) -> Option<Isometry3<T>> {
        let rotation = self.so3_spline.knot(i)?;
        let position = self.pos_spline.knot(i)?;
        Some(Self::compose_pose(*rotation.as_quaternion(), *position))
    }

    pub fn num_knots(&self) -> usize {
        self.so3_spline.num_knots()
    }

    pub fn dt_ns(&self) -> i64 {
        self.so3_spline.dt_ns()
    }

    pub fn min_time_ns(&self) -> i64 {
        self.so3_spline.min_time_ns()
    }

    pub fn max_time_ns(&self) -> i64 {
        self.so3_spline.max_time_ns()
    }

    pub fn so3_spline(&self) -> &So3Spline<N, T> {
        &self.so3_spline
    }

    pub fn so3_spline_mut(&mut self) -> &mut So3Spline<N, T> {
        &mut self.so3_spline
    }

    pub fn pos_spline(&self) -> &RdSpline<3, N, T> {
        &self.pos_spline
    }

    pub fn pos_spline_mut(&mut self) -> &mut RdSpline<3, N, T> {
        &mut self.pos_spline
    }

    /// Pose of the body in the world frame at `t_ns`.
    pub fn pose(&self, t_ns: i64) -> Result<Isometry3<T>, SplineError> {
        let rotation = self.so3_spline.evaluate(t_ns)?;
        let position = self.pos_spline.evaluate::<0>(t_ns)?;
        Ok(Self::compose_pose(rotation.into_quaternion(), position))
    }

    /// Angular velocity in the body frame, rad/s.
    pub fn rot_vel_body(&self, t_ns: i64) -> Result<Vector3<T>, SplineError> {
        self.so3_spline.velocity_body(t_ns)
    }

    pub fn rot_accel_body(&self, t_ns: i64) -> Result<Vector3<T>, SplineError> {
        self.so3_spline.acceleration_body(t_ns)
    }

    /// Linear velocity in the world frame, m/s.
    pub fn trans_vel_world(&self, t_ns: i64) -> Result<Vector3<T>, SplineError> {
        self.pos_spline.velocity(t_ns)
    }

    /// Linear acceleration in the world frame, m/s².
    pub fn trans_accel_world(&self, t_ns: i64) -> Result<Vector3<T>, SplineError> {
        self.pos_spline.acceleration(t_ns)
    }

    /// Specific force in the body frame, `R(t)ᵀ (a_world(t) - g_world)`.
    ///
    /// With `g_world = (0, 0, -9.81)` a body at rest reads `+9.81` along the
    /// world up axis, which is what an accelerometer reports.
    pub fn specific_force_body(
        &self,
        t_ns: i64,
        gravity_world: &Vector3<T>,
    ) -> Result<Vector3<T>, SplineError> {
        let rotation = self.so3_spline.evaluate(t_ns)?;
        let accel_world = self.pos_spline.acceleration(t_ns)?;
        Ok(rotation.inverse_transform_vector(&(accel_world - gravity_world)))
    }

    fn compose_pose(rotation: UnitQuaternion<T>, position: Vector3<T>) -> Isometry3<T> {
        Isometry3::from_parts(Translation3::from(position), rotation)
    }
}

impl<const N: usize> Se3Spline<N, f64> {
    /// Append `n` random pose knots, see [`So3Spline::gen_random_trajectory`]
    /// and [`RdSpline::gen_random_trajectory`].
    pub fn gen_random_trajectory<R>(&mut self, n: usize, static_init: bool, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        self.so3_spline.gen_random_trajectory(n, static_init, rng);
        self.pos_spline.gen_random_trajectory(n, static_init, rng);
    }
}
