//! Cumulative B-spline on a Lie group.

use core::marker::PhantomData;
use alloc::collections::VecDeque;
use core::ops::{Index, IndexMut};

use nalgebra::{SMatrix, SVector, Vector3};
use rand::Rng;

use crate::error::SplineError;
use crate::helper::{LieJacobian, LieOutputs, SplineHelper};
use crate::lie::{so3::So3, LieGroup};
use crate::math::scalar::Scalar;
use crate::time::TimeGrid;

/// Cumulative uniform B-spline of order `N` whose knots live on the Lie
/// group `G` with `DOF` degrees of freedom.
///
/// Values are group elements; time derivatives are body-frame tangent
/// vectors. Jacobians are taken with respect to a left perturbation
/// `knot ← exp(ε) knot` of each knot, the same chart
/// [`LieSpline::retract_knot`] applies.
#[derive(Clone, Debug)]
pub struct LieSpline<G, const DOF: usize, const N: usize, T = f64>
where
    T: Scalar,
    G: LieGroup<T, DOF>,
{
    grid: TimeGrid,
    knots: VecDeque<G>,
    _scalar: PhantomData<T>,
}

/// Rotation spline on SO(3).
pub type So3Spline<const N: usize, T = f64> = LieSpline<So3<T>, 3, N, T>;

type Jacobians<T, const DOF: usize, const N: usize> = [SMatrix<T, DOF, DOF>; N];

impl<G, const DOF: usize, const N: usize, T> LieSpline<G, DOF, N, T>
where
    T: Scalar,
    G: LieGroup<T, DOF>,
{
    /// Spline order.
    pub const ORDER: usize = N;
    /// Spline degree.
    pub const DEG: usize = N - 1;

    pub fn new(dt_ns: i64) -> Result<Self, SplineError> {
        Self::with_start_time(dt_ns, 0)
    }

    pub fn with_start_time(dt_ns: i64, start_t_ns: i64) -> Result<Self, SplineError> {
        Ok(Self::from_grid(TimeGrid::new(dt_ns, start_t_ns)?))
    }

    pub fn from_grid(grid: TimeGrid) -> Self {
        let () = SplineHelper::<N>::VALID_ORDER;
        log::debug!(
            "new Lie spline of order {} with {} degrees of freedom: dt = {} ns, start = {} ns",
            N,
            DOF,
            grid.dt_ns(),
            grid.start_t_ns()
        );
        Self {
            grid,
            knots: VecDeque::new(),
            _scalar: PhantomData,
        }
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    /// Group element at `t_ns`.
    pub fn evaluate(&self, t_ns: i64) -> Result<G, SplineError> {
        let mut value = G::identity();
        self.evaluate_into(
            t_ns,
            LieOutputs {
                value: Some(&mut value),
                ..Default::default()
            },
        )?;
        Ok(value)
    }

    /// Group element at `t_ns` and its Jacobian with respect to the
    /// contributing knots. The result is perturbed from the left as well:
    /// `value ← exp(J_i ε) value` for `knot_i ← exp(ε) knot_i`.
    pub fn evaluate_with_jacobian(
        &self,
        t_ns: i64,
    ) -> Result<(G, LieJacobian<T, DOF, N>), SplineError> {
        let mut value = G::identity();
        let mut d_val_d_knot = [SMatrix::zeros(); N];
        let start_idx = self.evaluate_into(
            t_ns,
            LieOutputs {
                value: Some(&mut value),
                d_value_d_knots: Some(&mut d_val_d_knot),
                ..Default::default()
            },
        )?;
        Ok((
            value,
            LieJacobian {
                start_idx,
                d_val_d_knot,
            },
        ))
    }

    /// Angular velocity in the body frame, in rad/s for rotations.
    pub fn velocity_body(&self, t_ns: i64) -> Result<SVector<T, DOF>, SplineError> {
        self.derivative(t_ns, |out, v| out.velocity = Some(v))
    }

    pub fn velocity_body_with_jacobian(
        &self,
        t_ns: i64,
    ) -> Result<(SVector<T, DOF>, LieJacobian<T, DOF, N>), SplineError> {
        self.derivative_with_jacobian(t_ns, |out, v, j| {
            out.velocity = Some(v);
            out.d_velocity_d_knots = Some(j);
        })
    }

    /// Angular acceleration in the body frame.
    pub fn acceleration_body(&self, t_ns: i64) -> Result<SVector<T, DOF>, SplineError> {
        self.derivative(t_ns, |out, v| out.acceleration = Some(v))
    }

    pub fn acceleration_body_with_jacobian(
        &self,
        t_ns: i64,
    ) -> Result<(SVector<T, DOF>, LieJacobian<T, DOF, N>), SplineError> {
        self.derivative_with_jacobian(t_ns, |out, v, j| {
            out.acceleration = Some(v);
            out.d_acceleration_d_knots = Some(j);
        })
    }

    /// Angular jerk in the body frame.
    pub fn jerk_body(&self, t_ns: i64) -> Result<SVector<T, DOF>, SplineError> {
        self.derivative(t_ns, |out, v| out.jerk = Some(v))
    }

    pub fn jerk_body_with_jacobian(
        &self,
        t_ns: i64,
    ) -> Result<(SVector<T, DOF>, LieJacobian<T, DOF, N>), SplineError> {
        self.derivative_with_jacobian(t_ns, |out, v, j| {
            out.jerk = Some(v);
            out.d_jerk_d_knots = Some(j);
        })
    }

    /// Apply the optimizer update `knot_i ← exp(delta) knot_i`.
    pub fn retract_knot(&mut self, i: usize, delta: &SVector<T, DOF>) -> Result<(), SplineError> {
        let len = self.knots.len();
        let knot = self
            .knots
            .get_mut(i)
            .ok_or(SplineError::KnotIndexOutOfRange { index: i, len })?;
        *knot = knot.retract(delta);
        Ok(())
    }

    pub fn push_knot(&mut self, knot: G) {
        self.knots.push_back(knot);
    }

    pub fn pop_back(&mut self) -> Option<G> {
        self.knots.pop_back()
    }

    /// Remove the first knot and shift the start time by one knot spacing.
    ///
    /// Returns `None` and leaves the spline untouched when it is empty or
    /// when the shifted start time would overflow `i64`.
    pub fn pop_front(&mut self) -> Option<G> {
        if self.knots.is_empty() {
            return None;
        }
        let Some(start_t_ns) = self.grid.start_t_ns().checked_add(self.grid.dt_ns()) else {
            log::warn!("cannot drop first knot, start time would overflow");
            return None;
        };
        let knot = self.knots.pop_front()?;
        self.grid.set_start_t_ns(start_t_ns);
        log::debug!("dropped first knot, spline now starts at {} ns", start_t_ns);
        Some(knot)
    }

    /// Resize the knot sequence to `n` knots, padding with the identity.
    pub fn resize(&mut self, n: usize) {
        log::debug!("resizing spline from {} to {} knots", self.knots.len(), n);
        self.knots.resize(n, G::identity());
    }

    pub fn clear(&mut self) {
        self.knots.clear();
    }

    pub fn knot(&self, i: usize) -> Option<&G> {
        self.knots.get(i)
    }

    pub fn knot_mut(&mut self, i: usize) -> Option<&mut G> {
        self.knots.get_mut(i)
    }

    pub fn knots(&self) -> &VecDeque<G> {
        &self.knots
    }

    pub fn knots_mut(&mut self) -> &mut VecDeque<G> {
        &mut self.knots
    }

    pub fn num_knots(&self) -> usize {
        self.knots.len()
    }

    pub fn dt_ns(&self) -> i64 {
        self.grid.dt_ns()
    }

    pub fn min_time_ns(&self) -> i64 {
        self.grid.start_t_ns()
    }

    pub fn max_time_ns(&self) -> i64 {
        self.grid.max_time_ns(self.knots.len(), N)
    }

    pub fn set_start_time_ns(&mut self, start_t_ns: i64) {
        self.grid.set_start_t_ns(start_t_ns);
    }

    /// Locate `t_ns` and let the helper fill `outputs`. Returns the index of
    /// the first contributing knot.
    fn evaluate_into(
        &self,
        t_ns: i64,
        outputs: LieOutputs<'_, G, T, DOF, N>,
    ) -> Result<usize, SplineError> {
        let loc = self.grid.locate(t_ns, self.knots.len(), N)?;
        let knots: [&G; N] = core::array::from_fn(|i| &self.knots[loc.segment + i]);
        let inv_dt = T::lit(self.grid.inv_dt());
        SplineHelper::<N>::evaluate_lie(&knots, T::lit(loc.phase), inv_dt, outputs);
        Ok(loc.segment)
    }

    fn derivative<F>(&self, t_ns: i64, select: F) -> Result<SVector<T, DOF>, SplineError>
    where
        F: for<'a> FnOnce(&mut LieOutputs<'a, G, T, DOF, N>, &'a mut SVector<T, DOF>),
    {
        let mut value = SVector::zeros();
        let mut outputs = LieOutputs::default();
        select(&mut outputs, &mut value);
        self.evaluate_into(t_ns, outputs)?;
        Ok(value)
    }

    fn derivative_with_jacobian<F>(
        &self,
        t_ns: i64,
        select: F,
    ) -> Result<(SVector<T, DOF>, LieJacobian<T, DOF, N>), SplineError>
    where
        F: for<'a> FnOnce(
            &mut LieOutputs<'a, G, T, DOF, N>,
            &'a mut SVector<T, DOF>,
            &'a mut Jacobians<T, DOF, N>,
        ),
    {
        let mut value = SVector::zeros();
        let mut d_val_d_knot = [SMatrix::zeros(); N];
        let mut outputs = LieOutputs::default();
        select(&mut outputs, &mut value, &mut d_val_d_knot);
        let start_idx = self.evaluate_into(t_ns, outputs)?;
        Ok((
            value,
            LieJacobian {
                start_idx,
                d_val_d_knot,
            },
        ))
    }
}

impl<const N: usize> LieSpline<So3<f64>, 3, N, f64> {
    /// Append `n` random rotation knots.
    ///
    /// The first knot is a random rotation, every following one is the
    /// previous knot composed with a relative rotation whose rotation vector
    /// is uniform in `[-π/4, π/4]³`. With `static_init` the first `N` knots
    /// are identical so the trajectory starts at rest.
    pub fn gen_random_trajectory<R>(&mut self, n: usize, static_init: bool, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        use core::f64::consts::{FRAC_PI_4, PI};

        let mut random_rotation = |scale: f64| {
            So3::exp(&Vector3::from_fn(|_, _| rng.gen_range(-1.0..=1.0) * scale))
        };

        let mut prev = match self.knots.back() {
            Some(last) => *last,
            None => random_rotation(PI),
        };

        let mut remaining = n;
        if static_init && remaining > 0 {
            let count = n.min(N);
            self.knots.extend(core::iter::repeat(prev).take(count));
            remaining -= count;
        }
        for _ in 0..remaining {
            let knot = if self.knots.is_empty() {
                prev
            } else {
                prev.compose(&random_rotation(FRAC_PI_4))
            };
            self.knots.push_back(knot);
            prev = knot;
        }

        log::debug!(
            "generated {} random rotation knots (static init: {}), spline has {}",
            n,
            static_init,
            self.knots.len()
        );
    }
}

impl<G, const DOF: usize, const N: usize, T> Index<usize> for LieSpline<G, DOF, N, T>
where
    T: Scalar,
    G: LieGroup<T, DOF>,
{
    type Output = G;

    fn index(&self, i: usize) -> &G {
        &self.knots[i]
    }
}

impl<G, const DOF: usize, const N: usize, T> IndexMut<usize> for LieSpline<G, DOF, N, T>
where
    T: Scalar,
    G: LieGroup<T, DOF>,
{
    fn index_mut(&mut self, i: usize) -> &mut G {
        &mut self.knots[i]
    }
}
