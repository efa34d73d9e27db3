//! Uniform B-spline in a `DIM`-dimensional vector space.

use alloc::collections::VecDeque;
use core::ops::{Index, IndexMut};

use nalgebra::SVector;
use rand::Rng;

use crate::error::SplineError;
use crate::helper::{RdJacobian, SplineHelper};
use crate::math::scalar::Scalar;
use crate::time::TimeGrid;

/// Uniform B-spline of order `N` (degree `N - 1`) with knots in `R^DIM`.
///
/// Knot `i` sits at `start_t_ns + i * dt_ns`; the spline can be evaluated on
/// `[min_time_ns, max_time_ns)`, where every query touches exactly `N`
/// consecutive knots.
///
/// # Type Parameters
/// * `DIM` - Dimension of the knots
/// * `N` - Spline order, at least 2
/// * `T` - Scalar type (`f64` by default)
///
/// # Example
/// ```rust
/// use nalgebra::Vector3;
/// use unispline::RdSpline;
///
/// let mut spline = RdSpline::<3, 4>::new(2_000_000_000)?;
/// for x in [0.0, 1.0, 2.0, 2.0, 1.0] {
///     spline.push_knot(Vector3::new(x, 0.0, 0.0));
/// }
/// let position = spline.evaluate::<0>(1_000_000_000)?;
/// let velocity = spline.velocity(1_000_000_000)?;
/// assert!(position.x > 0.0 && velocity.x > 0.0);
/// # Ok::<(), unispline::SplineError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct RdSpline<const DIM: usize, const N: usize, T = f64>
where
    T: Scalar,
{
    grid: TimeGrid,
    knots: VecDeque<SVector<T, DIM>>,
}

impl<const DIM: usize, const N: usize, T> RdSpline<DIM, N, T>
where
    T: Scalar,
{
    /// Spline order.
    pub const ORDER: usize = N;
    /// Spline degree.
    pub const DEG: usize = N - 1;

    /// Empty spline with knot spacing `dt_ns` whose first knot sits at time 0.
    pub fn new(dt_ns: i64) -> Result<Self, SplineError> {
        Self::with_start_time(dt_ns, 0)
    }

    /// Empty spline with knot spacing `dt_ns` whose first knot sits at
    /// `start_t_ns`.
    pub fn with_start_time(dt_ns: i64, start_t_ns: i64) -> Result<Self, SplineError> {
        Ok(Self::from_grid(TimeGrid::new(dt_ns, start_t_ns)?))
    }

    /// Empty spline on an already validated time grid.
    pub fn from_grid(grid: TimeGrid) -> Self {
        let () = SplineHelper::<N>::VALID_ORDER;
        log::debug!(
            "new R^{} spline of order {}: dt = {} ns, start = {} ns",
            DIM,
            N,
            grid.dt_ns(),
            grid.start_t_ns()
        );
        Self {
            grid,
            knots: VecDeque::new(),
        }
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    /// Evaluate the `D`-th time derivative at `t_ns`.
    ///
    /// `D = 0` is the position, `D = 1` the velocity in units per second and
    /// so on. Derivatives past the degree are zero.
    pub fn evaluate<const D: usize>(&self, t_ns: i64) -> Result<SVector<T, DIM>, SplineError> {
        let (_, knots, u) = self.window(t_ns)?;
        Ok(SplineHelper::<N>::evaluate(&knots, u, self.inv_dt(), D, None))
    }

    /// Evaluate the `D`-th time derivative at `t_ns` together with its
    /// sensitivity to each of the `N` knots it depends on.
    pub fn evaluate_with_jacobian<const D: usize>(
        &self,
        t_ns: i64,
    ) -> Result<(SVector<T, DIM>, RdJacobian<T, N>), SplineError> {
        let (start_idx, knots, u) = self.window(t_ns)?;
        let mut d_val_d_knot = [T::zero(); N];
        let value =
            SplineHelper::<N>::evaluate(&knots, u, self.inv_dt(), D, Some(&mut d_val_d_knot));
        Ok((
            value,
            RdJacobian {
                start_idx,
                d_val_d_knot,
            },
        ))
    }

    pub fn velocity(&self, t_ns: i64) -> Result<SVector<T, DIM>, SplineError> {
        self.evaluate::<1>(t_ns)
    }

    pub fn acceleration(&self, t_ns: i64) -> Result<SVector<T, DIM>, SplineError> {
        self.evaluate::<2>(t_ns)
    }

    pub fn jerk(&self, t_ns: i64) -> Result<SVector<T, DIM>, SplineError> {
        self.evaluate::<3>(t_ns)
    }

    pub fn push_knot(&mut self, knot: SVector<T, DIM>) {
        self.knots.push_back(knot);
    }

    pub fn pop_back(&mut self) -> Option<SVector<T, DIM>> {
        self.knots.pop_back()
    }

    /// Remove the first knot and shift the start time by one knot spacing,
    /// so the trajectory on the remaining domain is unchanged.
    ///
    /// Returns `None` and leaves the spline untouched when it is empty or
    /// when the shifted start time would overflow `i64`.
    pub fn pop_front(&mut self) -> Option<SVector<T, DIM>> {
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

    /// Resize the knot sequence to `n` knots, padding with zero vectors.
    pub fn resize(&mut self, n: usize) {
        log::debug!("resizing spline from {} to {} knots", self.knots.len(), n);
        self.knots.resize(n, SVector::zeros());
    }

    pub fn clear(&mut self) {
        self.knots.clear();
    }

    pub fn knot(&self, i: usize) -> Option<&SVector<T, DIM>> {
        self.knots.get(i)
    }

    /// Mutable access to knot `i`, which is how an optimizer applies its
    /// additive update.
    pub fn knot_mut(&mut self, i: usize) -> Option<&mut SVector<T, DIM>> {
        self.knots.get_mut(i)
    }

    pub fn knots(&self) -> &VecDeque<SVector<T, DIM>> {
        &self.knots
    }

    pub fn knots_mut(&mut self) -> &mut VecDeque<SVector<T, DIM>> {
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

    /// First timestamp past the valid domain.
    pub fn max_time_ns(&self) -> i64 {
        self.grid.max_time_ns(self.knots.len(), N)
    }

    pub fn set_start_time_ns(&mut self, start_t_ns: i64) {
        self.grid.set_start_t_ns(start_t_ns);
    }

    fn inv_dt(&self) -> T {
        T::lit(self.grid.inv_dt())
    }

    /// Index of the first contributing knot, the `N` knots of the segment
    /// and the phase inside it.
    fn window(&self, t_ns: i64) -> Result<(usize, [&SVector<T, DIM>; N], T), SplineError> {
        let loc = self.grid.locate(t_ns, self.knots.len(), N)?;
        let knots = core::array::from_fn(|i| &self.knots[loc.segment + i]);
        Ok((loc.segment, knots, T::lit(loc.phase)))
    }
}

impl<const DIM: usize, const N: usize> RdSpline<DIM, N, f64> {
    /// Append `n` random knots with coordinates uniform in `[-5, 5]`.
    ///
    /// With `static_init` the first `N` knots are identical, so the
    /// trajectory starts at rest.
    pub fn gen_random_trajectory<R>(&mut self, n: usize, static_init: bool, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        let mut random_knot = || SVector::<f64, DIM>::from_fn(|_, _| rng.gen_range(-5.0..=5.0));

        let mut remaining = n;
        if static_init {
            let knot = random_knot();
            let count = n.min(N);
            self.knots.extend(core::iter::repeat(knot).take(count));
            remaining -= count;
        }
        for _ in 0..remaining {
            self.knots.push_back(random_knot());
        }

        log::debug!(
            "generated {} random knots (static init: {}), spline has {}",
            n,
            static_init,
            self.knots.len()
        );
    }
}

impl<const DIM: usize, const N: usize, T> Index<usize> for RdSpline<DIM, N, T>
where
    T: Scalar,
{
    type Output = SVector<T, DIM>;

    /// # Panics
    /// If `i >= num_knots()`.
    fn index(&self, i: usize) -> &Self::Output {
        &self.knots[i]
    }
}

impl<const DIM: usize, const N: usize, T> IndexMut<usize> for RdSpline<DIM, N, T>
where
    T: Scalar,
{
    fn index_mut(&mut self, i: usize) -> &mut Self::Output {
        &mut self.knots[i]
    }
}
