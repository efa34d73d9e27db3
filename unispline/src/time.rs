//! Uniform time grid shared by all splines.
//!
//! A [`TimeGrid`] is the validated timing configuration of a spline: knot
//! spacing and the timestamp of knot 0, both in nanoseconds. It turns a
//! query time into the index of the first contributing knot and the phase
//! inside that segment.

use crate::error::SplineError;

/// Largest `f64` below one.
const LAST_PHASE: f64 = 1.0 - f64::EPSILON / 2.0;

/// Position of a query time on the knot grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentLocation {
    /// Index of the first of the `N` knots that influence the query.
    pub segment: usize,
    /// Fractional position inside the segment, in `[0, 1)`.
    pub phase: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeGrid {
    dt_ns: i64,
    start_t_ns: i64,
}

impl TimeGrid {
    /// Create a grid with knot spacing `dt_ns` starting at `start_t_ns`.
    ///
    /// Fails with [`SplineError::NonPositiveTimeStep`] unless `dt_ns > 0`.
    pub fn new(dt_ns: i64, start_t_ns: i64) -> Result<Self, SplineError> {
        if dt_ns <= 0 {
            return Err(SplineError::NonPositiveTimeStep { dt_ns });
        }
        Ok(Self { dt_ns, start_t_ns })
    }

    pub fn dt_ns(&self) -> i64 {
        self.dt_ns
    }

    pub fn start_t_ns(&self) -> i64 {
        self.start_t_ns
    }

    pub fn set_start_t_ns(&mut self, start_t_ns: i64) {
        self.start_t_ns = start_t_ns;
    }

    /// Inverse knot spacing in 1/s.
    pub fn inv_dt(&self) -> f64 {
        1e9 / self.dt_ns as f64
    }

    /// First timestamp past the valid range of a spline of order `order`
    /// with `num_knots` knots. Equals the start time when there are fewer
    /// than `order` knots.
    ///
    /// Clamped to `i64::MAX` when the true end is not representable. Every
    /// query time below the clamp still lies inside the domain.
    pub fn max_time_ns(&self, num_knots: usize, order: usize) -> i64 {
        let segments = (num_knots + 1).saturating_sub(order) as i64;
        self.start_t_ns
            .saturating_add(segments.saturating_mul(self.dt_ns))
    }

    /// Locate `t_ns` on the grid of a spline of order `order` holding
    /// `num_knots` knots.
    pub fn locate(
        &self,
        t_ns: i64,
        num_knots: usize,
        order: usize,
    ) -> Result<SegmentLocation, SplineError> {
        if num_knots < order {
            log::trace!("rejecting query at {t_ns} ns: {num_knots} knots, order {order}");
            return Err(SplineError::NotEnoughKnots {
                required: order,
                available: num_knots,
            });
        }

        let out_of_range = || {
            log::trace!("rejecting query at {t_ns} ns: outside of the spline domain");
            SplineError::TimeOutOfRange {
                t_ns,
                min_t_ns: self.start_t_ns,
                max_t_ns: self.max_time_ns(num_knots, order),
            }
        };

        let elapsed = match t_ns.checked_sub(self.start_t_ns) {
            Some(elapsed) if elapsed >= 0 => elapsed,
            _ => return Err(out_of_range()),
        };

        let segment = elapsed / self.dt_ns;
        let segment = usize::try_from(segment).map_err(|_| out_of_range())?;
        if segment + order > num_knots {
            return Err(out_of_range());
        }

        // the ratio rounds up to 1 for remainders close to a dt above 2^53
        let phase = ((elapsed % self.dt_ns) as f64 / self.dt_ns as f64).min(LAST_PHASE);

        Ok(SegmentLocation { segment, phase })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_time_step() {
        assert_eq!(
            TimeGrid::new(0, 0),
            Err(SplineError::NonPositiveTimeStep { dt_ns: 0 })
        );
        assert_eq!(
            TimeGrid::new(-5, 0),
            Err(SplineError::NonPositiveTimeStep { dt_ns: -5 })
        );
    }

    #[test]
    fn max_time_covers_full_segments() {
        let grid = TimeGrid::new(100, 1_000).unwrap();
        assert_eq!(grid.max_time_ns(3, 4), 1_000);
        assert_eq!(grid.max_time_ns(4, 4), 1_100);
        assert_eq!(grid.max_time_ns(10, 4), 1_700);
    }

    #[test]
    fn locate_decomposes_time() {
        let grid = TimeGrid::new(2_000_000_000, 0).unwrap();
        let loc = grid.locate(1_000_000_000, 5, 4).unwrap();
        assert_eq!(loc.segment, 0);
        assert!((loc.phase - 0.5).abs() < 1e-15);

        let loc = grid.locate(3_500_000_000, 5, 4).unwrap();
        assert_eq!(loc.segment, 1);
        assert!((loc.phase - 0.75).abs() < 1e-15);
    }

    #[test]
    fn locate_respects_start_time() {
        let grid = TimeGrid::new(10, -35).unwrap();
        let loc = grid.locate(-20, 6, 4).unwrap();
        assert_eq!(loc.segment, 1);
        assert!((loc.phase - 0.5).abs() < 1e-15);
    }

    #[test]
    fn locate_rejects_out_of_range() {
        let grid = TimeGrid::new(10, 100).unwrap();
        let max = grid.max_time_ns(6, 4);
        assert_eq!(max, 130);

        assert!(grid.locate(100, 6, 4).is_ok());
        assert!(grid.locate(max - 1, 6, 4).is_ok());
        assert_eq!(
            grid.locate(99, 6, 4),
            Err(SplineError::TimeOutOfRange {
                t_ns: 99,
                min_t_ns: 100,
                max_t_ns: 130
            })
        );
        assert!(matches!(
            grid.locate(max, 6, 4),
            Err(SplineError::TimeOutOfRange { .. })
        ));
        assert!(matches!(
            grid.locate(i64::MIN, 6, 4),
            Err(SplineError::TimeOutOfRange { .. })
        ));
    }

    #[test]
    fn phase_stays_below_one_for_huge_time_step() {
        let dt_ns = (1 << 60) + 1;
        let grid = TimeGrid::new(dt_ns, 0).unwrap();
        let loc = grid.locate(dt_ns - 1, 2, 2).unwrap();
        assert_eq!(loc.segment, 0);
        assert!(loc.phase < 1.0);
        assert!(loc.phase > 0.5);
    }

    #[test]
    fn max_time_clamps_at_the_end_of_the_time_axis() {
        let grid = TimeGrid::new(10, i64::MAX - 25).unwrap();
        assert_eq!(grid.max_time_ns(8, 4), i64::MAX);
        assert!(grid.locate(i64::MAX - 1, 8, 4).is_ok());
        assert!(grid.locate(i64::MAX - 25, 8, 4).is_ok());
    }

    #[test]
    fn locate_requires_order_knots() {
        let grid = TimeGrid::new(10, 0).unwrap();
        assert_eq!(
            grid.locate(0, 3, 4),
            Err(SplineError::NotEnoughKnots {
                required: 4,
                available: 3
            })
        );
    }
}
