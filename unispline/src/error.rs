//! Error types for spline construction and evaluation.

use thiserror::Error;

/// Errors reported by spline construction, evaluation and knot updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SplineError {
    /// The knot spacing must be a strictly positive number of nanoseconds.
    #[error("time step must be strictly positive, got {dt_ns} ns")]
    NonPositiveTimeStep { dt_ns: i64 },
    /// Fewer knots than the spline order, so no segment can be evaluated.
    #[error("spline needs at least {required} knots, has {available}")]
    NotEnoughKnots { required: usize, available: usize },
    /// The query time lies outside `[min_t_ns, max_t_ns)`.
    #[error("time {t_ns} ns outside of the valid range [{min_t_ns}, {max_t_ns}) ns")]
    TimeOutOfRange {
        t_ns: i64,
        min_t_ns: i64,
        max_t_ns: i64,
    },
    /// A knot index past the end of the knot sequence.
    #[error("knot index {index} out of range for {len} knots")]
    KnotIndexOutOfRange { index: usize, len: usize },
}
