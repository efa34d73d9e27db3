//! Splines over a uniform time grid.
//!
//! Every spline owns its knots and a [`TimeGrid`](crate::time::TimeGrid),
//! maps a query time to the `N` contributing knots and delegates the math to
//! [`SplineHelper`](crate::helper::SplineHelper).

mod manifold;
mod rd;
mod se3;


pub use manifold::{LieSpline, So3Spline};
pub use rd::RdSpline;
pub use se3::Se3Spline;
