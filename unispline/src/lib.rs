//! Uniform cumulative B-splines in Rust
//!
//! Continuous-time trajectories represented by uniformly spaced knots,
//! either in a vector space ([`RdSpline`]) or on a Lie group
//! ([`LieSpline`], [`So3Spline`]). Values and time derivatives up to jerk
//! can be evaluated at any timestamp of the valid domain, together with
//! their analytic Jacobians with respect to the contributing knots, so the
//! knots can be optimized by a nonlinear least-squares solver.
//!
//! Time is measured in integer nanoseconds; derivatives are per second.
//! The spline order is a const generic, the scalar type any
//! `nalgebra::RealField + Copy`.
//!
//! ```rust
//! use nalgebra::Vector3;
//! use unispline::{lie::LieGroup, lie::so3::So3, So3Spline};
//!
//! let mut spline = So3Spline::<4>::new(100_000_000)?;
//! for i in 0..6 {
//!     spline.push_knot(So3::exp(&Vector3::new(0.0, 0.0, 0.1 * i as f64)));
//! }
//! // constant yaw rate of 0.1 rad per 0.1 s
//! let omega = spline.velocity_body(150_000_000)?;
//! assert!((omega.z - 1.0).abs() < 1e-9);
//! # Ok::<(), unispline::SplineError>(())
//! ```

extern crate alloc;

pub mod error;
pub mod helper;
pub mod lie;
pub mod math;
pub mod spline;
pub mod time;

pub use error::SplineError;
pub use helper::{LieJacobian, LieOutputs, RdJacobian, SplineHelper};
pub use spline::{LieSpline, RdSpline, Se3Spline, So3Spline};
pub use time::{SegmentLocation, TimeGrid};
