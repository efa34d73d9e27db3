//! Scalar abstraction shared by every spline formula.
//!
//! Everything in this crate is written against [`Scalar`] so the same code
//! runs on `f32`/`f64` and on automatic-differentiation numbers that
//! implement `nalgebra::RealField`.

use nalgebra::RealField;

pub trait Scalar: RealField + Copy {
    /// Convert an `f64` literal (blending constant, threshold) into `Self`.
    #[inline(always)]
    fn lit(value: f64) -> Self {
        nalgebra::convert(value)
    }

    /// `self` raised to a non-negative integer power by repeated multiplication.
    #[inline]
    fn powu(self, exp: usize) -> Self {
        let mut res = Self::one();
        for _ in 0..exp {
            res *= self;
        }
        res
    }
}

impl<T: RealField + Copy> Scalar for T {}

/// Squared rotation angle below which closed-form SO(3) expressions are
/// replaced by their Taylor expansions.
pub(crate) const SMALL_ANGLE_SQ: f64 = 1e-6;
