//! Stateless evaluation of uniform B-spline segments.
//!
//! [`SplineHelper`] combines `N` consecutive knots of a uniform B-spline of
//! order `N` into a value or time derivative, either by direct blending
//! (vector spaces) or by the cumulative product of exponentials (Lie
//! groups). Both paths can additionally report the Jacobian of the result
//! with respect to every contributing knot, which is what a least-squares
//! solver needs to optimize the knots.
//!
//! The helper owns no data: callers hand in references to the knots of the
//! segment, the phase `u ∈ [0, 1)` inside the segment and the inverse knot
//! spacing `inv_dt` in 1/s. All buffers are fixed-size arrays of length `N`.

use core::marker::PhantomData;

use nalgebra::{SMatrix, SVector};

use crate::lie::LieGroup;
use crate::math::scalar::Scalar;

mod blending;


/// Per-knot sensitivities of a vector-space spline evaluation.
///
/// The Jacobian block of knot `start_idx + i` is `d_val_d_knot[i]` times the
/// identity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RdJacobian<T, const N: usize> {
    /// Index of the first knot that influenced the evaluation.
    pub start_idx: usize,
    pub d_val_d_knot: [T; N],
}

/// Per-knot Jacobians of a Lie spline evaluation with respect to a left
/// perturbation `knot ← exp(ε) knot` of each contributing knot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LieJacobian<T, const DOF: usize, const N: usize>
where
    T: Scalar,
{
    /// Index of the first knot that influenced the evaluation.
    pub start_idx: usize,
    pub d_val_d_knot: [SMatrix<T, DOF, DOF>; N],
}

/// Output slots of [`SplineHelper::evaluate_lie`].
///
/// Every slot is optional; leaving it `None` tells the helper that the
/// quantity is not needed, and work that only serves empty slots is skipped.
/// The Jacobian slots receive one `DOF x DOF` block per contributing knot,
/// for a left perturbation of that knot. The value Jacobian maps into a
/// left perturbation of the evaluated group element.
pub struct LieOutputs<'a, G, T, const DOF: usize, const N: usize>
where
    T: Scalar,
{
    pub value: Option<&'a mut G>,
    pub velocity: Option<&'a mut SVector<T, DOF>>,
    pub acceleration: Option<&'a mut SVector<T, DOF>>,
    pub jerk: Option<&'a mut SVector<T, DOF>>,
    pub d_value_d_knots: Option<&'a mut [SMatrix<T, DOF, DOF>; N]>,
    pub d_velocity_d_knots: Option<&'a mut [SMatrix<T, DOF, DOF>; N]>,
    pub d_acceleration_d_knots: Option<&'a mut [SMatrix<T, DOF, DOF>; N]>,
    pub d_jerk_d_knots: Option<&'a mut [SMatrix<T, DOF, DOF>; N]>,
}

impl<G, T, const DOF: usize, const N: usize> Default for LieOutputs<'_, G, T, DOF, N>
where
    T: Scalar,
{
    fn default() -> Self {
        Self {
            value: None,
            velocity: None,
            acceleration: None,
            jerk: None,
            d_value_d_knots: None,
            d_velocity_d_knots: None,
            d_acceleration_d_knots: None,
            d_jerk_d_knots: None,
        }
    }
}

impl<G, T, const DOF: usize, const N: usize> LieOutputs<'_, G, T, DOF, N>
where
    T: Scalar,
{
    /// Highest time derivative that has to be propagated.
    fn derivative_order(&self) -> usize {
        if self.jerk.is_some() || self.d_jerk_d_knots.is_some() {
            3
        } else if self.acceleration.is_some() || self.d_acceleration_d_knots.is_some() {
            2
        } else if self.velocity.is_some() || self.d_velocity_d_knots.is_some() {
            1
        } else {
            0
        }
    }

    /// Highest time derivative whose Jacobian was requested, if any.
    fn jacobian_order(&self) -> Option<usize> {
        if self.d_jerk_d_knots.is_some() {
            Some(3)
        } else if self.d_acceleration_d_knots.is_some() {
            Some(2)
        } else if self.d_velocity_d_knots.is_some() {
            Some(1)
        } else if self.d_value_d_knots.is_some() {
            Some(0)
        } else {
            None
        }
    }
}

/// Basis and Jacobian computations for uniform B-splines of order `N`
/// (degree `N - 1`).
pub struct SplineHelper<const N: usize> {
    _order: PhantomData<[(); N]>,
}

impl<const N: usize> SplineHelper<N> {
    /// Degree of the spline.
    pub const DEG: usize = N - 1;

    /// Fails to compile for splines of order below 2, which have no
    /// meaningful derivative.
    pub(crate) const VALID_ORDER: () = assert!(N >= 2, "spline order must be at least 2");

    pub const BASE_COEFFICIENTS: [[f64; N]; N] = blending::base_coefficients::<N>();
    pub const BLENDING_MATRIX: [[f64; N]; N] = blending::blending_matrix::<N>(false);
    pub const CUMULATIVE_BLENDING_MATRIX: [[f64; N]; N] = blending::blending_matrix::<N>(true);

    /// The `derivative`-th derivative of the monomial vector `[1, u, u², …]`
    /// with respect to `u`.
    pub fn base_coeffs_with_time<T: Scalar>(derivative: usize, u: T) -> [T; N] {
        let mut res = [T::zero(); N];
        if derivative < N {
            res[derivative] = T::lit(Self::BASE_COEFFICIENTS[derivative][derivative]);
            let mut u_pow = u;
            for j in derivative + 1..N {
                res[j] = T::lit(Self::BASE_COEFFICIENTS[derivative][j]) * u_pow;
                u_pow *= u;
            }
        }
        res
    }

    /// Blending weights of the `N` knots for the `derivative`-th time
    /// derivative at phase `u`.
    ///
    /// Weights of the value sum to one, weights of every derivative to zero.
    pub fn blending_coefficients<T: Scalar>(derivative: usize, u: T, inv_dt: T) -> [T; N] {
        Self::apply_matrix(&Self::BLENDING_MATRIX, derivative, u, inv_dt)
    }

    /// Cumulative blending weights for the `derivative`-th time derivative.
    ///
    /// Entry `i > 0` weights the increment between knots `i - 1` and `i`;
    /// entry 0 is one for the value and zero for every derivative.
    pub fn cumulative_coefficients<T: Scalar>(derivative: usize, u: T, inv_dt: T) -> [T; N] {
        Self::apply_matrix(&Self::CUMULATIVE_BLENDING_MATRIX, derivative, u, inv_dt)
    }

    fn apply_matrix<T: Scalar>(
        matrix: &[[f64; N]; N],
        derivative: usize,
        u: T,
        inv_dt: T,
    ) -> [T; N] {
        let basis = Self::base_coeffs_with_time(derivative, u);
        let scale = inv_dt.powu(derivative);

        let mut coeff = [T::zero(); N];
        for (c, row) in coeff.iter_mut().zip(matrix.iter()) {
            let mut sum = T::zero();
            for (&m, &b) in row.iter().zip(basis.iter()) {
                sum += T::lit(m) * b;
            }
            *c = sum * scale;
        }
        coeff
    }

    /// Evaluate the `derivative`-th time derivative of a vector-space
    /// segment.
    ///
    /// The result is `Σ_i coeff_i(u) · knots[i]`. When `d_val_d_knots` is
    /// given it receives `coeff_i(u)`: the Jacobian with respect to knot `i`
    /// is that scalar times the identity and does not depend on the knots.
    pub fn evaluate<T: Scalar, const DIM: usize>(
        knots: &[&SVector<T, DIM>; N],
        u: T,
        inv_dt: T,
        derivative: usize,
        d_val_d_knots: Option<&mut [T; N]>,
    ) -> SVector<T, DIM> {
        let coeff = Self::blending_coefficients(derivative, u, inv_dt);

        let mut res = SVector::<T, DIM>::zeros();
        for (&c, knot) in coeff.iter().zip(knots.iter()) {
            res += *knot * c;
        }

        if let Some(jacobian) = d_val_d_knots {
            *jacobian = coeff;
        }

        res
    }

    /// Evaluate a cumulative B-spline segment on the Lie group `G`.
    ///
    /// The value is `knots[0] · Π_i exp(k_i δ_i)` with
    /// `δ_i = log(knots[i]⁻¹ knots[i+1])` and `k_i` the cumulative blending
    /// weights. Body-frame derivatives are propagated through the product:
    ///
    /// ```text
    /// ω ← Ad(exp(-k δ)) ω + k' δ
    /// α ← Ad(exp(-k δ)) α + k'' δ + [ω, k' δ]
    /// j ← Ad(exp(-k δ)) j + k''' δ + [k'' ω + 2 k' α - k' [ω, k' δ], δ]
    /// ```
    ///
    /// Only the slots present in `outputs` are written, and only the
    /// derivative orders and Jacobians they need are computed.
    pub fn evaluate_lie<T, G, const DOF: usize>(
        knots: &[&G; N],
        u: T,
        inv_dt: T,
        outputs: LieOutputs<'_, G, T, DOF, N>,
    ) where
        T: Scalar,
        G: LieGroup<T, DOF>,
    {
        let order = outputs.derivative_order();
        let jacobian_order = outputs.jacobian_order();
        let need_jacobians = jacobian_order.is_some();
        let jacobian_up_to = |k: usize| jacobian_order.is_some_and(|j| j >= k);
        let need_value_jacobian = outputs.d_value_d_knots.is_some();
        let need_value = outputs.value.is_some() || need_value_jacobian;

        let coeff = Self::cumulative_coefficients(0, u, inv_dt);
        let dcoeff = if order >= 1 {
            Self::cumulative_coefficients(1, u, inv_dt)
        } else {
            [T::zero(); N]
        };
        let ddcoeff = if order >= 2 {
            Self::cumulative_coefficients(2, u, inv_dt)
        } else {
            [T::zero(); N]
        };
        let dddcoeff = if order >= 3 {
            Self::cumulative_coefficients(3, u, inv_dt)
        } else {
            [T::zero(); N]
        };

        let zero = SMatrix::<T, DOF, DOF>::zeros();
        let identity = SMatrix::<T, DOF, DOF>::identity();

        let mut transform = knots[0].clone();
        let mut rot_vel = SVector::<T, DOF>::zeros();
        let mut rot_accel = SVector::<T, DOF>::zeros();
        let mut rot_jerk = SVector::<T, DOF>::zeros();

        // Sensitivities with respect to the increments δ_i; slot i is only
        // touched from step i on, and slot DEG is never used.
        let mut d_val_d_delta = [zero; N];
        let mut d_vel_d_delta = [zero; N];
        let mut d_accel_d_delta = [zero; N];
        let mut d_jerk_d_delta = [zero; N];
        // dδ_i / dknot_{i+1}; dδ_i / dknot_i is its negative.
        let mut d_delta_d_knot = [zero; N];

        for i in 0..Self::DEG {
            let p0_inv = knots[i].inverse();
            let delta = p0_inv.compose(knots[i + 1]).log();
            let k = coeff[i + 1];
            let kdelta = delta * k;
            let exp_kdelta = G::exp(&kdelta);

            let jl_kdelta = if need_jacobians {
                d_delta_d_knot[i] = G::left_jacobian_inverse(&delta) * p0_inv.adjoint();
                G::left_jacobian(&kdelta)
            } else {
                identity
            };

            if need_value {
                if need_value_jacobian {
                    d_val_d_delta[i] = transform.adjoint() * jl_kdelta * k;
                }
                transform = transform.compose(&exp_kdelta);
            }

            if order == 0 {
                continue;
            }

            let a = exp_kdelta.inverse().adjoint();
            let (dk, ddk, dddk) = (dcoeff[i + 1], ddcoeff[i + 1], dddcoeff[i + 1]);

            let vel_prev = rot_vel;
            rot_vel = a * rot_vel + delta * dk;
            if jacobian_up_to(1) {
                for d in d_vel_d_delta[..=i].iter_mut() {
                    *d = a * *d;
                }
                d_vel_d_delta[i] += a * G::ad(&vel_prev) * jl_kdelta * k + identity * dk;
            }

            if order < 2 {
                continue;
            }

            let ad_delta = G::ad(&delta);
            let vel_current = delta * dk;
            let accel_lie_bracket = G::lie_bracket(&rot_vel, &vel_current);

            let accel_prev = rot_accel;
            rot_accel = a * rot_accel + delta * ddk + accel_lie_bracket;
            if jacobian_up_to(2) {
                for (d_accel, d_vel) in d_accel_d_delta[..=i].iter_mut().zip(&d_vel_d_delta) {
                    *d_accel = a * *d_accel - ad_delta * d_vel * dk;
                }
                d_accel_d_delta[i] += a * G::ad(&accel_prev) * jl_kdelta * k
                    + identity * ddk
                    + G::ad(&rot_vel) * dk;
            }

            if order < 3 {
                continue;
            }

            let jerk_prev = rot_jerk;
            let x = rot_vel * ddk + rot_accel * (dk + dk) - accel_lie_bracket * dk;
            rot_jerk = a * rot_jerk + delta * dddk + G::lie_bracket(&x, &delta);
            if jacobian_up_to(3) {
                let ad_vel = G::ad(&rot_vel);
                for j in 0..=i {
                    let mut d_bracket = -(ad_delta * d_vel_d_delta[j]) * dk;
                    if j == i {
                        d_bracket += ad_vel * dk;
                    }
                    let d_x = d_vel_d_delta[j] * ddk + d_accel_d_delta[j] * (dk + dk)
                        - d_bracket * dk;
                    d_jerk_d_delta[j] = a * d_jerk_d_delta[j] - ad_delta * d_x;
                }
                d_jerk_d_delta[i] +=
                    a * G::ad(&jerk_prev) * jl_kdelta * k + identity * dddk + G::ad(&x);
            }
        }

        let LieOutputs {
            value,
            velocity,
            acceleration,
            jerk,
            d_value_d_knots,
            d_velocity_d_knots,
            d_acceleration_d_knots,
            d_jerk_d_knots,
        } = outputs;

        if let Some(value) = value {
            *value = transform;
        }
        if let Some(velocity) = velocity {
            *velocity = rot_vel;
        }
        if let Some(acceleration) = acceleration {
            *acceleration = rot_accel;
        }
        if let Some(jerk) = jerk {
            *jerk = rot_jerk;
        }

        if let Some(jacobian) = d_value_d_knots {
            *jacobian = Self::chain_to_knots(&d_val_d_delta, &d_delta_d_knot);
            jacobian[0] += identity;
        }
        if let Some(jacobian) = d_velocity_d_knots {
            *jacobian = Self::chain_to_knots(&d_vel_d_delta, &d_delta_d_knot);
        }
        if let Some(jacobian) = d_acceleration_d_knots {
            *jacobian = Self::chain_to_knots(&d_accel_d_delta, &d_delta_d_knot);
        }
        if let Some(jacobian) = d_jerk_d_knots {
            *jacobian = Self::chain_to_knots(&d_jerk_d_delta, &d_delta_d_knot);
        }
    }

    /// Map sensitivities with respect to the increments δ_i onto the knots:
    /// δ_i depends on knot `i` with `-M_i` and on knot `i + 1` with `M_i`.
    fn chain_to_knots<T: Scalar, const DOF: usize>(
        d_out_d_delta: &[SMatrix<T, DOF, DOF>; N],
        d_delta_d_knot: &[SMatrix<T, DOF, DOF>; N],
    ) -> [SMatrix<T, DOF, DOF>; N] {
        let mut res = [SMatrix::<T, DOF, DOF>::zeros(); N];
        for i in 0..Self::DEG {
            let block = d_out_d_delta[i] * d_delta_d_knot[i];
            res[i] -= block;
            res[i + 1] += block;
        }
        res
    }
}
