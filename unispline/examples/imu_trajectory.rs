use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use unispline::Se3Spline;

fn main() -> Result<(), unispline::SplineError> {
    let dt_ns: i64 = 200_000_000;
    let imu_period_ns: i64 = 5_000_000;
    let gyro_noise = 0.01;
    let accel_noise = 0.1;
    let gravity = Vector3::new(0.0, 0.0, -9.81);

    let mut rng = StdRng::seed_from_u64(42);
    let mut trajectory = Se3Spline::<5>::new(dt_ns)?;
    trajectory.gen_random_trajectory(20, true, &mut rng);

    println!(
        "trajectory with {} knots, valid on [{}, {}) ns",
        trajectory.num_knots(),
        trajectory.min_time_ns(),
        trajectory.max_time_ns()
    );

    let noise = |rng: &mut StdRng, sigma: f64| {
        Vector3::from_fn(|_, _| rng.gen_range(-1.0..1.0) * sigma)
    };

    // simulated IMU readings
    let mut step = 0;
    for t_ns in (trajectory.min_time_ns()..trajectory.max_time_ns()).step_by(imu_period_ns as usize)
    {
        let gyro = trajectory.rot_vel_body(t_ns)? + noise(&mut rng, gyro_noise);
        let accel = trajectory.specific_force_body(t_ns, &gravity)? + noise(&mut rng, accel_noise);

        if step % 100 == 0 {
            let pose = trajectory.pose(t_ns)?;
            let p = pose.translation.vector;
            println!(
                "t {:.2} s: pos [{:.2}, {:.2}, {:.2}], gyro [{:.3}, {:.3}, {:.3}], accel [{:.2}, {:.2}, {:.2}]",
                t_ns as f64 * 1e-9,
                p.x,
                p.y,
                p.z,
                gyro.x,
                gyro.y,
                gyro.z,
                accel.x,
                accel.y,
                accel.z
            );
        }
        step += 1;
    }

    // first-order prediction of a knot update, as a solver would use it
    let t_ns = trajectory.min_time_ns() + 7 * dt_ns + dt_ns / 3;
    let (gyro, jacobian) = trajectory
        .so3_spline()
        .velocity_body_with_jacobian(t_ns)?;
    let knot = jacobian.start_idx + 2;
    let delta = Vector3::new(0.002, -0.001, 0.003);
    let predicted = gyro + jacobian.d_val_d_knot[2] * delta;

    trajectory.so3_spline_mut().retract_knot(knot, &delta)?;
    let actual = trajectory.rot_vel_body(t_ns)?;
    println!(
        "updating knot {}: predicted gyro change {:.2e}, linearization error {:.2e}",
        knot,
        (predicted - gyro).norm(),
        (predicted - actual).norm()
    );

    Ok(())
}
