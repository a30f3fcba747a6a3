use nalgebra::{UnitQuaternion, Vector3};
use rand::prelude::*;
use rand_pcg::Pcg64;
use tilt_compass_ahrs::{
    Ahrs, AhrsSettings, Axis, AxisAssignment, AxisCalibrator, DeviceOrientation, HardIronCalibrator, HeadingMode,
    OrientationTracker, QuaternionExt, SensorSample, TrackerSettings, low_pass, madgwick_step, transform,
};

const EPSILON: f32 = 1e-6;
const DT: f32 = 1.0 / 60.0;

/// Earth field with ~60° inclination in North-East-Down
fn earth_field() -> Vector3<f32> {
    Vector3::new(0.5, 0.0, 0.866)
}

/// Readings a motionless device at `truth` would report
fn readings_at(truth: &UnitQuaternion<f32>) -> (Vector3<f32>, Vector3<f32>) {
    (
        truth.inverse_transform_vector(&Vector3::z()),
        truth.inverse_transform_vector(&earth_field()),
    )
}

fn random_vector(rng: &mut Pcg64, range: f32) -> Vector3<f32> {
    Vector3::new(
        rng.random_range(-range..range),
        rng.random_range(-range..range),
        rng.random_range(-range..range),
    )
}

/// The quaternion stays unit length whatever the filter is fed
#[test]
fn test_unit_norm_under_random_input() {
    let mut rng = Pcg64::seed_from_u64(0x5eed);

    for beta in [0.0, 0.1, 0.8, 2.5] {
        let mut ahrs = Ahrs::with_settings(AhrsSettings {
            beta,
            accelerometer_smoothing: 0.3,
            magnetometer_smoothing: 0.5,
            ..Default::default()
        });

        for i in 0..5000 {
            let gyroscope = random_vector(&mut rng, 10.0);
            let accelerometer = random_vector(&mut rng, 20.0);
            let magnetometer = random_vector(&mut rng, 80.0);
            let delta_time = rng.random_range(0.001..0.1);

            let q = ahrs.update(gyroscope, accelerometer, magnetometer, delta_time);
            let norm = q.quaternion().norm();
            assert!(
                (norm - 1.0).abs() < 1e-4,
                "beta {} tick {}: norm {} for {:?}",
                beta,
                i,
                norm,
                q
            );
        }
    }
}

#[test]
fn test_degenerate_input_returns_identity() {
    let mut rng = Pcg64::seed_from_u64(7);

    for _ in 0..100 {
        let start = UnitQuaternion::from_euler_angles(
            rng.random_range(-3.0..3.0),
            rng.random_range(-1.5..1.5),
            rng.random_range(-3.0..3.0),
        );
        let gyroscope = random_vector(&mut rng, 5.0);
        let vector = random_vector(&mut rng, 50.0);

        let q = madgwick_step(&start, gyroscope, Vector3::zeros(), vector, 0.1, DT);
        assert_eq!(q, UnitQuaternion::identity());

        let q = madgwick_step(&start, gyroscope, vector, Vector3::zeros(), 0.1, DT);
        assert_eq!(q, UnitQuaternion::identity());
    }
}

/// A motionless device settles on its true attitude within 1000 ticks at 60 Hz
#[test]
fn test_static_convergence() {
    let attitudes = [
        (0.0, 0.0, 0.0),
        (0.0, 0.0, 90.0),
        (0.0, 0.0, 179.0),
        (0.0, 0.0, 180.0),
        (0.0, 0.0, -90.0),
        (180.0, 0.0, 0.0),
        (170.0, 0.0, 0.0),
        (20.0, -15.0, 40.0),
    ];

    for (roll, pitch, yaw) in attitudes {
        let truth = UnitQuaternion::from_euler_degrees(roll, pitch, yaw);
        let (accelerometer, magnetometer) = readings_at(&truth);
        let mut ahrs = Ahrs::new();

        for _ in 0..1000 {
            ahrs.update(Vector3::zeros(), accelerometer, magnetometer, DT);
        }

        let error = ahrs.quaternion().angle_to(&truth).to_degrees();
        assert!(error < 1.0, "({}, {}, {}): {:.3}° from truth", roll, pitch, yaw, error);

        let gravity = ahrs.gravity();
        assert!((gravity - accelerometer).norm() < 0.02, "({}, {}, {}): gravity {:?}", roll, pitch, yaw, gravity);
        assert!(!ahrs.flags().degenerate_input);
    }
}

/// Face down is the case where the gradient vanishes on the wrong side
#[test]
fn test_face_down_from_upright_estimate() {
    let truth = UnitQuaternion::from_euler_degrees(180.0, 0.0, 0.0);
    let (accelerometer, magnetometer) = readings_at(&truth);

    let mut ahrs = Ahrs::new();
    ahrs.set_quaternion(UnitQuaternion::identity());
    for _ in 0..1000 {
        ahrs.update(Vector3::zeros(), accelerometer, magnetometer, DT);
    }

    let error = ahrs.quaternion().angle_to(&truth).to_degrees();
    assert!(error < 1.0, "{:.3}° from truth", error);
    assert!(ahrs.gravity().z < -0.99);
}

/// The gradient descent itself pulls a wrong estimate back in
#[test]
fn test_recovers_from_offset_estimate() {
    let truth = UnitQuaternion::from_euler_degrees(20.0, -15.0, 40.0);
    let (accelerometer, magnetometer) = readings_at(&truth);

    let mut ahrs = Ahrs::new();
    let offset = UnitQuaternion::from_scaled_axis(Vector3::new(0.3, -0.2, 0.25));
    ahrs.set_quaternion(truth * offset);

    for _ in 0..1000 {
        ahrs.update(Vector3::zeros(), accelerometer, magnetometer, DT);
    }

    let error = ahrs.quaternion().angle_to(&truth).to_degrees();
    assert!(error < 1.0, "{:.3}° from truth", error);
    assert!((ahrs.heading() - 40.0).abs() < 1.5, "heading {}", ahrs.heading());
}

/// Readings scaled to physical units converge the same way as unit readings
#[test]
fn test_convergence_is_scale_free() {
    let truth = UnitQuaternion::from_euler_degrees(-35.0, 10.0, -120.0);
    let (accelerometer, magnetometer) = readings_at(&truth);

    let mut unit = Ahrs::new();
    let mut scaled = Ahrs::new();
    for _ in 0..200 {
        unit.update(Vector3::zeros(), accelerometer, magnetometer, DT);
        scaled.update(Vector3::zeros(), accelerometer * 9.81, magnetometer * 48.0, DT);
    }

    assert!(unit.quaternion().angle_to(&scaled.quaternion()) < 1e-3);
}

/// The estimate follows a steady rotation
#[test]
fn test_tracks_rotation() {
    let rate = Vector3::new(0.0, 0.0, 0.3);
    let mut truth = UnitQuaternion::identity();
    let mut ahrs = Ahrs::with_settings(AhrsSettings {
        beta: 0.05,
        ..Default::default()
    });

    for _ in 0..600 {
        truth *= UnitQuaternion::from_scaled_axis(rate * DT);
        let (accelerometer, magnetometer) = readings_at(&truth);
        ahrs.update(rate, accelerometer, magnetometer, DT);
    }

    let error = ahrs.quaternion().angle_to(&truth).to_degrees();
    assert!(error < 2.0, "{:.3}° behind a 0.3 rad/s turn", error);
}

#[test]
fn test_remapper_identity() {
    let mut rng = Pcg64::seed_from_u64(11);
    for _ in 0..100 {
        let v = random_vector(&mut rng, 100.0);
        assert_eq!(transform(v, &AxisAssignment::IDENTITY), v);
    }
}

#[test]
fn test_remapper_inverse_round_trip() {
    let assignments = [
        AxisAssignment::new([Axis::Z, Axis::X, Axis::Y], [true, false, true]),
        AxisAssignment::new([Axis::Y, Axis::Z, Axis::X], [false, true, false]),
        AxisAssignment::new([Axis::X, Axis::Z, Axis::Y], [true, true, true]),
    ];
    let v = Vector3::new(0.25, -1.5, 3.0);

    for assignment in assignments {
        let inverse = assignment.inverse().unwrap();
        assert_eq!(transform(transform(v, &assignment), &inverse), v);
        assert!((transform(v, &assignment).norm() - v.norm()).abs() < EPSILON);
    }
}

#[test]
fn test_low_pass_boundaries() {
    let previous = Vector3::new(1.0, 2.0, 3.0);
    let current = Vector3::new(-4.0, 0.5, 8.0);

    assert_eq!(low_pass(previous, current, 1.0), current);
    assert_eq!(low_pass(previous, current, 0.0), previous);
}

#[test]
fn test_hard_iron_mean() {
    let mut calibrator = HardIronCalibrator::new();
    calibrator.start_calibration();
    calibrator.add_sample(Vector3::new(1.0, 0.0, 0.0));
    calibrator.add_sample(Vector3::new(3.0, 0.0, 0.0));

    assert_eq!(calibrator.end_calibration(), Vector3::new(2.0, 0.0, 0.0));
}

#[test]
fn test_orientation_check_rejects_ambiguous_sample() {
    let calibrator = AxisCalibrator::default();
    let mut assignment = AxisAssignment::default();

    assert!(!calibrator.check_orientation(&mut assignment, Vector3::new(0.5, 0.5, 0.5), DeviceOrientation::FaceUp));
    assert_eq!(assignment, AxisAssignment::default());
}

#[test]
fn test_orientation_check_portrait() {
    let calibrator = AxisCalibrator::default();
    let mut assignment = AxisAssignment::default();

    assert!(calibrator.check_orientation(&mut assignment, Vector3::new(0.0, -1.0, 0.0), DeviceOrientation::Portrait));
    assert_eq!(assignment.axes[1], Axis::X);
    assert!(!assignment.inverted[1]);
}

/// Calibrating a biased magnetometer restores the heading
#[test]
fn test_tracker_hard_iron_calibration() {
    let bias = Vector3::new(15.0, -5.0, 8.0);
    let strength = 48.0;
    let mut tracker = OrientationTracker::new(TrackerSettings {
        heading_mode: HeadingMode::TiltCompensated,
        ..Default::default()
    });

    // Rotate through the six axis directions so the field averages out
    tracker.start_calibration();
    for direction in [
        Vector3::x(),
        -Vector3::x(),
        Vector3::y(),
        -Vector3::y(),
        Vector3::z(),
        -Vector3::z(),
    ] {
        tracker.update(&SensorSample {
            gyroscope: Vector3::zeros(),
            accelerometer: Vector3::z(),
            magnetometer: direction * strength + bias,
            delta_time: DT,
        });
    }
    let offset = tracker.end_calibration();
    assert!((offset - bias).norm() < 1e-4, "offset {:?}", offset);

    // Flat, facing 30° east of north
    let truth = UnitQuaternion::from_euler_degrees(0.0, 0.0, 30.0);
    let (accelerometer, magnetometer) = readings_at(&truth);
    tracker.update(&SensorSample {
        gyroscope: Vector3::zeros(),
        accelerometer,
        magnetometer: magnetometer * strength + bias,
        delta_time: DT,
    });

    assert!((tracker.heading() - 30.0).abs() < 0.01, "heading {}", tracker.heading());
    assert!(!tracker.magnetic_interference());
}
