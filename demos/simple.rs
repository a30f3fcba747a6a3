use nalgebra::Vector3;
use tilt_compass_ahrs::{DeviceOrientation, OrientationTracker, QuaternionExt, SensorSample, TrackerSettings};

const SAMPLE_PERIOD: f32 = 1.0 / 60.0; // 60 Hz sensor updates

fn main() {
    let mut tracker = OrientationTracker::new(TrackerSettings::default());

    // Calibrate the accelerometer axes: hold the phone in portrait, then flat
    // on a table. Replace these with real raw accelerometer samples.
    let portrait = Vector3::new(0.0, -1.0, 0.0);
    let face_up = Vector3::new(0.0, 0.0, 1.0);
    tracker.check_accelerometer_orientation(portrait, DeviceOrientation::Portrait);
    tracker.check_accelerometer_orientation(face_up, DeviceOrientation::FaceUp);

    for _ in 0..10 {
        // this loop should repeat each time new sensor data is available
        let sample = SensorSample {
            gyroscope: Vector3::new(0.0, 0.0, 0.0),       // replace with gyroscope data in rad/s
            accelerometer: Vector3::new(0.0, 0.0, 1.0),   // replace with accelerometer data
            magnetometer: Vector3::new(22.0, 0.0, 41.0),  // replace with magnetometer data in µT
            delta_time: SAMPLE_PERIOD,
        };

        let quaternion = tracker.update(&sample);
        let euler = quaternion.to_euler_degrees();

        println!(
            "Roll: {:.2}, Pitch: {:.2}, Yaw: {:.2}, Heading: {:.1}",
            euler.x,
            euler.y,
            euler.z,
            tracker.heading()
        );
    }
}
