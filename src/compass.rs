//! Compass heading from accelerometer and magnetometer readings
//!
//! Readings are expected in the North-East-Down body frame produced by the
//! axis calibration: X towards the top of the device, Y towards its right
//! edge, Z out of its back, with the accelerometer reporting the direction of
//! gravity.

use nalgebra::Vector3;

use crate::math::{RAD_TO_DEG, Vector3Ext, wrap_degrees};

/// How heading is derived from the sensor readings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HeadingMode {
    /// Uses only the magnetometer; valid while the device is held flat
    Uncompensated,
    /// Projects the magnetic field onto the plane perpendicular to gravity
    #[default]
    TiltCompensated,
}

/// Calculate magnetic heading with the given strategy
///
/// # Returns
/// Heading angle in degrees (range: -180° to +180°, 0° = North, 90° = East)
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use tilt_compass_ahrs::{HeadingMode, calculate_heading};
///
/// let down = Vector3::new(0.0, 0.0, 1.0);  // lying flat
/// let field = Vector3::new(0.0, -1.0, 0.5); // north is to the left
/// let heading = calculate_heading(HeadingMode::TiltCompensated, down, field);
/// assert!((heading - 90.0).abs() < 1e-3); // facing east
/// ```
pub fn calculate_heading(mode: HeadingMode, accelerometer: Vector3<f32>, magnetometer: Vector3<f32>) -> f32 {
    match mode {
        HeadingMode::Uncompensated => uncompensated_heading(magnetometer),
        HeadingMode::TiltCompensated => tilt_compensated_heading(accelerometer, magnetometer),
    }
}

fn uncompensated_heading(magnetometer: Vector3<f32>) -> f32 {
    (-magnetometer.y).atan2(magnetometer.x) * RAD_TO_DEG
}

fn tilt_compensated_heading(accelerometer: Vector3<f32>, magnetometer: Vector3<f32>) -> f32 {
    // East and North expressed in body coordinates
    let east = accelerometer.cross(&magnetometer).safe_normalize();
    let north = east.cross(&accelerometer).safe_normalize();

    // Body X projected onto the horizontal plane
    east.x.atan2(north.x) * RAD_TO_DEG
}

/// Roll and pitch in degrees (each wrapped to 0..360) from an accelerometer reading
///
/// Roll is measured around the device's long axis with the device held in
/// landscape; pitch follows from the roll.
pub fn tilt_angles(accelerometer: Vector3<f32>) -> (f32, f32) {
    let roll = 90.0 + accelerometer.z.atan2(accelerometer.x) * RAD_TO_DEG;
    let roll_rad = roll.to_radians();
    let pitch = (-accelerometer.x).atan2(accelerometer.y * roll_rad.sin() + accelerometer.z * roll_rad.cos()) * RAD_TO_DEG;

    (wrap_degrees(roll), wrap_degrees(pitch))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Field with 60° inclination, rotated into a flat device facing `heading`
    fn field_for_heading(heading: f32) -> Vector3<f32> {
        let h = heading.to_radians();
        Vector3::new(0.5 * h.cos(), -0.5 * h.sin(), 0.866)
    }

    fn angle_difference(a: f32, b: f32) -> f32 {
        let d = (a - b).rem_euclid(360.0);
        d.min(360.0 - d)
    }

    #[test]
    fn test_cardinal_directions() {
        let flat = Vector3::new(0.0, 0.0, 1.0);

        for mode in [HeadingMode::Uncompensated, HeadingMode::TiltCompensated] {
            for expected in [0.0f32, 90.0, 180.0, -90.0] {
                let heading = calculate_heading(mode, flat, field_for_heading(expected));
                assert!(
                    angle_difference(heading, expected) < 1e-3,
                    "{:?}: expected {}°, got {}°",
                    mode,
                    expected,
                    heading
                );
            }
        }
    }

    #[test]
    fn test_tilt_compensation() {
        // Device facing 40° with 30° of pitch (nose up)
        let pitch = 30.0f32.to_radians();
        let heading = 40.0f32.to_radians();

        // Earth vectors in NED, rotated into the body by yaw then pitch
        let rotate = |v: Vector3<f32>| {
            let yawed = Vector3::new(
                v.x * heading.cos() + v.y * heading.sin(),
                -v.x * heading.sin() + v.y * heading.cos(),
                v.z,
            );
            Vector3::new(
                yawed.x * pitch.cos() - yawed.z * pitch.sin(),
                yawed.y,
                yawed.x * pitch.sin() + yawed.z * pitch.cos(),
            )
        };
        let down = rotate(Vector3::new(0.0, 0.0, 1.0));
        let field = rotate(Vector3::new(0.5, 0.0, 0.866));

        let compensated = calculate_heading(HeadingMode::TiltCompensated, down, field);
        assert!((compensated - 40.0).abs() < 0.01, "compensated {}", compensated);

        let uncompensated = calculate_heading(HeadingMode::Uncompensated, down, field);
        assert!(
            (uncompensated - 40.0).abs() > 5.0,
            "uncompensated heading should drift with tilt, got {}",
            uncompensated
        );
    }

    #[test]
    fn test_heading_range() {
        let flat = Vector3::new(0.0, 0.0, 1.0);

        for angle_deg in (0..360).step_by(30) {
            let field = field_for_heading(angle_deg as f32);
            for mode in [HeadingMode::Uncompensated, HeadingMode::TiltCompensated] {
                let heading = calculate_heading(mode, flat, field);
                assert!(
                    (-180.0..=180.0).contains(&heading),
                    "Heading {:.1}° out of range for {}°",
                    heading,
                    angle_deg
                );
            }
        }
    }

    #[test]
    fn test_degenerate_inputs_do_not_panic() {
        let heading = calculate_heading(HeadingMode::TiltCompensated, Vector3::zeros(), Vector3::x());
        assert!(heading.is_finite());
    }

    #[test]
    fn test_tilt_angles_level_landscape() {
        // Gravity along +X: landscape, screen vertical
        let (roll, pitch) = tilt_angles(Vector3::new(1.0, 0.0, 0.0));
        assert!((roll - 90.0).abs() < 1e-3, "roll {}", roll);
        assert!((0.0..360.0).contains(&pitch));

        let (roll, _) = tilt_angles(Vector3::new(0.0, 0.0, 1.0));
        assert!((roll - 180.0).abs() < 1e-3, "roll {}", roll);
    }
}
