//! Accelerometer axis calibration from known device orientations
//!
//! Holding the device still in one of the [`DeviceOrientation`]s puts
//! gravity on a single physical axis. Comparing that axis and its sign with
//! what the orientation implies for the logical frame tells which label the
//! physical axis should carry and whether it must be inverted. One check per
//! distinct orientation pins one axis; three orientations on different axes
//! fix the whole assignment.

use log::debug;
use nalgebra::Vector3;

use crate::axes::{Axis, AxisAssignment};
use crate::math::Vector3Ext;
use crate::types::{DeviceOrientation, LogicalFrame};

/// Components below this magnitude count as "no gravity"
const SMALL_THRESHOLD: f32 = 0.4;
/// Components above this magnitude count as "carrying gravity"
const LARGE_THRESHOLD: f32 = 0.6;

/// Per-axis weight used by [`is_checkable`]: 0.5 for small, 1 for large, 0 in between
#[inline]
fn axis_weight(value: f32) -> f32 {
    let magnitude = value.abs();
    if magnitude < SMALL_THRESHOLD {
        0.5
    } else if magnitude > LARGE_THRESHOLD {
        1.0
    } else {
        0.0
    }
}

/// Whether an accelerometer sample is clear enough to calibrate from.
///
/// One axis must carry gravity (above 0.6) while the other two stay below
/// 0.4. The weights 0.5/1/0 sum to exactly 2 in that case; the only other way
/// to reach 2 is two large axes and one in between, which is rejected.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use tilt_compass_ahrs::is_checkable;
///
/// assert!(is_checkable(Vector3::new(0.05, -0.98, 0.1)));
/// assert!(!is_checkable(Vector3::new(0.5, 0.5, 0.5)));
/// ```
pub fn is_checkable(raw: Vector3<f32>) -> bool {
    let weights = raw.map(axis_weight);
    if weights.sum() != 2.0 {
        return false;
    }

    let has_middle = weights.iter().any(|&w| w == 0.0);
    let large = weights.iter().filter(|&&w| w == 1.0).count();
    !(has_middle && large >= 2)
}

impl LogicalFrame {
    /// Logical axis and sign gravity shows up on in a known orientation
    pub fn expected_gravity(&self, orientation: DeviceOrientation) -> (Axis, i8) {
        let signed = |axis: Axis, inverted: bool, sign: i8| (axis, if inverted { -sign } else { sign });

        match orientation {
            // Gravity towards the bottom edge
            DeviceOrientation::Portrait => signed(self.north, self.north_inverted, -1),
            DeviceOrientation::PortraitUpsideDown => signed(self.north, self.north_inverted, 1),
            // Gravity towards the left edge
            DeviceOrientation::LandscapeLeft => signed(self.east, self.east_inverted, -1),
            DeviceOrientation::LandscapeRight => signed(self.east, self.east_inverted, 1),
            // Gravity out of the back
            DeviceOrientation::FaceUp => signed(self.down, self.down_inverted, 1),
            DeviceOrientation::FaceDown => signed(self.down, self.down_inverted, -1),
        }
    }
}

/// Labels the physical axis gravity dominates in `raw`.
///
/// The slot with the largest magnitude gets `expected_axis`; it is inverted
/// when the reading is more than 1 away from `expected_sign`. Other slots are
/// left alone.
pub fn set_axis(assignment: &mut AxisAssignment, raw: Vector3<f32>, expected_axis: Axis, expected_sign: i8) {
    let dominant = raw.dominant_axis();
    assignment.inverted[dominant] = (raw[dominant] - f32::from(expected_sign)).abs() > 1.0;
    assignment.axes[dominant] = expected_axis;
}

/// Infers accelerometer axis assignments from samples taken in known orientations
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use tilt_compass_ahrs::{Axis, AxisAssignment, AxisCalibrator, DeviceOrientation};
///
/// let calibrator = AxisCalibrator::default();
/// let mut assignment = AxisAssignment::default();
///
/// // Held in portrait, the sensor reports gravity on its Y axis
/// let updated = calibrator.check_orientation(&mut assignment, Vector3::new(0.0, -1.0, 0.0), DeviceOrientation::Portrait);
///
/// assert!(updated);
/// assert_eq!(assignment.axes[1], Axis::X);
/// assert!(!assignment.inverted[1]);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AxisCalibrator {
    frame: LogicalFrame,
}

impl AxisCalibrator {
    /// Create a calibrator for the given logical frame
    pub fn new(frame: LogicalFrame) -> Self {
        Self { frame }
    }

    /// Logical frame the calibrator targets
    pub fn frame(&self) -> LogicalFrame {
        self.frame
    }

    /// Check a raw accelerometer sample taken in `orientation` and update the
    /// dominant axis of `assignment`.
    ///
    /// Returns `false` and leaves the assignment untouched when the sample is
    /// not [checkable](is_checkable); take another sample and retry.
    pub fn check_orientation(
        &self,
        assignment: &mut AxisAssignment,
        raw: Vector3<f32>,
        orientation: DeviceOrientation,
    ) -> bool {
        if !is_checkable(raw) {
            debug!(
                "accelerometer sample ({:.2}, {:.2}, {:.2}) not usable for {:?}",
                raw.x, raw.y, raw.z, orientation
            );
            return false;
        }

        let (axis, sign) = self.frame.expected_gravity(orientation);
        set_axis(assignment, raw, axis, sign);
        debug!("{:?}: axis {} now reads {} (inverted: {:?})", orientation, raw.dominant_axis(), axis, assignment.inverted);
        true
    }
}
