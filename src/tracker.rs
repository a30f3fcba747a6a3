//! Top-level owner of the orientation pipeline
//!
//! [`OrientationTracker`] ties the remapper, the calibrators and the
//! estimator together for a host loop that delivers one [`SensorSample`] per
//! tick and reads back the orientation and heading.

use log::{info, warn};
use nalgebra::{UnitQuaternion, Vector3};

use crate::ahrs::Ahrs;
use crate::axes::AxisAssignment;
use crate::calibration::{HardIronCalibrator, remove_hard_iron};
use crate::compass::calculate_heading;
use crate::orientation::AxisCalibrator;
use crate::storage::{self, KeyValueStore, StorageError};
use crate::types::{DeviceOrientation, SensorSample, TrackerSettings};

/// Owns the whole pipeline from raw phone samples to an orientation.
///
/// Each [`update`](Self::update) remaps the raw axes, subtracts the hard-iron
/// offset from the magnetometer and feeds the estimator. Axis assignments
/// are kept in the form calibration and storage use, where `axes[i]` labels
/// raw axis `i`; the gyroscope shares the accelerometer's assignment.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use tilt_compass_ahrs::{OrientationTracker, SensorSample, TrackerSettings};
///
/// let mut tracker = OrientationTracker::new(TrackerSettings::default());
///
/// let sample = SensorSample {
///     gyroscope: Vector3::zeros(),
///     accelerometer: Vector3::new(0.0, 0.0, 1.0),
///     magnetometer: Vector3::new(22.0, 0.0, 41.0),
///     delta_time: 1.0 / 60.0,
/// };
/// let orientation = tracker.update(&sample);
///
/// assert!((orientation.quaternion().norm() - 1.0).abs() < 1e-5);
/// assert!(tracker.heading().abs() < 1e-3);
/// ```
#[derive(Debug, Clone)]
pub struct OrientationTracker {
    settings: TrackerSettings,
    ahrs: Ahrs,
    accelerometer_axes: AxisAssignment,
    magnetometer_axes: AxisAssignment,
    axis_calibrator: AxisCalibrator,
    hard_iron: HardIronCalibrator,
    magnetometer_offset: Vector3<f32>,
    field_strength: Option<f32>,
    interference: bool,
}

impl OrientationTracker {
    /// Create a tracker with identity axes, zero offset and an unseeded estimator
    pub fn new(settings: TrackerSettings) -> Self {
        Self {
            settings,
            ahrs: Ahrs::with_settings(settings.ahrs),
            accelerometer_axes: AxisAssignment::default(),
            magnetometer_axes: AxisAssignment::default(),
            axis_calibrator: AxisCalibrator::new(settings.frame),
            hard_iron: HardIronCalibrator::new(),
            magnetometer_offset: Vector3::zeros(),
            field_strength: None,
            interference: false,
        }
    }

    /// Process one tick of sensor data and return the new orientation
    pub fn update(&mut self, sample: &SensorSample) -> UnitQuaternion<f32> {
        let gyroscope = remap(&self.accelerometer_axes, sample.gyroscope);
        let accelerometer = remap(&self.accelerometer_axes, sample.accelerometer);
        let raw_magnetometer = remap(&self.magnetometer_axes, sample.magnetometer);

        self.hard_iron.add_sample(raw_magnetometer);
        let magnetometer = remove_hard_iron(raw_magnetometer, self.magnetometer_offset);
        self.track_field_strength(magnetometer.norm());

        self.ahrs.update(gyroscope, accelerometer, magnetometer, sample.delta_time)
    }

    fn track_field_strength(&mut self, strength: f32) {
        let [min, max] = self.settings.field_strength_limits;
        let interference = strength < min || strength > max;
        if interference && !self.interference {
            warn!(
                "magnetic field of {:.1} µT outside {:.1}..{:.1}, is there a magnet nearby?",
                strength, min, max
            );
        }
        self.field_strength = Some(strength);
        self.interference = interference;
    }

    /// Begin collecting magnetometer samples for a hard-iron offset
    pub fn start_calibration(&mut self) {
        self.hard_iron.start_calibration();
    }

    /// Finish collecting and apply the mean of the samples as the new offset
    pub fn end_calibration(&mut self) -> Vector3<f32> {
        self.magnetometer_offset = self.hard_iron.end_calibration();
        self.magnetometer_offset
    }

    /// Whether a hard-iron calibration run is collecting samples
    pub fn is_calibrating(&self) -> bool {
        self.hard_iron.is_calibrating()
    }

    /// Check a raw accelerometer sample taken in a known orientation and
    /// update the accelerometer assignment. See [`AxisCalibrator::check_orientation`].
    pub fn check_accelerometer_orientation(&mut self, raw: Vector3<f32>, orientation: DeviceOrientation) -> bool {
        self.axis_calibrator
            .check_orientation(&mut self.accelerometer_axes, raw, orientation)
    }

    /// Heading in degrees (-180..=180) from the smoothed readings using the configured mode
    pub fn heading(&self) -> f32 {
        calculate_heading(
            self.settings.heading_mode,
            self.ahrs.accelerometer(),
            self.ahrs.magnetometer(),
        )
    }

    /// Whether the last corrected field magnitude fell outside the configured limits
    pub fn magnetic_interference(&self) -> bool {
        self.interference
    }

    /// Magnitude of the last corrected magnetometer reading in µT
    pub fn field_strength(&self) -> Option<f32> {
        self.field_strength
    }

    /// Replace the accelerometer assignment with the stored one
    pub fn load_axes<S: KeyValueStore + ?Sized>(&mut self, store: &mut S) -> Result<AxisAssignment, StorageError> {
        self.accelerometer_axes = storage::load_axis_assignment(store)?;
        info!("loaded accelerometer axes {:?}", self.accelerometer_axes);
        Ok(self.accelerometer_axes)
    }

    /// Persist the current accelerometer assignment
    pub fn save_axes<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<(), StorageError> {
        storage::save_axis_assignment(store, &self.accelerometer_axes)
    }

    /// Restore the default accelerometer assignment, both here and in the store
    pub fn reset_axes<S: KeyValueStore + ?Sized>(&mut self, store: &mut S) -> Result<(), StorageError> {
        self.accelerometer_axes = storage::reset_axis_assignment(store)?;
        Ok(())
    }

    /// Accelerometer (and gyroscope) assignment in raw-axis label form
    pub fn accelerometer_axes(&self) -> AxisAssignment {
        self.accelerometer_axes
    }

    /// Replace the accelerometer assignment, e.g. with one loaded elsewhere
    pub fn set_accelerometer_axes(&mut self, assignment: AxisAssignment) {
        self.accelerometer_axes = assignment;
    }

    /// Magnetometer assignment in raw-axis label form
    pub fn magnetometer_axes(&self) -> AxisAssignment {
        self.magnetometer_axes
    }

    /// Replace the magnetometer assignment
    pub fn set_magnetometer_axes(&mut self, assignment: AxisAssignment) {
        self.magnetometer_axes = assignment;
    }

    /// Hard-iron offset subtracted from every magnetometer reading
    pub fn magnetometer_offset(&self) -> Vector3<f32> {
        self.magnetometer_offset
    }

    /// Replace the hard-iron offset, e.g. with one saved from an earlier run
    pub fn set_magnetometer_offset(&mut self, offset: Vector3<f32>) {
        self.magnetometer_offset = offset;
    }

    /// Calibrator collecting hard-iron samples, for its extents and midpoint
    pub fn hard_iron(&self) -> &HardIronCalibrator {
        &self.hard_iron
    }

    /// Underlying estimator, for its smoothed readings and flags
    pub fn ahrs(&self) -> &Ahrs {
        &self.ahrs
    }

    /// Current orientation, sensor frame into North-East-Down
    pub fn quaternion(&self) -> UnitQuaternion<f32> {
        self.ahrs.quaternion()
    }

    /// Settings the tracker was built with
    pub fn settings(&self) -> TrackerSettings {
        self.settings
    }

    /// Forget the orientation estimate; assignments and offset are kept
    pub fn reset(&mut self) {
        self.ahrs.reset();
        self.field_strength = None;
        self.interference = false;
    }
}

impl Default for OrientationTracker {
    fn default() -> Self {
        Self::new(TrackerSettings::default())
    }
}

/// Labels that repeat an axis cannot be reordered and are applied as they are
fn remap(assignment: &AxisAssignment, raw: Vector3<f32>) -> Vector3<f32> {
    assignment.to_source_order().unwrap_or(*assignment).apply(raw)
}
