//! Core types and settings for the tilt-compass AHRS library

use nalgebra::Vector3;

use crate::axes::Axis;
use crate::compass::HeadingMode;

/// Canonical device orientations used to calibrate the accelerometer axes.
///
/// Each orientation pins gravity onto a single logical axis, so holding the
/// device still in one of them reveals which physical axis carries that
/// logical axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeviceOrientation {
    /// Held upright, gravity towards the bottom edge
    Portrait,
    /// Held upright and upside down, gravity towards the top edge
    PortraitUpsideDown,
    /// Landscape with the left edge down
    LandscapeLeft,
    /// Landscape with the right edge down
    LandscapeRight,
    /// Flat, screen facing up
    FaceUp,
    /// Flat, screen facing down
    FaceDown,
}

impl DeviceOrientation {
    /// All six orientations, in the order a calibration routine usually walks them.
    pub const ALL: [DeviceOrientation; 6] = [
        DeviceOrientation::Portrait,
        DeviceOrientation::PortraitUpsideDown,
        DeviceOrientation::LandscapeLeft,
        DeviceOrientation::LandscapeRight,
        DeviceOrientation::FaceUp,
        DeviceOrientation::FaceDown,
    ];
}

/// Which axis label and sign the logical North, East and Down axes use.
///
/// The default maps North to X, East to Y and Down to Z with no inversion,
/// which gives a right-handed North-East-Down body frame: North points to the
/// top of the device, East to its right edge and Down out of its back.
///
/// # Example
/// ```
/// use tilt_compass_ahrs::{Axis, DeviceOrientation, LogicalFrame};
///
/// let frame = LogicalFrame::default();
/// assert_eq!(frame.expected_gravity(DeviceOrientation::Portrait), (Axis::X, -1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LogicalFrame {
    /// Label of the North axis
    pub north: Axis,
    /// Whether the North axis points the other way
    pub north_inverted: bool,
    /// Label of the East axis
    pub east: Axis,
    /// Whether the East axis points the other way
    pub east_inverted: bool,
    /// Label of the Down axis
    pub down: Axis,
    /// Whether the Down axis points the other way
    pub down_inverted: bool,
}

impl Default for LogicalFrame {
    fn default() -> Self {
        Self {
            north: Axis::X,
            north_inverted: false,
            east: Axis::Y,
            east_inverted: false,
            down: Axis::Z,
            down_inverted: false,
        }
    }
}

/// AHRS algorithm settings
///
/// # Example
/// ```
/// use tilt_compass_ahrs::{Ahrs, AhrsSettings};
///
/// let settings = AhrsSettings {
///     beta: 0.8,                       // faster convergence, more jitter
///     accelerometer_smoothing: 0.3,
///     ..Default::default()
/// };
/// let ahrs = Ahrs::with_settings(settings);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AhrsSettings {
    /// Filter gain of the gradient-descent correction
    ///
    /// Higher values follow the accelerometer and magnetometer more closely
    /// but pass more of their noise through. Lower values trust the gyroscope.
    pub beta: f32,
    /// Expected update rate in Hz, used by [`Ahrs::update_fixed_rate`](crate::Ahrs::update_fixed_rate)
    pub sample_frequency: f32,
    /// Low-pass coefficient for the accelerometer (1 disables smoothing)
    pub accelerometer_smoothing: f32,
    /// Low-pass coefficient for the magnetometer (1 disables smoothing)
    pub magnetometer_smoothing: f32,
}

impl Default for AhrsSettings {
    fn default() -> Self {
        Self {
            beta: 0.1,
            sample_frequency: 60.0,
            accelerometer_smoothing: 1.0,
            magnetometer_smoothing: 1.0,
        }
    }
}

/// AHRS status flags from the most recent update
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use tilt_compass_ahrs::Ahrs;
///
/// let mut ahrs = Ahrs::new();
/// ahrs.update(Vector3::zeros(), Vector3::zeros(), Vector3::x(), 0.01);
/// assert!(ahrs.flags().degenerate_input);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AhrsFlags {
    /// The accelerometer or magnetometer had zero magnitude and the
    /// orientation fell back to identity
    pub degenerate_input: bool,
    /// The estimate already matched the readings, so only the gyroscope moved it
    pub aligned: bool,
    /// The estimate was rebuilt from the readings instead of filtered
    pub seeded: bool,
}

/// Settings for [`OrientationTracker`](crate::OrientationTracker)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackerSettings {
    /// Estimator settings
    pub ahrs: AhrsSettings,
    /// Logical axes used when calibrating the accelerometer
    pub frame: LogicalFrame,
    /// Heading strategy
    pub heading_mode: HeadingMode,
    /// Plausible range of Earth's field strength in µT, `[min, max]`
    pub field_strength_limits: [f32; 2],
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            ahrs: AhrsSettings::default(),
            frame: LogicalFrame::default(),
            heading_mode: HeadingMode::default(),
            field_strength_limits: [20.0, 70.0],
        }
    }
}

/// One tick of sensor data delivered by the host loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSample {
    /// Angular rate in rad/s
    pub gyroscope: Vector3<f32>,
    /// Raw accelerometer reading
    pub accelerometer: Vector3<f32>,
    /// Raw magnetometer reading in µT
    pub magnetometer: Vector3<f32>,
    /// Seconds since the previous sample
    pub delta_time: f32,
}
