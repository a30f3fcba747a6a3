//! [![license]](https://opensource.org/licenses/MIT)
//!
//! [license]: https://img.shields.io/badge/License-MIT-blue.svg?style=for-the-badge&labelColor=555555
//!
//! Tilt-compass AHRS - orientation and heading from phone sensors
//!
//! This library turns raw accelerometer, magnetometer and gyroscope samples
//! from a phone into a unit quaternion using Madgwick's gradient-descent
//! filter, and provides the pieces a compass app needs around it.
//!
//! # Features
//!
//! - Madgwick MARG filter with configurable gain and input smoothing
//! - Axis remapping for sensors mounted in any orientation
//! - Accelerometer axis calibration from six known device orientations
//! - Hard-iron magnetometer calibration (mean and min/max midpoint)
//! - Tilt-compensated and flat compass heading
//! - Persistence of axis assignments through any key/value store
//!
//! # Quick Start
//!
//! ```rust
//! use nalgebra::Vector3;
//! use tilt_compass_ahrs::{Ahrs, QuaternionExt};
//!
//! let mut ahrs = Ahrs::new();
//!
//! // Sensor readings
//! let gyroscope = Vector3::new(0.01, -0.02, 0.0);    // rad/s
//! let accelerometer = Vector3::new(0.0, 0.0, 1.0);   // gravity direction
//! let magnetometer = Vector3::new(22.0, 0.0, 41.0);  // µT
//!
//! // Update AHRS
//! let quaternion = ahrs.update(gyroscope, accelerometer, magnetometer, 1.0 / 60.0);
//!
//! // Convert to Euler angles (roll, pitch, yaw) in degrees
//! let euler = quaternion.to_euler_degrees();
//! ```
//!
//! For a full pipeline with calibration and heading, see [`OrientationTracker`].

mod ahrs;
pub mod axes;
pub mod calibration;
pub mod compass;
mod lowpass;
mod math;
pub mod orientation;
pub mod storage;
mod tracker;
mod types;

// Re-export all public types and functions
pub use ahrs::{Ahrs, Step, madgwick_step, orientation_from_readings, step};
pub use axes::{Axis, AxisAssignment, ParseAxisError, transform};
pub use calibration::{CalibrationState, Extents, HardIronCalibrator, calibrate_magnetic, remove_hard_iron};
pub use compass::{HeadingMode, calculate_heading, tilt_angles};
pub use lowpass::low_pass;
pub use math::{DEG_TO_RAD, QuaternionExt, RAD_TO_DEG, Vector3Ext, wrap_degrees};
pub use orientation::{AxisCalibrator, is_checkable, set_axis};
pub use storage::{KeyValueStore, MemoryStore, StorageError};
pub use tracker::OrientationTracker;
pub use types::*;
