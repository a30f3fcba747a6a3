//! Magnetometer hard-iron calibration
//!
//! Ferromagnetic parts near the sensor add a constant bias to every
//! magnetometer reading. [`HardIronCalibrator`] collects readings while the
//! user turns the device around and reduces them to an offset vector that is
//! then subtracted from later readings.

use log::{info, warn};
use nalgebra::{Matrix3, Vector3};

/// Calibration phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalibrationState {
    /// Not collecting
    #[default]
    Idle,
    /// Collecting samples
    Calibrating,
}

/// Per-axis minimum and maximum seen during a calibration run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extents {
    /// Smallest value per axis
    pub min: Vector3<f32>,
    /// Largest value per axis
    pub max: Vector3<f32>,
}

impl Extents {
    fn new(sample: Vector3<f32>) -> Self {
        Self {
            min: sample,
            max: sample,
        }
    }

    fn include(&mut self, sample: Vector3<f32>) {
        self.min = self.min.inf(&sample);
        self.max = self.max.sup(&sample);
    }

    /// Centre of the box spanned by the extents
    pub fn midpoint(&self) -> Vector3<f32> {
        (self.max + self.min) * 0.5
    }
}

/// Hard-iron calibrator collecting magnetometer samples between
/// [`start_calibration`](Self::start_calibration) and
/// [`end_calibration`](Self::end_calibration).
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use tilt_compass_ahrs::HardIronCalibrator;
///
/// let mut calibrator = HardIronCalibrator::new();
/// calibrator.start_calibration();
/// calibrator.add_sample(Vector3::new(1.0, 0.0, 0.0));
/// calibrator.add_sample(Vector3::new(3.0, 0.0, 0.0));
///
/// assert_eq!(calibrator.end_calibration(), Vector3::new(2.0, 0.0, 0.0));
/// ```
#[derive(Debug, Clone, Default)]
pub struct HardIronCalibrator {
    state: CalibrationState,
    samples: Vec<Vector3<f32>>,
    extents: Option<Extents>,
}

impl HardIronCalibrator {
    /// Create an idle calibrator
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a calibration run, discarding anything collected before
    pub fn start_calibration(&mut self) {
        self.state = CalibrationState::Calibrating;
        self.samples.clear();
        self.extents = None;
        info!("hard-iron calibration started");
    }

    /// Record a raw magnetometer sample. Ignored while idle.
    pub fn add_sample(&mut self, raw: Vector3<f32>) {
        if self.state != CalibrationState::Calibrating {
            return;
        }

        self.samples.push(raw);
        match self.extents.as_mut() {
            Some(extents) => extents.include(raw),
            None => self.extents = Some(Extents::new(raw)),
        }
    }

    /// Finish the run and return the mean of the collected samples.
    ///
    /// Returns the zero offset when nothing was collected. The calibrator is
    /// idle and empty afterwards; the extents stay readable until the next
    /// run starts.
    pub fn end_calibration(&mut self) -> Vector3<f32> {
        self.state = CalibrationState::Idle;

        if self.samples.is_empty() {
            warn!("hard-iron calibration ended without samples, using zero offset");
            return Vector3::zeros();
        }

        let count = self.samples.len();
        let offset = self.samples.iter().sum::<Vector3<f32>>() / count as f32;
        self.samples.clear();

        info!(
            "hard-iron calibration finished with {} samples, offset ({:.3}, {:.3}, {:.3})",
            count, offset.x, offset.y, offset.z
        );
        offset
    }

    /// Current phase
    pub fn state(&self) -> CalibrationState {
        self.state
    }

    /// Whether a run is in progress
    pub fn is_calibrating(&self) -> bool {
        self.state == CalibrationState::Calibrating
    }

    /// Number of samples collected in the current run
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Running per-axis minimum and maximum of the latest run
    pub fn extents(&self) -> Option<Extents> {
        self.extents
    }

    /// Offset estimated from the centre of the min/max box instead of the mean.
    ///
    /// Less sensitive to uneven coverage than the mean when the device was
    /// not rotated evenly through all directions.
    pub fn midpoint_offset(&self) -> Option<Vector3<f32>> {
        self.extents.map(|extents| extents.midpoint())
    }
}

/// Subtracts a hard-iron offset from a raw magnetometer reading
#[inline]
pub fn remove_hard_iron(raw: Vector3<f32>, offset: Vector3<f32>) -> Vector3<f32> {
    raw - offset
}

/// Applies magnetometer calibration (hard and soft iron correction)
///
/// # Arguments
/// * `uncalibrated` - Raw magnetometer reading
/// * `soft_iron_matrix` - 3x3 soft iron correction matrix
/// * `hard_iron_offset` - Hard iron offset vector
///
/// # Example
/// ```
/// use nalgebra::{Matrix3, Vector3};
/// use tilt_compass_ahrs::calibration::calibrate_magnetic;
///
/// let raw = Vector3::new(100.0, 200.0, 300.0);
/// let calibrated = calibrate_magnetic(raw, Matrix3::identity(), Vector3::new(10.0, 20.0, 30.0));
/// assert_eq!(calibrated, Vector3::new(90.0, 180.0, 270.0));
/// ```
pub fn calibrate_magnetic(
    uncalibrated: Vector3<f32>,
    soft_iron_matrix: Matrix3<f32>,
    hard_iron_offset: Vector3<f32>,
) -> Vector3<f32> {
    soft_iron_matrix * remove_hard_iron(uncalibrated, hard_iron_offset)
}
