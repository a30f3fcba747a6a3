//! Gradient-descent AHRS algorithm
//!
//! The estimator integrates the gyroscope and nudges the result towards the
//! orientation implied by the accelerometer and magnetometer with one step of
//! gradient descent per update (Madgwick's MARG filter).
//!
//! The quaternion maps the sensor frame into the earth frame. The earth frame
//! has its Z axis along the direction the accelerometer reports at rest and
//! its X axis along the horizontal component of the magnetic field, so with
//! an accelerometer that reports the direction of gravity the earth frame is
//! North-East-Down.

use log::{debug, trace};
use nalgebra::{Matrix3, Matrix3x4, Quaternion, Rotation3, UnitQuaternion, Vector3, Vector4};

use crate::lowpass::low_pass;
use crate::math::{RAD_TO_DEG, Vector3Ext};
use crate::types::{AhrsFlags, AhrsSettings};

/// Result of a single filter step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    /// Updated orientation
    pub quaternion: UnitQuaternion<f32>,
    /// Set when a zero-magnitude input forced the identity fallback
    pub degenerate: bool,
    /// Set when the readings agree with the estimate, so no correction was needed
    pub aligned: bool,
    /// Set when the gradient vanished although the readings still disagree
    /// with the estimate. Happens on the far side of the objective, e.g. an
    /// estimate that is upside down relative to the device.
    pub stalled: bool,
}

/// Squared alignment error below which the estimate counts as aligned
const RESIDUAL_TOLERANCE: f32 = 1e-6;
/// Gradient magnitude below which a misaligned estimate counts as stalled
const STALL_GRADIENT: f32 = 1e-4;

/// Advances an orientation by one filter step.
///
/// # Arguments
/// * `quaternion` - Previous orientation
/// * `gyroscope` - Angular rate in rad/s
/// * `accelerometer` - Accelerometer reading, any scale
/// * `magnetometer` - Magnetometer reading, any scale
/// * `beta` - Filter gain
/// * `delta_time` - Time step in seconds
///
/// # Returns
/// The next orientation, or identity if the accelerometer or magnetometer has
/// zero magnitude.
///
/// # Example
/// ```
/// use nalgebra::{UnitQuaternion, Vector3};
/// use tilt_compass_ahrs::madgwick_step;
///
/// let q = madgwick_step(
///     &UnitQuaternion::identity(),
///     Vector3::new(0.0, 0.0, 0.1),
///     Vector3::new(0.0, 0.0, 9.81),
///     Vector3::new(20.0, 0.0, 40.0),
///     0.1,
///     1.0 / 60.0,
/// );
/// assert!((q.quaternion().norm() - 1.0).abs() < 1e-5);
/// ```
pub fn madgwick_step(
    quaternion: &UnitQuaternion<f32>,
    gyroscope: Vector3<f32>,
    accelerometer: Vector3<f32>,
    magnetometer: Vector3<f32>,
    beta: f32,
    delta_time: f32,
) -> UnitQuaternion<f32> {
    step(quaternion, gyroscope, accelerometer, magnetometer, beta, delta_time).quaternion
}

/// Same as [`madgwick_step`] but also reports how the step went
pub fn step(
    quaternion: &UnitQuaternion<f32>,
    gyroscope: Vector3<f32>,
    accelerometer: Vector3<f32>,
    magnetometer: Vector3<f32>,
    beta: f32,
    delta_time: f32,
) -> Step {
    // Normalising a zero vector would poison the state with NaN
    let accelerometer_norm = accelerometer.norm();
    let magnetometer_norm = magnetometer.norm();
    if accelerometer_norm == 0.0 || magnetometer_norm == 0.0 {
        trace!("zero-magnitude accelerometer or magnetometer, resetting to identity");
        return Step {
            quaternion: UnitQuaternion::identity(),
            degenerate: true,
            aligned: false,
            stalled: false,
        };
    }

    let a = accelerometer / accelerometer_norm;
    let m = magnetometer / magnetometer_norm;
    let q = quaternion.as_ref();

    let (gradient, residual) = objective_gradient(q, a, m);
    let gradient_norm = gradient.norm();
    let misaligned = residual > RESIDUAL_TOLERANCE;
    let aligned = gradient_norm == 0.0 && !misaligned;
    let stalled = gradient_norm <= STALL_GRADIENT && misaligned;

    // qDot = 0.5 * q ⊗ (0, ω) - β * ∇f / |∇f|
    let omega = Quaternion::from_parts(0.0, gyroscope);
    let mut rate = q * omega * 0.5;
    if gradient_norm > 0.0 {
        let correction = gradient * (beta / gradient_norm);
        rate -= Quaternion::new(correction[0], correction[1], correction[2], correction[3]);
    }

    let integrated = q + rate * delta_time;

    Step {
        quaternion: UnitQuaternion::from_quaternion(integrated),
        degenerate: false,
        aligned,
        stalled,
    }
}

/// Orientation implied by a single accelerometer and magnetometer reading.
///
/// Builds the North-East-Down axes in sensor coordinates (Down along the
/// accelerometer, East along `a × m`, North along `East × Down`) and returns
/// the rotation from the sensor frame into them. `None` when either reading is
/// zero or the two are parallel.
///
/// # Example
/// ```
/// use nalgebra::{UnitQuaternion, Vector3};
/// use tilt_compass_ahrs::orientation_from_readings;
///
/// // Lying face down with the top edge pointing north
/// let q = orientation_from_readings(Vector3::new(0.0, 0.0, -1.0), Vector3::new(0.5, 0.0, -0.866)).unwrap();
/// let expected = UnitQuaternion::from_euler_angles(std::f32::consts::PI, 0.0, 0.0);
/// assert!(q.angle_to(&expected) < 1e-4);
/// ```
pub fn orientation_from_readings(
    accelerometer: Vector3<f32>,
    magnetometer: Vector3<f32>,
) -> Option<UnitQuaternion<f32>> {
    let down = accelerometer.safe_normalize();
    let east = accelerometer.cross(&magnetometer).safe_normalize();
    if down == Vector3::zeros() || east == Vector3::zeros() {
        return None;
    }
    let north = east.cross(&down);

    // Rows are the earth axes seen from the sensor, so the matrix maps sensor into earth
    let matrix = Matrix3::from_rows(&[north.transpose(), east.transpose(), down.transpose()]);
    let rotation = Rotation3::from_matrix_unchecked(matrix);
    Some(UnitQuaternion::from_rotation_matrix(&rotation))
}

/// Gradient of the accelerometer and magnetometer alignment error with
/// respect to the quaternion, ordered (w, x, y, z), and the squared error itself.
///
/// `a` and `m` must be unit vectors.
fn objective_gradient(q: &Quaternion<f32>, a: Vector3<f32>, m: Vector3<f32>) -> (Vector4<f32>, f32) {
    let (q0, q1, q2, q3) = (q.w, q.i, q.j, q.k);

    // Auxiliary variables to avoid repeated arithmetic
    let _2q0 = 2.0 * q0;
    let _2q1 = 2.0 * q1;
    let _2q2 = 2.0 * q2;
    let _2q3 = 2.0 * q3;
    let q0q0 = q0 * q0;
    let q1q1 = q1 * q1;
    let q2q2 = q2 * q2;
    let q3q3 = q3 * q3;
    let q0q1 = q0 * q1;
    let q0q2 = q0 * q2;
    let q0q3 = q0 * q3;
    let q1q2 = q1 * q2;
    let q1q3 = q1 * q3;
    let q2q3 = q2 * q3;

    // Reference direction of the earth's magnetic field: rotate the
    // measurement into the earth frame and fold the horizontal part onto X
    let hx = m.x * (q0q0 + q1q1 - q2q2 - q3q3) + m.y * 2.0 * (q1q2 - q0q3) + m.z * 2.0 * (q0q2 + q1q3);
    let hy = m.x * 2.0 * (q0q3 + q1q2) + m.y * (q0q0 - q1q1 + q2q2 - q3q3) + m.z * 2.0 * (q2q3 - q0q1);
    let hz = m.x * 2.0 * (q1q3 - q0q2) + m.y * 2.0 * (q0q1 + q2q3) + m.z * (q0q0 - q1q1 - q2q2 + q3q3);
    let bx = (hx * hx + hy * hy).sqrt();
    let bz = hz;
    let _2bx = 2.0 * bx;
    let _2bz = 2.0 * bz;
    let _4bx = 4.0 * bx;
    let _4bz = 4.0 * bz;

    // Gravity error
    let f_g = Vector3::new(
        2.0 * (q1q3 - q0q2) - a.x,
        2.0 * (q0q1 + q2q3) - a.y,
        2.0 * (0.5 - q1q1 - q2q2) - a.z,
    );

    #[rustfmt::skip]
    let j_g = Matrix3x4::new(
        -_2q2,  _2q3,       -_2q0,      _2q1,
         _2q1,  _2q0,        _2q3,      _2q2,
          0.0, -2.0 * _2q1, -2.0 * _2q2, 0.0,
    );

    // Magnetic field error
    let f_b = Vector3::new(
        _2bx * (0.5 - q2q2 - q3q3) + _2bz * (q1q3 - q0q2) - m.x,
        _2bx * (q1q2 - q0q3) + _2bz * (q0q1 + q2q3) - m.y,
        _2bx * (q0q2 + q1q3) + _2bz * (0.5 - q1q1 - q2q2) - m.z,
    );

    #[rustfmt::skip]
    let j_b = Matrix3x4::new(
        -_2bz * q2,              _2bz * q3,              -_4bx * q2 - _2bz * q0, -_4bx * q3 + _2bz * q1,
        -_2bx * q3 + _2bz * q1,  _2bx * q2 + _2bz * q0,   _2bx * q1 + _2bz * q3, -_2bx * q0 + _2bz * q2,
         _2bx * q2,              _2bx * q3 - _4bz * q1,   _2bx * q0 - _4bz * q2,  _2bx * q1,
    );

    let gradient = j_g.transpose() * f_g + j_b.transpose() * f_b;
    (gradient, f_g.norm_squared() + f_b.norm_squared())
}

/// Stateful AHRS estimator
///
/// Owns the orientation and the previous smoothed accelerometer and
/// magnetometer readings. Each [`update`](Self::update) low-pass filters the
/// readings and runs one [`madgwick_step`].
///
/// The first usable sample seeds the estimate with
/// [`orientation_from_readings`] instead of starting from identity, and a
/// [stalled](Step::stalled) step is reseeded the same way.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use tilt_compass_ahrs::Ahrs;
///
/// let mut ahrs = Ahrs::new();
/// let gyroscope = Vector3::new(0.0, 0.0, 0.0);        // rad/s
/// let accelerometer = Vector3::new(0.0, 0.0, 9.81);   // gravity on the Down axis
/// let magnetometer = Vector3::new(22.0, 0.0, 41.0);   // µT
///
/// let quaternion = ahrs.update(gyroscope, accelerometer, magnetometer, 1.0 / 60.0);
/// assert!((quaternion.quaternion().norm() - 1.0).abs() < 1e-5);
/// ```
#[derive(Debug, Clone)]
pub struct Ahrs {
    settings: AhrsSettings,
    quaternion: UnitQuaternion<f32>,
    /// Previous smoothed accelerometer reading
    accelerometer: Vector3<f32>,
    /// Previous smoothed magnetometer reading
    magnetometer: Vector3<f32>,
    /// Whether the smoothed readings hold a real sample yet
    primed: bool,
    /// Whether the orientation came from a sample or the caller
    seeded: bool,
    flags: AhrsFlags,
}

impl Ahrs {
    /// Create a new AHRS instance with default settings
    pub fn new() -> Self {
        Self::with_settings(AhrsSettings::default())
    }

    /// Create a new AHRS instance with specified settings
    pub fn with_settings(settings: AhrsSettings) -> Self {
        Self {
            settings,
            quaternion: UnitQuaternion::identity(),
            accelerometer: Vector3::zeros(),
            magnetometer: Vector3::zeros(),
            primed: false,
            seeded: false,
            flags: AhrsFlags::default(),
        }
    }

    /// Reset orientation and smoothing state
    pub fn reset(&mut self) {
        self.quaternion = UnitQuaternion::identity();
        self.accelerometer = Vector3::zeros();
        self.magnetometer = Vector3::zeros();
        self.primed = false;
        self.seeded = false;
        self.flags = AhrsFlags::default();
    }

    /// Current settings
    pub fn settings(&self) -> AhrsSettings {
        self.settings
    }

    /// Replace the settings; the orientation is kept
    pub fn set_settings(&mut self, settings: AhrsSettings) {
        self.settings = settings;
    }

    /// Update AHRS with gyroscope, accelerometer, and magnetometer data
    ///
    /// # Arguments
    /// * `gyroscope` - Angular rate in rad/s
    /// * `accelerometer` - Accelerometer reading
    /// * `magnetometer` - Magnetometer reading
    /// * `delta_time` - Time step in seconds
    pub fn update(
        &mut self,
        gyroscope: Vector3<f32>,
        accelerometer: Vector3<f32>,
        magnetometer: Vector3<f32>,
        delta_time: f32,
    ) -> UnitQuaternion<f32> {
        if self.primed {
            self.accelerometer = low_pass(
                self.accelerometer,
                accelerometer,
                self.settings.accelerometer_smoothing,
            );
            self.magnetometer = low_pass(
                self.magnetometer,
                magnetometer,
                self.settings.magnetometer_smoothing,
            );
        } else {
            self.accelerometer = accelerometer;
            self.magnetometer = magnetometer;
            self.primed = true;
        }

        let mut seeded = false;
        if !self.seeded {
            if let Some(quaternion) = orientation_from_readings(self.accelerometer, self.magnetometer) {
                debug!("orientation seeded from readings");
                self.quaternion = quaternion;
                self.seeded = true;
                seeded = true;
            }
        }

        let result = step(
            &self.quaternion,
            gyroscope,
            self.accelerometer,
            self.magnetometer,
            self.settings.beta,
            delta_time,
        );
        self.quaternion = result.quaternion;

        if result.degenerate {
            // Identity is a fallback, not an estimate
            self.seeded = false;
        } else if result.stalled {
            if let Some(quaternion) = orientation_from_readings(self.accelerometer, self.magnetometer) {
                debug!("gradient vanished away from the readings, reseeding orientation");
                self.quaternion = quaternion;
                seeded = true;
            }
        }

        self.flags = AhrsFlags {
            degenerate_input: result.degenerate,
            aligned: result.aligned,
            seeded,
        };
        self.quaternion
    }

    /// Update using the configured sample frequency as the time step
    pub fn update_fixed_rate(
        &mut self,
        gyroscope: Vector3<f32>,
        accelerometer: Vector3<f32>,
        magnetometer: Vector3<f32>,
    ) -> UnitQuaternion<f32> {
        let delta_time = 1.0 / self.settings.sample_frequency;
        self.update(gyroscope, accelerometer, magnetometer, delta_time)
    }

    /// Get current orientation quaternion
    pub fn quaternion(&self) -> UnitQuaternion<f32> {
        self.quaternion
    }

    /// Set orientation quaternion directly; the next update will not reseed it
    pub fn set_quaternion(&mut self, quaternion: UnitQuaternion<f32>) {
        self.quaternion = quaternion;
        self.seeded = true;
    }

    /// Direction the accelerometer is expected to report at rest, in the sensor frame
    pub fn gravity(&self) -> Vector3<f32> {
        self.quaternion.inverse_transform_vector(&Vector3::z())
    }

    /// Heading of the sensor X axis from magnetic north in degrees (-180..=180)
    pub fn heading(&self) -> f32 {
        let (_, _, yaw) = self.quaternion.euler_angles();
        yaw * RAD_TO_DEG
    }

    /// Last smoothed accelerometer reading
    pub fn accelerometer(&self) -> Vector3<f32> {
        self.accelerometer
    }

    /// Last smoothed magnetometer reading
    pub fn magnetometer(&self) -> Vector3<f32> {
        self.magnetometer
    }

    /// Get algorithm flags from the most recent update
    pub fn flags(&self) -> AhrsFlags {
        self.flags
    }
}

impl Default for Ahrs {
    fn default() -> Self {
        Self::new()
    }
}
