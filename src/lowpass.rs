//! Exponential low-pass smoothing of 3-axis sensor streams

use nalgebra::Vector3;

/// Blends the current reading into the previous smoothed value.
///
/// Returns `alpha * current + (1 - alpha) * previous`. An `alpha` of 1 passes
/// `current` through untouched, an `alpha` of 0 holds `previous` forever. The
/// caller owns the previous value and feeds the result back in next tick.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use tilt_compass_ahrs::low_pass;
///
/// let previous = Vector3::new(0.0, 0.0, 1.0);
/// let current = Vector3::new(0.0, 0.0, 3.0);
/// assert_eq!(low_pass(previous, current, 0.5), Vector3::new(0.0, 0.0, 2.0));
/// ```
#[inline]
pub fn low_pass(previous: Vector3<f32>, current: Vector3<f32>, alpha: f32) -> Vector3<f32> {
    current * alpha + previous * (1.0 - alpha)
}
