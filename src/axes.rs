//! Sensor axes remapping for devices whose sensors are mounted differently
//!
//! Phone sensors do not agree on which physical axis points where. An
//! [`AxisAssignment`] records, for each output slot, which raw axis feeds it
//! and which raw axes have to be negated first.
//!
//! # Example
//! ```
//! use nalgebra::Vector3;
//! use tilt_compass_ahrs::{Axis, AxisAssignment, transform};
//!
//! // Raw Y becomes X, raw X (negated) becomes Y
//! let assignment = AxisAssignment::new([Axis::Y, Axis::X, Axis::Z], [true, false, false]);
//!
//! let remapped = transform(Vector3::new(1.0, 2.0, 3.0), &assignment);
//! assert_eq!(remapped, Vector3::new(2.0, -1.0, 3.0));
//! ```

use core::fmt;
use core::str::FromStr;

use nalgebra::Vector3;

/// A sensor axis label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    /// First component
    X = 0,
    /// Second component
    Y = 1,
    /// Third component
    Z = 2,
}

impl Axis {
    /// Axes in component order
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Component index of this axis
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Axis at a component index, `None` past 2
    pub fn from_index(index: usize) -> Option<Axis> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        };
        f.write_str(label)
    }
}

/// Error returned when a string is not an axis label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown axis label '{0}'")]
pub struct ParseAxisError(pub String);

impl FromStr for Axis {
    type Err = ParseAxisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "X" | "x" => Ok(Axis::X),
            "Y" | "y" => Ok(Axis::Y),
            "Z" | "z" => Ok(Axis::Z),
            other => Err(ParseAxisError(other.to_string())),
        }
    }
}

/// Mapping from raw sensor axes to output axes.
///
/// `axes[j]` names the raw axis that feeds output slot `j`. `inverted[i]`
/// negates raw component `i` before anything is permuted, so the flags are
/// indexed by raw axis, not by output slot.
///
/// Triples that repeat an axis are accepted and applied literally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisAssignment {
    /// Source axis for each output slot
    pub axes: [Axis; 3],
    /// Negation flag for each raw component
    pub inverted: [bool; 3],
}

impl AxisAssignment {
    /// Identity mapping with no inversions
    pub const IDENTITY: AxisAssignment = AxisAssignment {
        axes: [Axis::X, Axis::Y, Axis::Z],
        inverted: [false, false, false],
    };

    /// Create an assignment from its source axes and inversion flags
    pub fn new(axes: [Axis; 3], inverted: [bool; 3]) -> Self {
        Self { axes, inverted }
    }

    /// True when the axes are in X, Y, Z order. Inversions are not considered.
    pub fn is_identity_permutation(&self) -> bool {
        self.axes == Self::IDENTITY.axes
    }

    /// True when applying the assignment leaves every sample unchanged
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// True when every raw axis feeds exactly one output slot
    pub fn is_permutation(&self) -> bool {
        let mut seen = [false; 3];
        for axis in self.axes {
            seen[axis.index()] = true;
        }
        seen.iter().all(|&s| s)
    }

    /// The assignment that undoes this one, or `None` if an axis is repeated.
    ///
    /// # Example
    /// ```
    /// use nalgebra::Vector3;
    /// use tilt_compass_ahrs::{Axis, AxisAssignment, transform};
    ///
    /// let forward = AxisAssignment::new([Axis::Z, Axis::X, Axis::Y], [false, true, false]);
    /// let inverse = forward.inverse().unwrap();
    ///
    /// let v = Vector3::new(1.0, 2.0, 3.0);
    /// assert_eq!(transform(transform(v, &forward), &inverse), v);
    /// ```
    pub fn inverse(&self) -> Option<AxisAssignment> {
        if !self.is_permutation() {
            return None;
        }

        // Output slot j of the forward mapping holds raw axis axes[j], so the
        // inverse reads slot j back into that raw axis and re-applies its sign.
        let mut axes = Self::IDENTITY.axes;
        let mut inverted = [false; 3];
        for (slot, source) in self.axes.iter().enumerate() {
            axes[source.index()] = Axis::ALL[slot];
            inverted[slot] = self.inverted[source.index()];
        }

        Some(AxisAssignment { axes, inverted })
    }

    /// Reorders an assignment whose `axes[i]` labels raw axis `i` (the form
    /// [`AxisCalibrator`](crate::AxisCalibrator) writes) into one whose
    /// `axes[j]` names the raw source of output slot `j`.
    ///
    /// Inversion flags are indexed by raw axis in both forms and carry over
    /// unchanged. Swaps read the same either way; three-axis rotations do not.
    /// Returns `None` if a label is repeated.
    ///
    /// # Example
    /// ```
    /// use tilt_compass_ahrs::{Axis, AxisAssignment};
    ///
    /// // Raw X carries Y, raw Y carries Z, raw Z carries X
    /// let labels = AxisAssignment::new([Axis::Y, Axis::Z, Axis::X], [false; 3]);
    /// let sources = labels.to_source_order().unwrap();
    /// assert_eq!(sources.axes, [Axis::Z, Axis::X, Axis::Y]);
    /// ```
    pub fn to_source_order(&self) -> Option<AxisAssignment> {
        if !self.is_permutation() {
            return None;
        }

        let mut axes = Self::IDENTITY.axes;
        for (raw, label) in self.axes.iter().enumerate() {
            axes[label.index()] = Axis::ALL[raw];
        }

        Some(AxisAssignment {
            axes,
            inverted: self.inverted,
        })
    }

    /// Apply this assignment to a sample, see [`transform`]
    #[inline]
    pub fn apply(&self, sample: Vector3<f32>) -> Vector3<f32> {
        transform(sample, self)
    }
}

impl Default for AxisAssignment {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Remaps a raw sensor sample through an axis assignment.
///
/// Inversion is applied to the raw components first, then each output slot
/// reads its configured source axis. An identity permutation skips the
/// second step.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use tilt_compass_ahrs::{Axis, AxisAssignment, transform};
///
/// let sample = Vector3::new(0.1, -9.8, 0.3);
/// assert_eq!(transform(sample, &AxisAssignment::IDENTITY), sample);
///
/// let flipped = AxisAssignment::new([Axis::X, Axis::Y, Axis::Z], [false, true, false]);
/// assert_eq!(transform(sample, &flipped), Vector3::new(0.1, 9.8, 0.3));
/// ```
#[inline]
pub fn transform(sample: Vector3<f32>, assignment: &AxisAssignment) -> Vector3<f32> {
    let mut value = sample;
    for (component, &inverted) in value.iter_mut().zip(assignment.inverted.iter()) {
        if inverted {
            *component = -*component;
        }
    }

    if assignment.is_identity_permutation() {
        return value;
    }

    let [a, b, c] = assignment.axes;
    Vector3::new(value[a.index()], value[b.index()], value[c.index()])
}
