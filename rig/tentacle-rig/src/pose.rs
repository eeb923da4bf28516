//! Bone pose type.

use nalgebra::{Point3, UnitQuaternion};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Angle below which two rotations are treated as equal when blending.
const SLERP_EPSILON: f64 = 1e-9;

/// Position and orientation of a bone or target.
///
/// Targets handed to the poser are world-space poses. Poses written back by
/// the poser carry world positions and local (parent-relative) rotations.
///
/// # Example
///
/// ```
/// use tentacle_rig::BonePose;
/// use nalgebra::Point3;
///
/// let a = BonePose::from_position(Point3::new(0.0, 0.0, 0.0));
/// let b = BonePose::from_position(Point3::new(2.0, 0.0, 0.0));
/// assert_eq!(a.lerp(&b, 0.5).position, Point3::new(1.0, 0.0, 0.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BonePose {
    /// Position in world coordinates.
    pub position: Point3<f64>,
    /// Orientation as a unit quaternion.
    pub rotation: UnitQuaternion<f64>,
}

impl Default for BonePose {
    fn default() -> Self {
        Self::identity()
    }
}

impl BonePose {
    /// Create an identity pose (origin, no rotation).
    #[must_use]
    pub fn identity() -> Self {
        Self {
            position: Point3::origin(),
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Create a pose from position only (identity rotation).
    #[must_use]
    pub fn from_position(position: Point3<f64>) -> Self {
        Self {
            position,
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Create a pose from position and rotation.
    #[must_use]
    pub const fn new(position: Point3<f64>, rotation: UnitQuaternion<f64>) -> Self {
        Self { position, rotation }
    }

    /// Interpolate towards `other`: lerp for position, slerp for rotation.
    ///
    /// `t` is clamped to `[0, 1]`. Rotations too close together for slerp to
    /// resolve snap to `other`.
    #[must_use]
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            position: Point3::from(self.position.coords.lerp(&other.position.coords, t)),
            rotation: self
                .rotation
                .try_slerp(&other.rotation, t, SLERP_EPSILON)
                .unwrap_or(other.rotation),
        }
    }

    /// Check if the pose contains `NaN` or `Inf` values.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.coords.iter().all(|x| x.is_finite())
            && self.rotation.coords.iter().all(|x| x.is_finite())
    }
}
