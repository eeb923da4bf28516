//! Control points with Bézier handles.

use nalgebra::{Point3, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An anchor the curve passes through, with the handles shaping it there.
///
/// The curve leaves a control point towards `right_handle` and arrives at it
/// from `left_handle`. `rotation` is the orientation of the transform the
/// point was sampled from.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ControlPoint {
    /// Position the curve passes through.
    pub position: Point3<f64>,
    /// Handle on the incoming side.
    pub left_handle: Point3<f64>,
    /// Handle on the outgoing side.
    pub right_handle: Point3<f64>,
    /// Orientation of the sampled transform.
    pub rotation: UnitQuaternion<f64>,
}

impl Default for ControlPoint {
    fn default() -> Self {
        Self::from_position(Point3::origin())
    }
}

impl ControlPoint {
    /// Create a control point from explicit handles.
    #[must_use]
    pub const fn new(
        position: Point3<f64>,
        left_handle: Point3<f64>,
        right_handle: Point3<f64>,
        rotation: UnitQuaternion<f64>,
    ) -> Self {
        Self {
            position,
            left_handle,
            right_handle,
            rotation,
        }
    }

    /// A control point whose handles sit on the point itself.
    #[must_use]
    pub fn from_position(position: Point3<f64>) -> Self {
        Self::new(position, position, position, UnitQuaternion::identity())
    }

    /// Derive handles from a sampled transform.
    ///
    /// The handles lie on the rotated `handle_axis`, `handle_length` away on
    /// either side: `position ± rotation·(axis·length)`.
    ///
    /// # Example
    ///
    /// ```
    /// use chain_curve::ControlPoint;
    /// use nalgebra::{Point3, UnitQuaternion, Vector3};
    ///
    /// let cp = ControlPoint::from_pose(
    ///     Point3::new(1.0, 0.0, 0.0),
    ///     UnitQuaternion::identity(),
    ///     1.0,
    ///     &Vector3::y(),
    /// );
    /// assert_eq!(cp.right_handle, Point3::new(1.0, 1.0, 0.0));
    /// assert_eq!(cp.left_handle, Point3::new(1.0, -1.0, 0.0));
    /// ```
    #[must_use]
    pub fn from_pose(
        position: Point3<f64>,
        rotation: UnitQuaternion<f64>,
        handle_length: f64,
        handle_axis: &Vector3<f64>,
    ) -> Self {
        let offset = rotation * (handle_axis * handle_length);
        Self::new(position, position - offset, position + offset, rotation)
    }

    /// Check that every coordinate is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.coords.iter().all(|c| c.is_finite())
            && self.left_handle.coords.iter().all(|c| c.is_finite())
            && self.right_handle.coords.iter().all(|c| c.is_finite())
    }
}
