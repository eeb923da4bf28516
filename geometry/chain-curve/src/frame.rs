//! Bone frames along a curve.
//!
//! A frame is the orthonormal basis (tangent, normal, binormal) used to
//! orient a bone at a point on the curve. Frames are built from the curve
//! tangent and a reference "up" axis:
//!
//! ```text
//! binormal = normalize(up × tangent)
//! normal   = normalize(tangent × binormal)
//! ```
//!
//! When `up` is parallel to the tangent the cross product vanishes, and as the
//! tangent sweeps past `up` it changes sign. A caller that passes the
//! binormal it used last time as a hint gets a frame that stays on the same
//! side as that hint, eased fully onto the hint within [`ALIGNMENT_BAND`] of
//! `up`. Without a usable hint, a vanishing cross product falls back to the
//! world axis least aligned with the tangent. The same inputs always give the
//! same frame.
//!
//! Bones are oriented with local `+Y` along the tangent and local `+Z` along
//! the normal, so local `+X` is `tangent × normal` (= `-binormal`).

use crate::traits::DEGENERATE_EPSILON;
use nalgebra::{Point3, Rotation3, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Cross-product magnitude (for unit inputs) below which two directions are
/// treated as parallel.
pub const PARALLEL_EPSILON: f64 = 1e-6;

/// Cross-product magnitude (for unit inputs) below which [`build_frame`]
/// starts easing the binormal from the reference axis onto the hint.
pub const ALIGNMENT_BAND: f64 = 0.1;

/// An orthonormal frame at a point on a curve.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Frame {
    /// Position on the curve.
    pub position: Point3<f64>,
    /// Unit tangent (direction of travel).
    pub tangent: Vector3<f64>,
    /// Unit normal, `tangent × binormal`.
    pub normal: Vector3<f64>,
    /// Unit binormal, perpendicular to the tangent and the reference axis.
    pub binormal: Vector3<f64>,
}

impl Frame {
    /// Create a frame from already orthonormal vectors.
    #[must_use]
    pub fn new(
        position: Point3<f64>,
        tangent: Vector3<f64>,
        normal: Vector3<f64>,
        binormal: Vector3<f64>,
    ) -> Self {
        Self {
            position,
            tangent,
            normal,
            binormal,
        }
    }

    /// Bone orientation for this frame.
    ///
    /// Local `+Y` maps to the tangent, local `+Z` to the normal.
    #[must_use]
    pub fn to_rotation(&self) -> UnitQuaternion<f64> {
        let x = self.tangent.cross(&self.normal);
        let basis = Rotation3::from_basis_unchecked(&[x, self.tangent, self.normal]);
        UnitQuaternion::from_rotation_matrix(&basis)
    }

    /// Recover a frame from a bone orientation.
    #[must_use]
    pub fn from_rotation(position: Point3<f64>, rotation: &UnitQuaternion<f64>) -> Self {
        let m = rotation.to_rotation_matrix();
        let x: Vector3<f64> = m.matrix().column(0).into_owned();
        Self {
            position,
            tangent: m.matrix().column(1).into_owned(),
            normal: m.matrix().column(2).into_owned(),
            binormal: -x,
        }
    }

    /// Check if the frame is orthonormal within tolerance.
    #[must_use]
    pub fn is_orthonormal(&self, tolerance: f64) -> bool {
        let t_len = (self.tangent.norm() - 1.0).abs();
        let n_len = (self.normal.norm() - 1.0).abs();
        let b_len = (self.binormal.norm() - 1.0).abs();
        let tn_dot = self.tangent.dot(&self.normal).abs();
        let tb_dot = self.tangent.dot(&self.binormal).abs();
        let nb_dot = self.normal.dot(&self.binormal).abs();

        t_len < tolerance
            && n_len < tolerance
            && b_len < tolerance
            && tn_dot < tolerance
            && tb_dot < tolerance
            && nb_dot < tolerance
    }

    /// Whether every component is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.coords.iter().all(|c| c.is_finite())
            && self.tangent.iter().all(|c| c.is_finite())
            && self.normal.iter().all(|c| c.is_finite())
            && self.binormal.iter().all(|c| c.is_finite())
    }
}

/// Build a frame from a tangent and a reference up axis.
///
/// Returns `None` when the tangent is zero or not finite; the caller keeps
/// its previous orientation in that case. Otherwise the frame is always
/// orthonormal and finite, including when `reference_up` is parallel to the
/// tangent.
///
/// `hint` is the binormal this frame should stay continuous with, usually
/// the one the same bone had on the previous pass. The reference binormal is
/// taken on the hint's side, and near `reference_up` it is blended onto the
/// hint, so sweeping the tangent through `reference_up` does not flip the
/// frame.
///
/// # Example
///
/// ```
/// use chain_curve::build_frame;
/// use nalgebra::{Point3, Vector3};
///
/// // Tangent parallel to up: still a valid frame
/// let frame = build_frame(Point3::origin(), &Vector3::z(), &Vector3::z(), None).unwrap();
/// assert!(frame.is_orthonormal(1e-10));
/// ```
#[must_use]
pub fn build_frame(
    position: Point3<f64>,
    tangent: &Vector3<f64>,
    reference_up: &Vector3<f64>,
    hint: Option<&Vector3<f64>>,
) -> Option<Frame> {
    let tangent = unit(tangent)?;

    let across = unit(reference_up).map_or_else(Vector3::zeros, |up| up.cross(&tangent));
    let reference = unit_if_not_parallel(&across);
    let hint = hint.and_then(|h| project_off(h, &tangent));

    let binormal = match (reference, hint) {
        (Some(reference), Some(hint)) => {
            let weight = smoothstep(across.norm() / ALIGNMENT_BAND);
            // Unchanged when `up × tangent` changes sign
            let aligned = reference * reference.dot(&hint);
            unit_if_not_parallel(&(aligned * weight + hint * (1.0 - weight))).unwrap_or(reference)
        }
        (Some(reference), None) => reference,
        (None, Some(hint)) => hint,
        (None, None) => fallback_binormal(&tangent),
    };

    let normal = tangent.cross(&binormal).normalize();
    Some(Frame::new(position, tangent, normal, binormal))
}

/// Transport `prev` to a new point and tangent with minimal twist.
///
/// Uses the double reflection method (Wang et al., 2008). Returns `None` for
/// a zero or non-finite tangent.
#[must_use]
pub fn transport_frame(
    prev: &Frame,
    position: Point3<f64>,
    tangent: &Vector3<f64>,
) -> Option<Frame> {
    let tangent = unit(tangent)?;

    let v1 = position - prev.position;
    let c1 = v1.dot(&v1);

    let normal = if c1 < 1e-20 {
        // Points are coincident: rotate the previous normal onto the new tangent
        project_off(&prev.normal, &tangent)
    } else {
        // First reflection across the plane perpendicular to v1
        let r_l = prev.normal - v1 * (2.0 / c1) * v1.dot(&prev.normal);
        let t_l = prev.tangent - v1 * (2.0 / c1) * v1.dot(&prev.tangent);

        // Second reflection maps t_l onto the new tangent
        let v2 = tangent - t_l;
        let c2 = v2.dot(&v2);
        let reflected = if c2 < 1e-20 {
            r_l
        } else {
            r_l - v2 * (2.0 / c2) * v2.dot(&r_l)
        };
        project_off(&reflected, &tangent)
    };

    let normal = normal.unwrap_or_else(|| fallback_binormal(&tangent).cross(&tangent));
    let binormal = normal.cross(&tangent);

    Some(Frame::new(position, tangent, normal, binormal))
}

/// Delta-encode world rotations along a parented chain, in place.
///
/// Afterwards `rotations[0] = parent⁻¹ · world[0]` and
/// `rotations[i] = world[i-1]⁻¹ · world[i]`, the local rotations that
/// reproduce the world rotations when composed down the hierarchy.
pub fn delta_encode(parent: &UnitQuaternion<f64>, rotations: &mut [UnitQuaternion<f64>]) {
    for i in (1..rotations.len()).rev() {
        rotations[i] = rotations[i - 1].inverse() * rotations[i];
    }
    if let Some(first) = rotations.first_mut() {
        *first = parent.inverse() * *first;
    }
}

/// Inverse of [`delta_encode`]: compose local rotations back to world space.
pub fn delta_decode(parent: &UnitQuaternion<f64>, rotations: &mut [UnitQuaternion<f64>]) {
    if let Some(first) = rotations.first_mut() {
        *first = parent * *first;
    }
    for i in 1..rotations.len() {
        rotations[i] = rotations[i - 1] * rotations[i];
    }
}

/// Unit binormal for a tangent with no usable reference or hint.
///
/// Crosses the tangent with the world axis least aligned to it, checked in
/// X, Y, Z order.
#[must_use]
pub fn fallback_binormal(tangent: &Vector3<f64>) -> Vector3<f64> {
    let abs = tangent.abs();
    let axis = if abs.x <= abs.y && abs.x <= abs.z {
        Vector3::x()
    } else if abs.y <= abs.z {
        Vector3::y()
    } else {
        Vector3::z()
    };
    axis.cross(tangent).normalize()
}

fn unit(v: &Vector3<f64>) -> Option<Vector3<f64>> {
    let norm = v.norm();
    (norm > DEGENERATE_EPSILON && norm.is_finite()).then(|| v / norm)
}

fn unit_if_not_parallel(cross: &Vector3<f64>) -> Option<Vector3<f64>> {
    let norm = cross.norm();
    (norm > PARALLEL_EPSILON && norm.is_finite()).then(|| cross / norm)
}

#[inline]
fn smoothstep(x: f64) -> f64 {
    let x = x.clamp(0.0, 1.0);
    x * x * (3.0 - 2.0 * x)
}

/// Component of `v` perpendicular to unit `axis`, normalized.
fn project_off(v: &Vector3<f64>, axis: &Vector3<f64>) -> Option<Vector3<f64>> {
    unit_if_not_parallel(&(v - axis * axis.dot(v)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_frame_formula() {
        let tangent = Vector3::x();
        let up = Vector3::z();
        let frame = build_frame(Point3::origin(), &tangent, &up, None).unwrap();

        // binormal = z × x = y, normal = x × y = z
        assert_relative_eq!(frame.binormal, Vector3::y(), epsilon = 1e-12);
        assert_relative_eq!(frame.normal, Vector3::z(), epsilon = 1e-12);
        assert!(frame.is_orthonormal(1e-12));
    }

    #[test]
    fn test_zero_tangent_has_no_frame() {
        let up = Vector3::z();
        assert!(build_frame(Point3::origin(), &Vector3::zeros(), &up, None).is_none());
        let nan = Vector3::new(f64::NAN, 0.0, 0.0);
        assert!(build_frame(Point3::origin(), &nan, &up, None).is_none());
    }

    #[test]
    fn test_parallel_up_uses_hint() {
        let hint = Vector3::new(0.0, 1.0, 0.3);
        let frame = build_frame(Point3::origin(), &Vector3::z(), &Vector3::z(), Some(&hint)).unwrap();

        // Hint projected off the tangent
        assert_relative_eq!(frame.binormal, Vector3::y(), epsilon = 1e-12);
        assert!(frame.is_orthonormal(1e-12));
    }

    /// Largest rotation between consecutive frames when the tangent sweeps
    /// through `(sin a, offset, cos a)` and each frame is hinted by the last.
    fn max_sweep_step(offset: f64, from: f64, step: f64, steps: u32) -> f64 {
        let up = Vector3::z();
        let mut previous: Option<Frame> = None;
        let mut max_step = 0.0_f64;

        for i in 0..=steps {
            let a = from + step * f64::from(i);
            let tangent = Vector3::new(a.sin(), offset, a.cos());
            let hint = previous.map(|f| f.binormal);
            let frame = build_frame(Point3::origin(), &tangent, &up, hint.as_ref()).unwrap();
            assert!(frame.is_orthonormal(1e-9));

            if let Some(prev) = previous {
                max_step = max_step.max(prev.to_rotation().angle_to(&frame.to_rotation()));
            }
            previous = Some(frame);
        }
        max_step
    }

    #[test]
    fn test_sweep_through_up_does_not_flip() {
        // Straight through the pole: only the tangent itself moves
        assert!(max_sweep_step(0.0, -0.025, 0.0005, 100) < 0.01);
        // Wide sweep crossing both edges of the alignment band
        assert!(max_sweep_step(0.0, -0.5, 0.005, 200) < 0.05);
        // Passing just beside the pole, where `up × tangent` spins quickly
        assert!(max_sweep_step(0.01, -0.1, 0.0005, 400) < 0.1);
    }

    #[test]
    fn test_hint_picks_side_away_from_up() {
        // Far from `up` the reference direction wins, on the hint's side
        let tangent = Vector3::x();
        let frame = build_frame(Point3::origin(), &tangent, &Vector3::z(), Some(&-Vector3::y())).unwrap();
        assert_relative_eq!(frame.binormal, -Vector3::y(), epsilon = 1e-12);

        let frame = build_frame(Point3::origin(), &tangent, &Vector3::z(), Some(&Vector3::y())).unwrap();
        assert_relative_eq!(frame.binormal, Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn test_parallel_up_without_hint_uses_world_axis() {
        for tangent in [Vector3::x(), -Vector3::y(), Vector3::z(), Vector3::new(1.0, 1.0, 1.0)] {
            let frame = build_frame(Point3::origin(), &tangent, &tangent, None).unwrap();
            assert!(frame.is_finite());
            assert!(frame.is_orthonormal(1e-10));
        }
        // Anti-parallel
        let frame = build_frame(Point3::origin(), &Vector3::y(), &-Vector3::y(), None).unwrap();
        assert!(frame.is_orthonormal(1e-10));
    }

    #[test]
    fn test_fallback_is_deterministic() {
        let tangent = Vector3::new(0.0, 0.0, 2.0);
        let a = build_frame(Point3::origin(), &tangent, &Vector3::z(), None).unwrap();
        let b = build_frame(Point3::origin(), &tangent, &Vector3::z(), None).unwrap();
        assert_eq!(a, b);
        // Least aligned axis is X; x × z = -y
        assert_relative_eq!(a.binormal, -Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn test_no_nan_for_any_nonzero_tangent() {
        let up = Vector3::y();
        for i in 0..64 {
            let angle = f64::from(i) * std::f64::consts::TAU / 64.0;
            let tangent = Vector3::new(angle.cos() * 1e-3, angle.sin(), 0.0);
            let frame = build_frame(Point3::origin(), &tangent, &up, None).unwrap();
            assert!(frame.is_finite());
            assert!(frame.is_orthonormal(1e-9));
        }
    }

    #[test]
    fn test_rotation_maps_bone_axes() {
        let tangent = Vector3::new(1.0, 2.0, -0.5).normalize();
        let frame = build_frame(Point3::origin(), &tangent, &Vector3::z(), None).unwrap();
        let q = frame.to_rotation();

        assert_relative_eq!(q * Vector3::y(), frame.tangent, epsilon = 1e-10);
        assert_relative_eq!(q * Vector3::z(), frame.normal, epsilon = 1e-10);
        assert_relative_eq!(q * Vector3::x(), -frame.binormal, epsilon = 1e-10);

        let back = Frame::from_rotation(frame.position, &q);
        assert_relative_eq!(back.tangent, frame.tangent, epsilon = 1e-10);
        assert_relative_eq!(back.binormal, frame.binormal, epsilon = 1e-10);
    }

    #[test]
    fn test_delta_roundtrip() {
        let parent = UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3);
        let world = [
            UnitQuaternion::from_euler_angles(0.5, 0.0, 0.0),
            UnitQuaternion::from_euler_angles(0.5, 0.4, 0.0),
            UnitQuaternion::from_euler_angles(0.2, 0.4, -1.0),
        ];

        let mut local = world;
        delta_encode(&parent, &mut local);
        assert_relative_eq!(local[1], world[0].inverse() * world[1], epsilon = 1e-12);
        assert_relative_eq!(local[2], world[1].inverse() * world[2], epsilon = 1e-12);
        assert_relative_eq!(local[0], parent.inverse() * world[0], epsilon = 1e-12);

        delta_decode(&parent, &mut local);
        for (decoded, expected) in local.iter().zip(&world) {
            assert_relative_eq!(*decoded, *expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_delta_encode_empty() {
        let mut rotations: [UnitQuaternion<f64>; 0] = [];
        delta_encode(&UnitQuaternion::identity(), &mut rotations);
    }

    #[test]
    fn test_transport_straight_line_keeps_normal() {
        let first = build_frame(Point3::origin(), &Vector3::x(), &Vector3::z(), None).unwrap();
        let mut prev = first;
        for i in 1..5 {
            let next = transport_frame(&prev, Point3::new(f64::from(i), 0.0, 0.0), &Vector3::x())
                .unwrap();
            assert!(next.is_orthonormal(1e-10));
            assert_relative_eq!(next.normal, first.normal, epsilon = 1e-10);
            prev = next;
        }
    }

    #[test]
    fn test_transport_around_bend() {
        let first = build_frame(Point3::origin(), &Vector3::x(), &Vector3::z(), None).unwrap();
        let next = transport_frame(&first, Point3::new(1.0, 1.0, 0.0), &Vector3::y()).unwrap();
        assert!(next.is_orthonormal(1e-10));
        // Planar bend in XY keeps the out-of-plane normal
        assert_relative_eq!(next.normal, Vector3::z(), epsilon = 1e-10);
    }
}
