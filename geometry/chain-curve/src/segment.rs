//! Cubic Bézier segments between two control points.
//!
//! A segment is never stored by the curve. It is materialized on demand from
//! a pair of neighbouring [`ControlPoint`]s: the start point with its right
//! handle, and the end point with its left handle.

use crate::traits::DEGENERATE_EPSILON;
use crate::{ControlPoint, Curve};
use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A cubic Bézier segment from `p0` to `p1` shaped by handles `h0` and `h1`.
///
/// # Equation
///
/// ```text
/// B(u) = (1-u)³P₀ + 3(1-u)²u·H₀ + 3(1-u)u²·H₁ + u³P₁
/// ```
///
/// # Example
///
/// ```
/// use chain_curve::{CubicSegment, Curve};
/// use nalgebra::Point3;
///
/// let segment = CubicSegment::new(
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(4.0, 0.0, 0.0),
///     Point3::new(1.0, 2.0, 0.0),
///     Point3::new(3.0, 2.0, 0.0),
/// );
///
/// assert_eq!(segment.point_at(0.0), segment.p0);
/// assert_eq!(segment.point_at(1.0), segment.p1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CubicSegment {
    /// Start point.
    pub p0: Point3<f64>,
    /// End point.
    pub p1: Point3<f64>,
    /// Handle leaving the start point.
    pub h0: Point3<f64>,
    /// Handle entering the end point.
    pub h1: Point3<f64>,
}

impl CubicSegment {
    /// Create a segment from its endpoints and handles.
    #[must_use]
    pub const fn new(p0: Point3<f64>, p1: Point3<f64>, h0: Point3<f64>, h1: Point3<f64>) -> Self {
        Self { p0, p1, h0, h1 }
    }

    /// Build the segment joining two neighbouring control points.
    #[must_use]
    pub fn between(start: &ControlPoint, end: &ControlPoint) -> Self {
        Self::new(
            start.position,
            end.position,
            start.right_handle,
            end.left_handle,
        )
    }

    /// Second derivative at local parameter `u`.
    #[must_use]
    pub fn second_derivative_at(&self, u: f64) -> Vector3<f64> {
        let u = u.clamp(0.0, 1.0);
        let s = 1.0 - u;

        // B''(u) = 6(1-u)(H₁ - 2H₀ + P₀) + 6u(P₁ - 2H₁ + H₀)
        let a = self.h1.coords - self.h0.coords * 2.0 + self.p0.coords;
        let b = self.p1.coords - self.h1.coords * 2.0 + self.h0.coords;

        a * (6.0 * s) + b * (6.0 * u)
    }

    /// Polyline length over `sample_count` uniform intervals.
    ///
    /// Grows towards the true arc length as `sample_count` increases.
    #[must_use]
    pub fn approximate_length(&self, sample_count: usize) -> f64 {
        self.polyline_length(sample_count)
    }

    /// Length of the control polygon, an upper bound on the arc length.
    #[must_use]
    pub fn control_polygon_length(&self) -> f64 {
        (self.h0 - self.p0).norm() + (self.h1 - self.h0).norm() + (self.p1 - self.h1).norm()
    }

    /// Check whether all four defining points coincide within `tolerance`.
    #[must_use]
    pub fn is_collapsed(&self, tolerance: f64) -> bool {
        self.control_polygon_length() <= tolerance
    }
}

impl Curve for CubicSegment {
    fn point_at(&self, u: f64) -> Point3<f64> {
        point_on_cubic(u, self.p0, self.p1, self.h0, self.h1)
    }

    fn derivative_at(&self, u: f64) -> Vector3<f64> {
        let u = u.clamp(0.0, 1.0);
        let s = 1.0 - u;

        // B'(u) = 3(1-u)²(H₀-P₀) + 6(1-u)u(H₁-H₀) + 3u²(P₁-H₁)
        (self.h0 - self.p0) * (3.0 * s * s)
            + (self.h1 - self.h0) * (6.0 * s * u)
            + (self.p1 - self.h1) * (3.0 * u * u)
    }

    fn tangent_at(&self, u: f64) -> Vector3<f64> {
        let d = self.derivative_at(u);
        let norm = d.norm();
        if norm > DEGENERATE_EPSILON {
            return d / norm;
        }

        // Cusp where a handle sits on its point: the direction of travel is
        // the limit of the second derivative, reversed when arriving at it.
        let d2 = self.second_derivative_at(u);
        let norm = d2.norm();
        if norm > DEGENERATE_EPSILON {
            if u > 0.5 { -d2 / norm } else { d2 / norm }
        } else {
            Vector3::zeros()
        }
    }
}

/// Evaluate a cubic Bézier blend without building a [`CubicSegment`].
///
/// `u` is clamped to `[0, 1]`; the endpoints are reproduced bit-exactly.
#[inline]
#[must_use]
pub fn point_on_cubic(
    u: f64,
    p0: Point3<f64>,
    p1: Point3<f64>,
    h0: Point3<f64>,
    h1: Point3<f64>,
) -> Point3<f64> {
    let u = u.clamp(0.0, 1.0);
    let s = 1.0 - u;
    let s2 = s * s;
    let u2 = u * u;

    Point3::from(
        p0.coords * (s2 * s)
            + h0.coords * (3.0 * s2 * u)
            + h1.coords * (3.0 * s * u2)
            + p1.coords * (u2 * u),
    )
}

/// Unit tangent of a cubic Bézier blend, or zero when it is stationary.
#[inline]
#[must_use]
pub fn tangent_on_cubic(
    u: f64,
    p0: Point3<f64>,
    p1: Point3<f64>,
    h0: Point3<f64>,
    h1: Point3<f64>,
) -> Vector3<f64> {
    CubicSegment::new(p0, p1, h0, h1).tangent_at(u)
}
