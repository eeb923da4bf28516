//! Core curve trait.
//!
//! Every curve in this crate is parameterized over `t ∈ [0, 1]`.

use nalgebra::{Point3, Vector3};

/// Derivative magnitude below which a curve is treated as stationary.
pub const DEGENERATE_EPSILON: f64 = 1e-10;

/// A parametric curve in 3D space.
///
/// # Implementors
///
/// - [`CubicSegment`](crate::CubicSegment) - One Bézier segment between two control points
/// - [`ChainCurve`](crate::ChainCurve) - Arc-length parametrized chain of segments
/// - [`BSpline`](crate::BSpline) - B-spline curves
pub trait Curve {
    /// Evaluate the curve position at parameter `t`.
    ///
    /// Out-of-range parameters are clamped to `[0, 1]`.
    fn point_at(&self, t: f64) -> Point3<f64>;

    /// Compute the first derivative (velocity) at parameter `t`.
    fn derivative_at(&self, t: f64) -> Vector3<f64>;

    /// Compute the unit tangent vector at parameter `t`.
    ///
    /// Returns the zero vector where the curve is stationary, so callers
    /// must check before building a frame from it.
    fn tangent_at(&self, t: f64) -> Vector3<f64> {
        normalize_or_zero(self.derivative_at(t))
    }

    /// Approximate the curve length with a polyline of `samples` intervals.
    fn polyline_length(&self, samples: usize) -> f64 {
        let samples = samples.max(1);
        let mut from = self.point_at(0.0);
        let mut length = 0.0;

        for i in 1..=samples {
            let to = self.point_at(i as f64 / samples as f64);
            length += (to - from).norm();
            from = to;
        }

        length
    }

    /// Sample the curve at uniform parameter intervals.
    ///
    /// # Returns
    ///
    /// Vector of `n` points (at least 2) evenly spaced in parameter space.
    fn sample_uniform(&self, n: usize) -> Vec<Point3<f64>> {
        let n = n.max(2);
        (0..n)
            .map(|i| {
                let t = i as f64 / (n - 1) as f64;
                self.point_at(t)
            })
            .collect()
    }

    /// Get the start point of the curve (`t=0`).
    fn start(&self) -> Point3<f64> {
        self.point_at(0.0)
    }

    /// Get the end point of the curve (`t=1`).
    fn end(&self) -> Point3<f64> {
        self.point_at(1.0)
    }
}

/// Normalize `v`, or return zero when it is too short or not finite.
#[inline]
#[must_use]
pub fn normalize_or_zero(v: Vector3<f64>) -> Vector3<f64> {
    let norm = v.norm();
    if norm > DEGENERATE_EPSILON && norm.is_finite() {
        v / norm
    } else {
        Vector3::zeros()
    }
}
