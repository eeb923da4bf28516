//! B-spline curves.
//!
//! A generalization of the fixed three-point chain for callers that need an
//! arbitrary number of control points and degree. Basis functions are
//! computed with the iterative Cox-de Boor triangle, so cost grows with the
//! square of the degree and there is no recursion.

use crate::{Curve, CurveError, Result};
use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Highest supported degree.
pub const MAX_DEGREE: usize = 7;

/// A B-spline curve of arbitrary degree.
///
/// The knot vector must be non-decreasing and have length `n + p + 1`, where
/// `n` is the number of control points and `p` is the degree.
///
/// # Example
///
/// ```
/// use chain_curve::{BSpline, Curve};
/// use nalgebra::Point3;
///
/// let control_points = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 3.0, 2.0),
///     Point3::new(2.0, -1.0, 1.0),
///     Point3::new(3.0, 2.0, 4.0),
///     Point3::new(4.0, 0.0, 3.0),
/// ];
///
/// let spline = BSpline::clamped(control_points, 3).unwrap();
///
/// // Clamped splines interpolate their end points
/// let start = spline.point_at(0.0);
/// assert!(start.coords.norm() < 1e-10);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BSpline {
    /// Control points.
    control_points: Vec<Point3<f64>>,
    /// Knot vector.
    knots: Vec<f64>,
    /// Degree of the B-spline.
    degree: usize,
}

impl BSpline {
    /// Create a B-spline with an explicit knot vector.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The degree is outside `1..=MAX_DEGREE`
    /// - Fewer than `degree + 1` control points
    /// - A control point is not finite
    /// - Knot vector has incorrect length, decreases, or spans an empty domain
    pub fn new(control_points: Vec<Point3<f64>>, knots: Vec<f64>, degree: usize) -> Result<Self> {
        if !(1..=MAX_DEGREE).contains(&degree) {
            return Err(CurveError::InvalidDegree {
                degree,
                min: 1,
                max: MAX_DEGREE,
            });
        }

        let n = control_points.len();
        if n < degree + 1 {
            return Err(CurveError::insufficient_points(degree + 1, n));
        }

        if let Some(index) = control_points
            .iter()
            .position(|p| !p.coords.iter().all(|c| c.is_finite()))
        {
            return Err(CurveError::NonFinitePoint { index });
        }

        let expected_knots = n + degree + 1;
        if knots.len() != expected_knots {
            return Err(CurveError::invalid_knot_vector(format!(
                "expected {} knots for {} control points and degree {}, got {}",
                expected_knots,
                n,
                degree,
                knots.len()
            )));
        }

        for i in 1..knots.len() {
            if knots[i] < knots[i - 1] {
                return Err(CurveError::invalid_knot_vector(format!(
                    "knot vector is not non-decreasing at index {} ({} < {})",
                    i,
                    knots[i],
                    knots[i - 1]
                )));
            }
        }

        if knots[degree] >= knots[n] {
            return Err(CurveError::invalid_knot_vector("parameter domain is empty"));
        }

        Ok(Self {
            control_points,
            knots,
            degree,
        })
    }

    /// Create a clamped B-spline with uniform interior knots.
    ///
    /// The first and last knots are repeated `degree + 1` times so the curve
    /// passes through its first and last control points.
    ///
    /// # Errors
    ///
    /// Returns error if the degree is unsupported or there are fewer than
    /// `degree + 1` control points.
    pub fn clamped(control_points: Vec<Point3<f64>>, degree: usize) -> Result<Self> {
        let n = control_points.len();

        if n < degree + 1 {
            return Err(CurveError::insufficient_points(degree + 1, n));
        }

        let mut knots = Vec::with_capacity(n + degree + 1);
        knots.extend(std::iter::repeat_n(0.0, degree + 1));

        let num_interior = n - degree - 1;
        for i in 1..=num_interior {
            knots.push(i as f64 / (num_interior + 1) as f64);
        }

        knots.extend(std::iter::repeat_n(1.0, degree + 1));

        Self::new(control_points, knots, degree)
    }

    /// Get the control points.
    #[must_use]
    pub fn control_points(&self) -> &[Point3<f64>] {
        &self.control_points
    }

    /// Get the knot vector.
    #[must_use]
    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    /// Get the degree.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Get the valid parameter domain `[u_min, u_max]`.
    #[must_use]
    pub fn domain(&self) -> (f64, f64) {
        let p = self.degree;
        (self.knots[p], self.knots[self.knots.len() - p - 1])
    }

    /// Map `t ∈ [0, 1]` into the knot domain.
    fn domain_param(&self, t: f64) -> f64 {
        let (u_min, u_max) = self.domain();
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        u_min + t * (u_max - u_min)
    }

    /// Control points of the derivative curve (degree `p - 1`).
    fn derivative_points(&self) -> Vec<Vector3<f64>> {
        let p = self.degree;
        self.control_points
            .windows(2)
            .enumerate()
            .map(|(i, pair)| {
                let span = self.knots[i + p + 1] - self.knots[i + 1];
                if span > 1e-15 {
                    (pair[1] - pair[0]) * (p as f64 / span)
                } else {
                    Vector3::zeros()
                }
            })
            .collect()
    }
}

impl Curve for BSpline {
    fn point_at(&self, t: f64) -> Point3<f64> {
        let u = self.domain_param(t);
        let points = &self.control_points;
        Point3::from(de_boor_sum(points.len(), |i| points[i].coords, &self.knots, self.degree, u))
    }

    fn derivative_at(&self, t: f64) -> Vector3<f64> {
        let u = self.domain_param(t);
        let points = self.derivative_points();
        let knots = &self.knots[1..self.knots.len() - 1];
        let (u_min, u_max) = self.domain();

        let deriv = if self.degree == 1 {
            // Piecewise constant: pick the span directly
            let span = find_span(knots, points.len(), 0, u);
            points[span]
        } else {
            de_boor_sum(points.len(), |i| points[i], knots, self.degree - 1, u)
        };

        deriv * (u_max - u_min)
    }
}

/// Find the knot span index `i` with `knots[i] <= u < knots[i+1]`,
/// restricted to `[degree, n-1]`.
fn find_span(knots: &[f64], n: usize, degree: usize, u: f64) -> usize {
    if u >= knots[n] {
        return n - 1;
    }

    let mut low = degree;
    let mut high = n;

    while low < high {
        let mid = (low + high) / 2;
        if knots[mid] > u {
            high = mid;
        } else {
            low = mid + 1;
        }
    }

    low.saturating_sub(1).max(degree)
}

/// Non-zero basis functions at `u` for `span`, via the Cox-de Boor triangle.
fn basis_functions(knots: &[f64], degree: usize, span: usize, u: f64) -> Vec<f64> {
    let p = degree;
    let mut n_basis = vec![0.0; p + 1];
    let mut left = vec![0.0; p + 1];
    let mut right = vec![0.0; p + 1];

    n_basis[0] = 1.0;

    for j in 1..=p {
        left[j] = u - knots[span + 1 - j];
        right[j] = knots[span + j] - u;

        let mut saved = 0.0;
        for r in 0..j {
            let denom = right[r + 1] + left[j - r];
            if denom.abs() > 1e-15 {
                let temp = n_basis[r] / denom;
                n_basis[r] = saved + right[r + 1] * temp;
                saved = left[j - r] * temp;
            } else {
                n_basis[r] = saved;
                saved = 0.0;
            }
        }
        n_basis[j] = saved;
    }

    n_basis
}

/// Weighted sum of the `degree + 1` control points active at `u`.
fn de_boor_sum<F>(n: usize, point: F, knots: &[f64], degree: usize, u: f64) -> Vector3<f64>
where
    F: Fn(usize) -> Vector3<f64>,
{
    let span = find_span(knots, n, degree, u);
    let basis = basis_functions(knots, degree, span, u);

    basis
        .iter()
        .enumerate()
        .fold(Vector3::zeros(), |acc, (i, &b)| acc + point(span - degree + i) * b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CubicSegment;
    use approx::assert_relative_eq;

    fn reference_points() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 3.0, 2.0),
            Point3::new(2.0, -1.0, 1.0),
            Point3::new(3.0, 2.0, 4.0),
            Point3::new(4.0, 0.0, 3.0),
        ]
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_clamped_interpolates_endpoints() {
        let points = reference_points();
        let spline = BSpline::clamped(points.clone(), 3).unwrap();

        assert_relative_eq!(spline.point_at(0.0).coords, points[0].coords, epsilon = 1e-10);
        assert_relative_eq!(spline.point_at(1.0).coords, points[4].coords, epsilon = 1e-10);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_single_span_cubic_matches_bezier() {
        let points: Vec<_> = reference_points().into_iter().take(4).collect();
        let spline = BSpline::clamped(points.clone(), 3).unwrap();
        let bezier = CubicSegment::new(points[0], points[3], points[1], points[2]);

        for i in 0..=10 {
            let t = f64::from(i) / 10.0;
            assert_relative_eq!(spline.point_at(t).coords, bezier.point_at(t).coords, epsilon = 1e-10);
            assert_relative_eq!(spline.derivative_at(t), bezier.derivative_at(t), epsilon = 1e-9);
        }
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_partition_of_unity() {
        let spline = BSpline::clamped(reference_points(), 3).unwrap();
        for i in 0..=20 {
            let u = f64::from(i) / 20.0;
            let span = find_span(spline.knots(), 5, 3, u);
            let sum: f64 = basis_functions(spline.knots(), 3, span, u).iter().sum();
            assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_derivative_matches_finite_difference() {
        let spline = BSpline::clamped(reference_points(), 3).unwrap();
        let h = 1e-6;
        for &t in &[0.1, 0.45, 0.8] {
            let numeric = (spline.point_at(t + h) - spline.point_at(t - h)) / (2.0 * h);
            assert_relative_eq!(spline.derivative_at(t), numeric, epsilon = 1e-4);
        }
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_linear_passes_through_control_points() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let spline = BSpline::clamped(points, 1).unwrap();

        let mid = spline.point_at(0.5);
        assert_relative_eq!(mid.coords, Vector3::new(1.0, 1.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(spline.tangent_at(0.25), Vector3::new(1.0, 1.0, 0.0).normalize(), epsilon = 1e-12);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_invalid_construction() {
        let two = vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)];
        assert!(BSpline::clamped(two.clone(), 3).unwrap_err().is_insufficient_points());
        assert!(matches!(
            BSpline::clamped(two.clone(), 0),
            Err(CurveError::InvalidDegree { .. })
        ));
        assert!(matches!(
            BSpline::new(two.clone(), vec![0.0, 1.0, 0.5, 1.0], 1),
            Err(CurveError::InvalidKnotVector { .. })
        ));
        assert!(matches!(
            BSpline::new(two, vec![0.0, 0.0, 0.0], 1),
            Err(CurveError::InvalidKnotVector { .. })
        ));

        let bad = vec![Point3::origin(), Point3::new(f64::INFINITY, 0.0, 0.0)];
        assert_eq!(
            BSpline::clamped(bad, 1),
            Err(CurveError::NonFinitePoint { index: 1 })
        );
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_out_of_range_parameters_clamp() {
        let spline = BSpline::clamped(reference_points(), 3).unwrap();
        assert_eq!(spline.point_at(-1.0), spline.point_at(0.0));
        assert_eq!(spline.point_at(2.0), spline.point_at(1.0));
        assert_eq!(spline.point_at(f64::NAN), spline.point_at(0.0));
    }
}
