//! Arc-length parametrized chain of cubic segments.

use crate::arc_length::{ArcLengthTable, samples_per_segment};
use crate::{ControlPoint, CubicSegment, Curve, CurveError, Result};
use nalgebra::{Point3, Vector3};

/// A smooth curve through `N ≥ 2` control points, evaluated by arc length.
///
/// Segment `i` runs from control point `i` to `i + 1`, leaving along the
/// right handle of the first and arriving along the left handle of the
/// second. The global parameter `t ∈ [0, 1]` is distributed over segments in
/// proportion to their approximate lengths, so evenly spaced parameters land
/// at roughly even distances along the curve.
///
/// All storage is allocated in [`ChainCurve::new`]; [`ChainCurve::update`]
/// refills it in place.
///
/// # Example
///
/// ```
/// use chain_curve::{ChainCurve, ControlPoint};
/// use nalgebra::{Point3, UnitQuaternion, Vector3};
///
/// let mut curve = ChainCurve::new(3, 500).unwrap();
/// let points = [
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 3.0, 2.0),
///     Point3::new(2.0, -1.0, 1.0),
/// ]
/// .map(|p| ControlPoint::from_pose(p, UnitQuaternion::identity(), 1.0, &Vector3::y()));
///
/// curve.update(&points).unwrap();
/// assert_eq!(curve.evaluate(0.0), points[0].position);
/// assert_eq!(curve.evaluate(1.0), points[2].position);
/// ```
#[derive(Debug, Clone)]
pub struct ChainCurve {
    control_points: Vec<ControlPoint>,
    table: ArcLengthTable,
    samples_per_segment: usize,
}

impl ChainCurve {
    /// Allocate a curve for `control_count` control points.
    ///
    /// `sample_budget` is shared evenly between the segments when measuring
    /// their lengths.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::InsufficientPoints`] if `control_count < 2` and
    /// [`CurveError::InvalidSampleBudget`] if `sample_budget` is zero.
    pub fn new(control_count: usize, sample_budget: usize) -> Result<Self> {
        if control_count < 2 {
            return Err(CurveError::insufficient_points(2, control_count));
        }
        if sample_budget == 0 {
            return Err(CurveError::InvalidSampleBudget(sample_budget));
        }

        let segments = control_count - 1;
        Ok(Self {
            control_points: vec![ControlPoint::default(); control_count],
            table: ArcLengthTable::with_capacity(segments),
            samples_per_segment: samples_per_segment(sample_budget, segments),
        })
    }

    /// Build a curve directly from control points.
    ///
    /// # Errors
    ///
    /// Same conditions as [`ChainCurve::new`].
    pub fn from_control_points(points: &[ControlPoint], sample_budget: usize) -> Result<Self> {
        let mut curve = Self::new(points.len(), sample_budget)?;
        curve.update(points)?;
        Ok(curve)
    }

    /// Replace the control points and rebuild the arc-length table.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::ControlPointCount`] if `points` does not match
    /// the count the curve was allocated for. The curve is left unchanged.
    pub fn update(&mut self, points: &[ControlPoint]) -> Result<()> {
        if points.len() != self.control_points.len() {
            return Err(CurveError::control_point_count(
                self.control_points.len(),
                points.len(),
            ));
        }

        self.control_points.copy_from_slice(points);
        self.rebuild_table();
        Ok(())
    }

    fn rebuild_table(&mut self) {
        let points = &self.control_points;
        let segments = points
            .windows(2)
            .map(|pair| CubicSegment::between(&pair[0], &pair[1]));
        self.table.rebuild(segments, self.samples_per_segment);
    }

    /// Number of segments (`control points - 1`).
    #[must_use]
    pub fn num_segments(&self) -> usize {
        self.control_points.len() - 1
    }

    /// Segment `index`, clamped to the last segment.
    #[must_use]
    pub fn segment(&self, index: usize) -> CubicSegment {
        let index = index.min(self.num_segments() - 1);
        CubicSegment::between(&self.control_points[index], &self.control_points[index + 1])
    }

    /// Find the segment owning global parameter `t` and its local parameter.
    ///
    /// The index is always a valid segment, including for `t >= 1`.
    #[must_use]
    pub fn locate_segment(&self, t: f64) -> (usize, f64) {
        let (index, u) = self.table.locate(t);
        (index.min(self.num_segments() - 1), u)
    }

    /// Position at global parameter `t`.
    #[must_use]
    pub fn evaluate(&self, t: f64) -> Point3<f64> {
        let (index, u) = self.locate_segment(t);
        self.segment(index).point_at(u)
    }

    /// Unit tangent at global parameter `t`, zero where the curve is stationary.
    #[must_use]
    pub fn evaluate_tangent(&self, t: f64) -> Vector3<f64> {
        let (index, u) = self.locate_segment(t);
        self.segment(index).tangent_at(u)
    }

    /// Position and unit tangent at `t` from a single segment lookup.
    #[must_use]
    pub fn evaluate_with_tangent(&self, t: f64) -> (Point3<f64>, Vector3<f64>) {
        let (index, u) = self.locate_segment(t);
        let segment = self.segment(index);
        (segment.point_at(u), segment.tangent_at(u))
    }

    /// The current control points.
    #[must_use]
    pub fn control_points(&self) -> &[ControlPoint] {
        &self.control_points
    }

    /// The current arc-length table.
    #[must_use]
    pub fn table(&self) -> &ArcLengthTable {
        &self.table
    }

    /// Samples spent measuring each segment.
    #[must_use]
    pub fn samples_per_segment(&self) -> usize {
        self.samples_per_segment
    }
}

impl Curve for ChainCurve {
    fn point_at(&self, t: f64) -> Point3<f64> {
        self.evaluate(t)
    }

    fn derivative_at(&self, t: f64) -> Vector3<f64> {
        let (index, u) = self.locate_segment(t);
        let width = self.table.segment_fraction(index).unwrap_or(0.0);
        let local = self.segment(index).derivative_at(u);
        // Chain rule through the linear remap of t onto the segment
        if width > 1e-12 { local / width } else { local }
    }

    fn tangent_at(&self, t: f64) -> Vector3<f64> {
        self.evaluate_tangent(t)
    }
}
