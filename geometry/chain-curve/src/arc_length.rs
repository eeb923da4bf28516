//! Arc-length sampling and the cumulative length table.
//!
//! Each segment's length is approximated by a polyline through uniformly
//! spaced samples. The table stores, for every segment, the fraction of the
//! total curve length covered up to the end of that segment. Looking up a
//! global parameter in the table yields the owning segment and the local
//! parameter inside it.

use crate::{CubicSegment, CurveError, Result};
use tracing::warn;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Sampling budget used when none is configured.
pub const DEFAULT_SAMPLE_BUDGET: usize = 500;

/// Samples spent on each segment when `sample_budget` is shared evenly.
///
/// ```
/// use chain_curve::samples_per_segment;
///
/// assert_eq!(samples_per_segment(500, 2), 251);
/// ```
#[must_use]
pub fn samples_per_segment(sample_budget: usize, segment_count: usize) -> usize {
    sample_budget / segment_count.max(1) + 1
}

/// Approximate the length of one segment with `sample_count` intervals.
#[must_use]
pub fn approximate_segment_length(segment: &CubicSegment, sample_count: usize) -> f64 {
    segment.approximate_length(sample_count)
}

/// Cumulative arc-length fractions over a chain of segments.
///
/// # Invariants
///
/// - `fractions` is non-decreasing.
/// - When the total length is positive, the last fraction is exactly `1.0`.
/// - When the total length is zero the table is degenerate and every lookup
///   resolves to segment 0 at local time 0.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ArcLengthTable {
    /// Fraction of the total length reached at the end of each segment.
    fractions: Vec<f64>,
    /// Total approximate length.
    total_length: f64,
    /// Set when the total length is zero.
    degenerate: bool,
}

impl ArcLengthTable {
    /// Create an empty table able to hold `segments` entries without
    /// reallocating.
    #[must_use]
    pub fn with_capacity(segments: usize) -> Self {
        Self {
            fractions: Vec::with_capacity(segments),
            total_length: 0.0,
            degenerate: true,
        }
    }

    /// Build a fresh table from a list of segments.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::InsufficientPoints`] if `segments` is empty.
    pub fn build(segments: &[CubicSegment], samples: usize) -> Result<Self> {
        if segments.is_empty() {
            return Err(CurveError::insufficient_points(2, 0));
        }
        let mut table = Self::with_capacity(segments.len());
        table.rebuild(segments.iter().copied(), samples);
        Ok(table)
    }

    /// Recompute the table in place.
    ///
    /// The fraction buffer is cleared and refilled, so no allocation happens
    /// once the table has been sized for the segment count.
    pub fn rebuild<I>(&mut self, segments: I, samples: usize)
    where
        I: IntoIterator<Item = CubicSegment>,
    {
        self.fractions.clear();

        let mut total = 0.0;
        for segment in segments {
            total += segment.approximate_length(samples);
            // Running sum; normalized below once the total is known
            self.fractions.push(total);
        }

        self.total_length = total;
        self.degenerate = !(total > 0.0 && total.is_finite());

        if self.degenerate {
            if !self.fractions.is_empty() {
                warn!(
                    segments = self.fractions.len(),
                    total_length = total,
                    "Arc length is zero or not finite, pinning curve to its first point"
                );
            }
            self.fractions.iter_mut().for_each(|f| *f = 0.0);
            return;
        }

        for fraction in &mut self.fractions {
            *fraction /= total;
        }
        if let Some(last) = self.fractions.last_mut() {
            *last = 1.0;
        }
    }

    /// Find the segment owning global parameter `t` and the local parameter.
    ///
    /// The first segment whose cumulative fraction exceeds `t` owns it. When
    /// `t >= 1`, or rounding leaves no owner, the last segment is used with
    /// the local parameter extrapolated from its fraction. The returned index
    /// is always within `[0, len-1]`; a degenerate or empty table, or a NaN
    /// `t`, yields `(0, 0.0)`.
    #[must_use]
    pub fn locate(&self, t: f64) -> (usize, f64) {
        if self.degenerate || self.fractions.is_empty() || t.is_nan() {
            return (0, 0.0);
        }

        let mut preceding = 0.0;
        for (index, &cumulative) in self.fractions.iter().enumerate() {
            if cumulative > t {
                return (index, local_parameter(t, preceding, cumulative));
            }
            preceding = cumulative;
        }

        let last = self.fractions.len() - 1;
        let start = if last == 0 {
            0.0
        } else {
            self.fractions[last - 1]
        };
        (last, local_parameter(t, start, self.fractions[last]))
    }

    /// Cumulative fractions, one per segment.
    #[must_use]
    pub fn fractions(&self) -> &[f64] {
        &self.fractions
    }

    /// Fraction of the total length covered by segment `index`.
    #[must_use]
    pub fn segment_fraction(&self, index: usize) -> Option<f64> {
        let end = *self.fractions.get(index)?;
        let start = if index == 0 {
            0.0
        } else {
            self.fractions[index - 1]
        };
        Some(end - start)
    }

    /// Total approximate length.
    #[must_use]
    pub fn total_length(&self) -> f64 {
        self.total_length
    }

    /// Whether the table collapsed to a single point.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    /// Number of segments in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fractions.len()
    }

    /// Whether the table holds no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fractions.is_empty()
    }

    /// Number of entries the table can hold without reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.fractions.capacity()
    }
}

#[inline]
fn local_parameter(t: f64, start: f64, end: f64) -> f64 {
    let width = end - start;
    if width > 1e-12 { (t - start) / width } else { 0.0 }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Curve;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    fn straight(from: f64, to: f64) -> CubicSegment {
        let lerp = |a: f64| Point3::new(from + (to - from) * a, 0.0, 0.0);
        CubicSegment::new(lerp(0.0), lerp(1.0), lerp(1.0 / 3.0), lerp(2.0 / 3.0))
    }

    #[test]
    fn test_samples_per_segment() {
        assert_eq!(samples_per_segment(500, 2), 251);
        assert_eq!(samples_per_segment(500, 4), 126);
        assert_eq!(samples_per_segment(500, 0), 501);
    }

    #[test]
    fn test_fractions_follow_lengths() {
        let table = ArcLengthTable::build(&[straight(0.0, 1.0), straight(1.0, 4.0)], 16).unwrap();

        assert_relative_eq!(table.total_length(), 4.0, epsilon = 1e-12);
        assert_relative_eq!(table.fractions()[0], 0.25, epsilon = 1e-12);
        assert_eq!(table.fractions()[1], 1.0);
        assert_relative_eq!(table.segment_fraction(1).unwrap(), 0.75, epsilon = 1e-12);
        assert!(table.segment_fraction(2).is_none());
        assert!(!table.is_degenerate());
    }

    #[test]
    fn test_fractions_non_decreasing() {
        let segments = [
            straight(0.0, 2.0),
            straight(2.0, 2.0),
            straight(2.0, 3.0),
            straight(3.0, 7.0),
        ];
        let table = ArcLengthTable::build(&segments, 8).unwrap();
        for pair in table.fractions().windows(2) {
            assert!(pair[0] <= pair[1]);
        }
        assert_eq!(*table.fractions().last().unwrap(), 1.0);
    }

    #[test]
    fn test_locate_inside_and_at_boundaries() {
        let table = ArcLengthTable::build(&[straight(0.0, 1.0), straight(1.0, 4.0)], 16).unwrap();

        let (index, u) = table.locate(0.0);
        assert_eq!(index, 0);
        assert_eq!(u, 0.0);

        let (index, u) = table.locate(0.125);
        assert_eq!(index, 0);
        assert_relative_eq!(u, 0.5, epsilon = 1e-12);

        // Exactly on the boundary belongs to the next segment
        let (index, u) = table.locate(table.fractions()[0]);
        assert_eq!(index, 1);
        assert_eq!(u, 0.0);

        let (index, u) = table.locate(1.0);
        assert_eq!(index, 1);
        assert_eq!(u, 1.0);
    }

    #[test]
    fn test_locate_never_out_of_bounds() {
        let table = ArcLengthTable::build(&[straight(0.0, 1.0), straight(1.0, 2.0)], 16).unwrap();
        for &t in &[1.0, 1.0 + f64::EPSILON, 1.0 + 1e-6, 5.0, -0.5, f64::INFINITY] {
            let (index, _) = table.locate(t);
            assert!(index < table.len());
        }
        assert_eq!(table.locate(f64::NAN), (0, 0.0));
    }

    #[test]
    fn test_locate_extrapolates_past_end() {
        let table = ArcLengthTable::build(&[straight(0.0, 1.0), straight(1.0, 2.0)], 16).unwrap();
        let (index, u) = table.locate(1.1);
        assert_eq!(index, 1);
        assert!(u > 1.0);
        // The segment clamps the extrapolated parameter to its end point
        let segment = straight(1.0, 2.0);
        assert_eq!(segment.point_at(u), segment.p1);
    }

    #[test]
    fn test_zero_length_is_degenerate() {
        let p = Point3::new(2.0, 2.0, 2.0);
        let collapsed = CubicSegment::new(p, p, p, p);
        let table = ArcLengthTable::build(&[collapsed, collapsed], 16).unwrap();

        assert!(table.is_degenerate());
        assert_eq!(table.total_length(), 0.0);
        for &t in &[0.0, 0.3, 1.0, 2.0] {
            assert_eq!(table.locate(t), (0, 0.0));
        }
        assert!(table.fractions().iter().all(|f| f.is_finite()));
    }

    #[test]
    fn test_zero_width_segment_maps_to_its_start() {
        let table = ArcLengthTable::build(&[straight(0.0, 2.0), straight(2.0, 2.0)], 8).unwrap();
        // Second segment has no width; t = 1 lands on it at u = 0
        assert_eq!(table.locate(1.0), (1, 0.0));
    }

    #[test]
    fn test_rebuild_reuses_capacity() {
        let mut table = ArcLengthTable::with_capacity(2);
        let capacity = table.capacity();
        for step in 0..10 {
            let end = 1.0 + f64::from(step);
            table.rebuild([straight(0.0, 1.0), straight(1.0, end)], 8);
            assert_eq!(table.capacity(), capacity);
            assert_eq!(table.len(), 2);
        }
    }

    #[test]
    fn test_build_requires_segments() {
        assert!(ArcLengthTable::build(&[], 8).is_err());
    }
}
