//! Error types for curve construction.
//!
//! Only construction and buffer-sizing problems are errors. Degenerate
//! geometry met while evaluating (coincident control points, parallel
//! reference axes) is handled with defined fallbacks and never surfaces here.

use thiserror::Error;

/// Errors that can occur while building or updating a curve.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CurveError {
    /// Insufficient points to define the curve.
    #[error("insufficient points: need at least {required}, got {actual}")]
    InsufficientPoints {
        /// Minimum required points.
        required: usize,
        /// Actual number of points provided.
        actual: usize,
    },

    /// A control-point update did not match the preallocated buffer size.
    #[error("control point count mismatch: curve holds {expected}, got {actual}")]
    ControlPointCount {
        /// Number of control points the curve was built for.
        expected: usize,
        /// Number of control points supplied.
        actual: usize,
    },

    /// The arc-length sampling budget must be at least one sample.
    #[error("invalid sample budget {0}: must be at least 1")]
    InvalidSampleBudget(usize),

    /// Invalid degree for the curve type.
    #[error("invalid degree {degree}: must be between {min} and {max}")]
    InvalidDegree {
        /// Specified degree.
        degree: usize,
        /// Minimum allowed degree.
        min: usize,
        /// Maximum allowed degree.
        max: usize,
    },

    /// Knot vector is invalid for the given curve parameters.
    #[error("invalid knot vector: {reason}")]
    InvalidKnotVector {
        /// Description of what's wrong with the knot vector.
        reason: String,
    },

    /// A control point contains NaN or infinite coordinates.
    #[error("control point {index} is not finite")]
    NonFinitePoint {
        /// Index of the offending control point.
        index: usize,
    },
}

impl CurveError {
    /// Create an insufficient points error.
    #[must_use]
    pub fn insufficient_points(required: usize, actual: usize) -> Self {
        Self::InsufficientPoints { required, actual }
    }

    /// Create a control point count mismatch error.
    #[must_use]
    pub fn control_point_count(expected: usize, actual: usize) -> Self {
        Self::ControlPointCount { expected, actual }
    }

    /// Create an invalid knot vector error.
    #[must_use]
    pub fn invalid_knot_vector(reason: impl Into<String>) -> Self {
        Self::InvalidKnotVector {
            reason: reason.into(),
        }
    }

    /// Check if this is an insufficient points error.
    #[must_use]
    pub fn is_insufficient_points(&self) -> bool {
        matches!(self, Self::InsufficientPoints { .. })
    }

    /// Check if this is a control point count mismatch.
    #[must_use]
    pub fn is_control_point_count(&self) -> bool {
        matches!(self, Self::ControlPointCount { .. })
    }
}
