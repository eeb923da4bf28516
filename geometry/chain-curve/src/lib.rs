//! Arc-length parametrized piecewise cubic curves and bone frames.
//!
//! This crate provides the geometry behind a curve-driven bone chain:
//!
//! - [`ControlPoint`] - Anchor with Bézier handles derived from a sampled pose
//! - [`CubicSegment`] - One cubic Bézier segment between two control points
//! - [`ArcLengthTable`] - Cumulative length fractions over a chain of segments
//! - [`ChainCurve`] - Curve through `N ≥ 2` control points, evaluated by arc length
//! - [`Frame`] - Orthonormal bone frame with a deterministic fallback
//! - [`BSpline`] - B-spline curves of arbitrary degree
//!
//! # Core Traits
//!
//! All curve types implement the [`Curve`] trait, which provides position,
//! derivative and unit tangent at `t ∈ [0, 1]`, plus polyline length and
//! uniform sampling.
//!
//! # Example
//!
//! ```
//! use chain_curve::{ChainCurve, ControlPoint, build_frame};
//! use nalgebra::{Point3, UnitQuaternion, Vector3};
//!
//! let points = [
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 3.0, 2.0),
//!     Point3::new(2.0, -1.0, 1.0),
//! ]
//! .map(|p| ControlPoint::from_pose(p, UnitQuaternion::identity(), 1.0, &Vector3::y()));
//!
//! let curve = ChainCurve::from_control_points(&points, 500).unwrap();
//!
//! // Orient a bone halfway along the curve
//! let (position, tangent) = curve.evaluate_with_tangent(0.5);
//! let frame = build_frame(position, &tangent, &Vector3::z(), None).unwrap();
//! let rotation = frame.to_rotation();
//! # let _ = rotation;
//! ```
//!
//! # Degenerate Geometry
//!
//! Nothing in this crate produces NaN from finite input. Coincident control
//! points collapse the curve onto its first point, stationary tangents come
//! back as the zero vector, and [`build_frame`] returns `None` for them so
//! callers can keep their previous orientation.
//!
//! # Allocation
//!
//! [`ChainCurve::new`] sizes every buffer for its control-point count.
//! [`ChainCurve::update`] and evaluation never allocate.
//!
//! # Feature Flags
//!
//! - `serde`: Enable serialization/deserialization for all types

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::many_single_char_names,
    clippy::similar_names,
    clippy::cast_possible_truncation,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::suboptimal_flops,
    clippy::missing_const_for_fn,
    clippy::cast_lossless,
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::uninlined_format_args,
    clippy::cast_precision_loss,
    clippy::needless_range_loop,
    clippy::imprecise_flops
)]

mod arc_length;
mod bspline;
mod control;
mod error;
mod evaluator;
mod frame;
mod segment;
mod traits;

pub use arc_length::{
    ArcLengthTable, DEFAULT_SAMPLE_BUDGET, approximate_segment_length, samples_per_segment,
};
pub use bspline::{BSpline, MAX_DEGREE};
pub use control::ControlPoint;
pub use error::CurveError;
pub use evaluator::ChainCurve;
pub use frame::{
    ALIGNMENT_BAND, Frame, PARALLEL_EPSILON, build_frame, delta_decode, delta_encode, fallback_binormal,
    transport_frame,
};
pub use segment::{CubicSegment, point_on_cubic, tangent_on_cubic};
pub use traits::{Curve, DEGENERATE_EPSILON, normalize_or_zero};

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, UnitQuaternion, Vector3};

/// Result type for curve operations.
pub type Result<T> = std::result::Result<T, CurveError>;
