//! Curve-driven bone chains.
//!
//! Bends a chain of bones along a smooth curve through a small set of moving
//! targets (reference: root, mid and tip). Built on the geometry in
//! [`chain_curve`]:
//!
//! - [`ConstraintData`] / [`ChainBinding`] - Authored setup resolved against a [`Hierarchy`]
//! - [`ResponseCurve`] - Maps each bone's rest step to its curve parameter
//! - [`ChainPoser`] - Per-frame pass writing positions and local rotations
//! - [`PoserConfig`] - Sampling budget, handle shape and framing mode
//!
//! # Example
//!
//! ```
//! use tentacle_rig::{
//!     BonePose, ChainPoser, ConstraintData, FrameInput, Hierarchy, NodeId, PoserConfig,
//! };
//! use nalgebra::Point3;
//!
//! // Four bones in a row, plus three free target nodes
//! let mut scene = Hierarchy::chain(&[
//!     BonePose::from_position(Point3::new(0.0, 0.0, 0.0)),
//!     BonePose::from_position(Point3::new(0.0, 1.0, 0.0)),
//!     BonePose::from_position(Point3::new(0.0, 2.0, 0.0)),
//!     BonePose::from_position(Point3::new(0.0, 3.0, 0.0)),
//! ]);
//! let root_target = scene.add_node(None, BonePose::identity()).unwrap();
//! let mid_target = scene.add_node(None, BonePose::identity()).unwrap();
//! let tip_target = scene.add_node(None, BonePose::identity()).unwrap();
//!
//! let binding = ConstraintData::default()
//!     .chain(NodeId(0), NodeId(3))
//!     .targets(root_target, mid_target, tip_target)
//!     .bind(&scene)
//!     .unwrap();
//!
//! let mut poser = ChainPoser::from_binding(&binding, PoserConfig::default()).unwrap();
//!
//! // Every frame: sample targets, run the pass
//! let targets = [
//!     BonePose::from_position(Point3::new(0.0, 0.0, 0.0)),
//!     BonePose::from_position(Point3::new(1.0, 3.0, 2.0)),
//!     BonePose::from_position(Point3::new(2.0, -1.0, 1.0)),
//! ];
//! let mut poses = [BonePose::identity(); 4];
//! poser.evaluate(&FrameInput::new(&targets), &mut poses);
//!
//! assert_eq!(poses[3].position, Point3::new(2.0, -1.0, 1.0));
//! ```
//!
//! # Conventions
//!
//! Bones point along local `+Y` with local `+Z` as their normal. Target
//! handles lie on the target's local `+Y` axis by default.
//!
//! # Feature Flags
//!
//! - `serde`: Enable serialization/deserialization for configuration and
//!   binding types

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::suboptimal_flops,
    clippy::missing_const_for_fn,
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::cast_precision_loss,
    clippy::needless_range_loop,
    clippy::return_self_not_must_use
)]

mod binding;
mod config;
mod error;
mod hierarchy;
mod pose;
mod poser;
mod response;

pub use binding::{ChainBinding, ConstraintData, validate_weights};
pub use config::{Framing, PoserConfig};
pub use error::RigError;
pub use hierarchy::{Hierarchy, Node, NodeId, extract_steps};
pub use pose::BonePose;
pub use poser::{ChainPoser, FrameInput, PassOutcome, PoserState};
pub use response::{Keyframe, ResponseCurve};

/// Result type for rig operations.
pub type Result<T> = std::result::Result<T, RigError>;
