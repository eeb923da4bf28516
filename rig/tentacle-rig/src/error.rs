//! Error types for rig binding and configuration.
//!
//! Every variant is raised at bind or construction time. The per-frame pass
//! never fails; it degrades to a pass-through or a skipped frame instead.

use chain_curve::CurveError;
use thiserror::Error;

/// Errors that can occur while binding or configuring a chain.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RigError {
    /// Curve construction failed.
    #[error(transparent)]
    Curve(#[from] CurveError),

    /// A required field of the constraint data was not set.
    #[error("constraint field `{field}` is not set")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// The tip is not a descendant of the root.
    #[error("node {tip} is not a descendant of node {root}")]
    NotDescendant {
        /// Requested root node.
        root: usize,
        /// Requested tip node.
        tip: usize,
    },

    /// A node ID does not exist in the hierarchy.
    #[error("unknown node: {0}")]
    UnknownNode(usize),

    /// No response curve was supplied.
    #[error("response curve is missing or has no keys")]
    MissingResponseCurve,

    /// The bone chain has no bones.
    #[error("bone chain is empty")]
    EmptyChain,

    /// Number of weights does not match the number of bones.
    #[error("bone count mismatch: chain has {expected} bones, got {actual} weights")]
    BoneCountMismatch {
        /// Number of bones in the chain.
        expected: usize,
        /// Number of weights supplied.
        actual: usize,
    },

    /// A bone weight is NaN or outside `[0, 1]`.
    #[error("bone weight {index} is outside [0, 1]: {value}")]
    InvalidWeight {
        /// Index of the offending weight.
        index: usize,
        /// The offending value.
        value: f64,
    },

    /// Bone weights decrease along the chain.
    #[error("bone weights must be non-decreasing: weight {index} ({value}) < {previous}")]
    NonMonotonicWeights {
        /// Index of the first decreasing weight.
        index: usize,
        /// The decreasing weight.
        value: f64,
        /// The weight before it.
        previous: f64,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },
}

impl RigError {
    /// Create a missing field error.
    #[must_use]
    pub fn missing(field: &'static str) -> Self {
        Self::MissingField { field }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Check if this is a configuration error.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. })
    }

    /// Check if this error comes from a bad hierarchy selection.
    #[must_use]
    pub fn is_hierarchy_error(&self) -> bool {
        matches!(self, Self::NotDescendant { .. } | Self::UnknownNode(_))
    }
}
