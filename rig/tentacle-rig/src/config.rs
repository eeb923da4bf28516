//! Poser configuration.
//!
//! Controls how finely the curve is measured, how the control handles are
//! derived from the targets, and how bone frames are built.

use crate::{Result, RigError};
use chain_curve::DEFAULT_SAMPLE_BUDGET;
use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How bone frames are built along the curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Framing {
    /// Each bone is framed independently against the per-frame reference
    /// axis, with a deterministic fallback when the axis is parallel to the
    /// tangent.
    #[default]
    ReferenceAxis,
    /// The first bone is framed against the reference axis, the rest are
    /// parallel transported from it for minimal twist.
    ParallelTransport,
}

/// Configuration for a [`ChainPoser`](crate::ChainPoser).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoserConfig {
    /// Total arc-length samples, shared evenly between the segments.
    pub sample_budget: usize,
    /// Distance from each control point to its handles.
    pub handle_length: f64,
    /// Target-local axis the handles lie on.
    pub handle_axis: Vector3<f64>,
    /// Frame construction mode.
    pub framing: Framing,
}

impl Default for PoserConfig {
    fn default() -> Self {
        Self {
            sample_budget: DEFAULT_SAMPLE_BUDGET,
            handle_length: 1.0,
            handle_axis: Vector3::y(),
            framing: Framing::ReferenceAxis,
        }
    }
}

impl PoserConfig {
    /// Create a configuration with a specific sample budget.
    #[must_use]
    pub fn with_sample_budget(sample_budget: usize) -> Self {
        Self {
            sample_budget,
            ..Default::default()
        }
    }

    /// Dense arc-length sampling and twist-minimizing frames.
    #[must_use]
    pub fn high_fidelity() -> Self {
        Self {
            sample_budget: 2000,
            framing: Framing::ParallelTransport,
            ..Default::default()
        }
    }

    /// Coarse sampling for many chains or low-end targets.
    #[must_use]
    pub fn fast() -> Self {
        Self {
            sample_budget: 64,
            ..Default::default()
        }
    }

    /// Set the sample budget.
    #[must_use]
    pub fn sample_budget(mut self, sample_budget: usize) -> Self {
        self.sample_budget = sample_budget;
        self
    }

    /// Set the handle length.
    #[must_use]
    pub fn handle_length(mut self, handle_length: f64) -> Self {
        self.handle_length = handle_length;
        self
    }

    /// Set the handle axis.
    #[must_use]
    pub fn handle_axis(mut self, handle_axis: Vector3<f64>) -> Self {
        self.handle_axis = handle_axis;
        self
    }

    /// Set the framing mode.
    #[must_use]
    pub fn framing(mut self, framing: Framing) -> Self {
        self.framing = framing;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.sample_budget == 0 {
            return Err(RigError::invalid_config("sample budget must be at least 1"));
        }

        if !self.handle_length.is_finite() || self.handle_length < 0.0 {
            return Err(RigError::invalid_config(format!(
                "handle length must be finite and non-negative, got {}",
                self.handle_length
            )));
        }

        let axis_norm = self.handle_axis.norm();
        if !axis_norm.is_finite() || axis_norm < 1e-9 {
            return Err(RigError::invalid_config("handle axis must be a non-zero vector"));
        }

        Ok(())
    }
}
