//! Constraint data and bind-time setup.
//!
//! [`ConstraintData`] is what the host authors: which part of the hierarchy
//! to drive, which nodes act as targets, and how bone steps map to curve
//! parameters. Binding it against a [`Hierarchy`] resolves all of that into
//! a [`ChainBinding`], the fixed per-bone data a poser runs on.

use crate::hierarchy::extract_steps;
use crate::{Hierarchy, NodeId, ResponseCurve, Result, RigError};
use tracing::info;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Authored description of a curve-driven chain.
///
/// Every field must be set before binding. The default has a linear
/// response and no nodes selected.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConstraintData {
    /// First bone of the chain.
    pub root: Option<NodeId>,
    /// Last bone of the chain; must be below `root`.
    pub tip: Option<NodeId>,
    /// Target the chain starts at.
    pub root_target: Option<NodeId>,
    /// Target the chain bends through.
    pub mid_target: Option<NodeId>,
    /// Target the chain ends at.
    pub tip_target: Option<NodeId>,
    /// Maps each bone's rest step to its curve parameter.
    pub response: Option<ResponseCurve>,
}

impl Default for ConstraintData {
    fn default() -> Self {
        Self {
            root: None,
            tip: None,
            root_target: None,
            mid_target: None,
            tip_target: None,
            response: Some(ResponseCurve::linear()),
        }
    }
}

impl ConstraintData {
    /// Select the bone chain.
    #[must_use]
    pub fn chain(mut self, root: NodeId, tip: NodeId) -> Self {
        self.root = Some(root);
        self.tip = Some(tip);
        self
    }

    /// Select the root, mid and tip targets.
    #[must_use]
    pub fn targets(mut self, root: NodeId, mid: NodeId, tip: NodeId) -> Self {
        self.root_target = Some(root);
        self.mid_target = Some(mid);
        self.tip_target = Some(tip);
        self
    }

    /// Set the response curve.
    #[must_use]
    pub fn response(mut self, response: ResponseCurve) -> Self {
        self.response = Some(response);
        self
    }

    /// Check that the data can be bound against `hierarchy`.
    ///
    /// # Errors
    ///
    /// - [`RigError::MissingField`] for the first unset node field
    /// - [`RigError::UnknownNode`] for a node outside the hierarchy
    /// - [`RigError::NotDescendant`] if `tip` is not below `root`
    /// - [`RigError::MissingResponseCurve`] if no response curve is set
    pub fn validate(&self, hierarchy: &Hierarchy) -> Result<()> {
        let root = self.root.ok_or(RigError::missing("root"))?;
        let tip = self.tip.ok_or(RigError::missing("tip"))?;
        let targets = self.target_ids()?;

        for id in [root, tip].iter().chain(&targets) {
            if !hierarchy.contains(*id) {
                return Err(RigError::UnknownNode(id.0));
            }
        }
        if !hierarchy.is_descendant(tip, root) {
            return Err(RigError::NotDescendant {
                root: root.0,
                tip: tip.0,
            });
        }

        match &self.response {
            Some(curve) if !curve.keys().is_empty() => Ok(()),
            _ => Err(RigError::MissingResponseCurve),
        }
    }

    /// Resolve the data into per-bone steps and weights.
    ///
    /// # Errors
    ///
    /// Everything [`validate`](Self::validate) reports, plus
    /// [`RigError::NonMonotonicWeights`] when the response curve makes the
    /// weights decrease along the chain.
    pub fn bind(&self, hierarchy: &Hierarchy) -> Result<ChainBinding> {
        self.validate(hierarchy)?;

        let (Some(root), Some(tip), Some(response)) = (self.root, self.tip, &self.response) else {
            return Err(RigError::missing("root"));
        };

        let chain = hierarchy.extract_chain(root, tip)?;
        let steps = extract_steps(&hierarchy.rest_positions(&chain)?);
        let weights: Vec<f64> = steps
            .iter()
            .map(|&s| response.evaluate(s).clamp(0.0, 1.0))
            .collect();
        validate_weights(&weights)?;

        let targets = self.target_ids()?.to_vec();

        info!(
            bones = chain.len(),
            root = %root,
            tip = %tip,
            "Bound curve chain"
        );

        Ok(ChainBinding {
            chain,
            targets,
            steps,
            weights,
        })
    }

    fn target_ids(&self) -> Result<[NodeId; 3]> {
        Ok([
            self.root_target.ok_or(RigError::missing("root_target"))?,
            self.mid_target.ok_or(RigError::missing("mid_target"))?,
            self.tip_target.ok_or(RigError::missing("tip_target"))?,
        ])
    }
}

/// Resolved per-bone data for one chain.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChainBinding {
    /// Bones from root to tip.
    pub chain: Vec<NodeId>,
    /// Target nodes in curve order; the host samples these every frame.
    pub targets: Vec<NodeId>,
    /// Normalized rest-pose distance of each bone.
    pub steps: Vec<f64>,
    /// Curve parameter of each bone.
    pub weights: Vec<f64>,
}

impl ChainBinding {
    /// Number of bones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Whether the binding has no bones.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }
}

/// Check a weight list: non-empty, within `[0, 1]` and non-decreasing.
///
/// # Errors
///
/// [`RigError::EmptyChain`], [`RigError::InvalidWeight`] for a weight that
/// is NaN or outside `[0, 1]`, or [`RigError::NonMonotonicWeights`].
pub fn validate_weights(weights: &[f64]) -> Result<()> {
    if weights.is_empty() {
        return Err(RigError::EmptyChain);
    }
    if let Some((index, &value)) = weights
        .iter()
        .enumerate()
        .find(|(_, w)| !(0.0..=1.0).contains(*w))
    {
        return Err(RigError::InvalidWeight { index, value });
    }
    if let Some(index) = weights.windows(2).position(|pair| pair[1] < pair[0]) {
        return Err(RigError::NonMonotonicWeights {
            index: index + 1,
            value: weights[index + 1],
            previous: weights[index],
        });
    }
    Ok(())
}
