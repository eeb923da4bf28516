//! Per-frame chain posing.
//!
//! A [`ChainPoser`] owns every buffer a pass needs. Each call to
//! [`ChainPoser::evaluate`] turns the current target poses into a curve,
//! places each bone at its weight along it, orients the bone from the curve
//! tangent, and writes positions plus delta-encoded rotations back into the
//! host's pose slice.
//!
//! # Pass Outline
//!
//! ```text
//! targets ──► control points ──► arc-length table
//!                                       │
//!             weights ──► locate ──► position, tangent ──► frame ──► world rotation
//!                                                                        │
//!                       poses ◄── blend ◄── delta encode ◄───────────────┘
//! ```

use crate::binding::validate_weights;
use crate::{BonePose, ChainBinding, Framing, PoserConfig, Result, RigError};
use chain_curve::{
    ChainCurve, ControlPoint, Frame, build_frame, delta_encode, transport_frame,
};
use nalgebra::{Point3, UnitQuaternion, Vector3};
use tracing::{debug, info, trace, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Inputs sampled by the host for one pass.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    /// World-space target poses in curve order (root, mid, tip).
    pub targets: &'a [BonePose],
    /// Constraint weight. `<= 0` (or NaN) disables the pass, `>= 1` applies
    /// it fully, anything between blends from the incoming poses.
    pub blend_weight: f64,
    /// Reference "up" axis for framing, usually the host's forward vector.
    pub reference_axis: Vector3<f64>,
    /// World rotation of the chain root's parent.
    pub root_parent_rotation: UnitQuaternion<f64>,
}

impl<'a> FrameInput<'a> {
    /// Full-weight input with a `+Z` reference axis and an unrotated parent.
    #[must_use]
    pub fn new(targets: &'a [BonePose]) -> Self {
        Self {
            targets,
            blend_weight: 1.0,
            reference_axis: Vector3::z(),
            root_parent_rotation: UnitQuaternion::identity(),
        }
    }

    /// Set the blend weight.
    #[must_use]
    pub fn blend_weight(mut self, blend_weight: f64) -> Self {
        self.blend_weight = blend_weight;
        self
    }

    /// Set the reference axis.
    #[must_use]
    pub fn reference_axis(mut self, reference_axis: Vector3<f64>) -> Self {
        self.reference_axis = reference_axis;
        self
    }

    /// Set the root parent's world rotation.
    #[must_use]
    pub fn root_parent_rotation(mut self, rotation: UnitQuaternion<f64>) -> Self {
        self.root_parent_rotation = rotation;
        self
    }
}

/// What a pass did to the pose slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PassOutcome {
    /// Poses were written.
    Posed,
    /// The blend weight disabled the pass; poses are untouched.
    PassThrough,
    /// Inputs did not match the binding; poses are untouched.
    Skipped,
}

/// Whether the last pass drove the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PoserState {
    /// The last pass was disabled by its blend weight, or no pass ran yet.
    #[default]
    Disabled,
    /// The last pass was enabled.
    Active,
}

/// Bends a bone chain along the curve through its targets.
///
/// # Example
///
/// ```
/// use tentacle_rig::{BonePose, ChainPoser, FrameInput, PassOutcome, PoserConfig};
/// use nalgebra::Point3;
///
/// let mut poser = ChainPoser::new(&[0.0, 0.5, 1.0], 3, PoserConfig::default()).unwrap();
///
/// let targets = [
///     BonePose::from_position(Point3::new(0.0, 0.0, 0.0)),
///     BonePose::from_position(Point3::new(1.0, 3.0, 2.0)),
///     BonePose::from_position(Point3::new(2.0, -1.0, 1.0)),
/// ];
/// let mut poses = [BonePose::identity(); 3];
///
/// let outcome = poser.evaluate(&FrameInput::new(&targets), &mut poses);
/// assert_eq!(outcome, PassOutcome::Posed);
/// assert_eq!(poses[2].position, Point3::new(2.0, -1.0, 1.0));
/// ```
#[derive(Debug, Clone)]
pub struct ChainPoser {
    config: PoserConfig,
    weights: Vec<f64>,
    curve: ChainCurve,
    control_points: Vec<ControlPoint>,
    positions: Vec<Point3<f64>>,
    /// World rotations; entries keep last frame's value until overwritten.
    world_rotations: Vec<UnitQuaternion<f64>>,
    local_rotations: Vec<UnitQuaternion<f64>>,
    /// Binormal each bone was last framed with, zero if never.
    binormals: Vec<Vector3<f64>>,
    state: PoserState,
}

impl ChainPoser {
    /// Create a poser for bones at `weights`, driven by `control_count`
    /// targets.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the weights are
    /// empty, outside `[0, 1]` or decreasing, or `control_count < 2`.
    pub fn new(weights: &[f64], control_count: usize, config: PoserConfig) -> Result<Self> {
        config.validate()?;
        validate_weights(weights)?;
        let curve = ChainCurve::new(control_count, config.sample_budget)?;

        let bones = weights.len();
        info!(
            bones,
            control_count,
            sample_budget = config.sample_budget,
            framing = ?config.framing,
            "Created chain poser"
        );

        Ok(Self {
            weights: weights.to_vec(),
            curve,
            control_points: vec![ControlPoint::default(); control_count],
            positions: vec![Point3::origin(); bones],
            world_rotations: vec![UnitQuaternion::identity(); bones],
            local_rotations: vec![UnitQuaternion::identity(); bones],
            binormals: vec![Vector3::zeros(); bones],
            state: PoserState::Disabled,
            config,
        })
    }

    /// Create a poser from a bound chain.
    ///
    /// # Errors
    ///
    /// Same conditions as [`ChainPoser::new`], with the binding's weights and
    /// target count.
    pub fn from_binding(binding: &ChainBinding, config: PoserConfig) -> Result<Self> {
        if binding.weights.len() != binding.chain.len() {
            return Err(RigError::BoneCountMismatch {
                expected: binding.chain.len(),
                actual: binding.weights.len(),
            });
        }
        Self::new(&binding.weights, binding.targets.len(), config)
    }

    /// Replace the bone weights without reallocating.
    ///
    /// # Errors
    ///
    /// Returns [`RigError::BoneCountMismatch`] if the count differs, or any
    /// weight validation error. The poser is left unchanged on error.
    pub fn set_weights(&mut self, weights: &[f64]) -> Result<()> {
        if weights.len() != self.weights.len() {
            return Err(RigError::BoneCountMismatch {
                expected: self.weights.len(),
                actual: weights.len(),
            });
        }
        validate_weights(weights)?;
        self.weights.copy_from_slice(weights);
        debug!(bones = weights.len(), "Updated bone weights");
        Ok(())
    }

    /// Run one pass.
    ///
    /// Never fails and never panics. Inputs that cannot be posed leave
    /// `poses` untouched and report it through the returned outcome.
    pub fn evaluate(&mut self, input: &FrameInput<'_>, poses: &mut [BonePose]) -> PassOutcome {
        let blend = input.blend_weight;
        if blend.is_nan() || blend <= 0.0 {
            self.set_state(PoserState::Disabled);
            return PassOutcome::PassThrough;
        }
        self.set_state(PoserState::Active);

        if input.targets.len() != self.control_points.len() {
            warn!(
                expected = self.control_points.len(),
                actual = input.targets.len(),
                "Target count mismatch, skipping frame"
            );
            return PassOutcome::Skipped;
        }
        if poses.len() != self.weights.len() {
            warn!(
                expected = self.weights.len(),
                actual = poses.len(),
                "Pose count mismatch, skipping frame"
            );
            return PassOutcome::Skipped;
        }
        if let Some(index) = input.targets.iter().position(|t| !t.is_finite()) {
            warn!(target = index, "Target pose is not finite, skipping frame");
            return PassOutcome::Skipped;
        }

        let handle_length = self.config.handle_length;
        let handle_axis = self.config.handle_axis;
        for (cp, target) in self.control_points.iter_mut().zip(input.targets) {
            *cp = ControlPoint::from_pose(target.position, target.rotation, handle_length, &handle_axis);
        }
        if let Err(err) = self.curve.update(&self.control_points) {
            warn!(error = %err, "Curve update failed, skipping frame");
            return PassOutcome::Skipped;
        }

        self.orient_bones(&input.reference_axis);

        self.local_rotations.copy_from_slice(&self.world_rotations);
        delta_encode(&input.root_parent_rotation, &mut self.local_rotations);

        let full = blend >= 1.0;
        for ((pose, position), rotation) in poses
            .iter_mut()
            .zip(&self.positions)
            .zip(&self.local_rotations)
        {
            let computed = BonePose::new(*position, *rotation);
            *pose = if full { computed } else { pose.lerp(&computed, blend) };
        }

        PassOutcome::Posed
    }

    /// Place every bone on the curve and compute its world rotation.
    fn orient_bones(&mut self, reference_axis: &Vector3<f64>) {
        let mut previous: Option<Frame> = None;

        for i in 0..self.weights.len() {
            let (position, tangent) = self.curve.evaluate_with_tangent(self.weights[i]);
            self.positions[i] = position;

            // Stay continuous with this bone's last frame, or with the bone
            // before it on the first pass
            let hint = if self.binormals[i] == Vector3::zeros() {
                previous.map(|f| f.binormal)
            } else {
                Some(self.binormals[i])
            };
            let frame = match (self.config.framing, previous) {
                (Framing::ParallelTransport, Some(prev)) => {
                    transport_frame(&prev, position, &tangent)
                }
                _ => build_frame(position, &tangent, reference_axis, hint.as_ref()),
            };

            match frame {
                Some(frame) => {
                    self.world_rotations[i] = frame.to_rotation();
                    self.binormals[i] = frame.binormal;
                }
                None => trace!(bone = i, "Stationary tangent, keeping previous rotation"),
            }
            previous = frame;
        }
    }

    fn set_state(&mut self, state: PoserState) {
        if self.state != state {
            debug!(from = ?self.state, to = ?state, "Chain poser state changed");
            self.state = state;
        }
    }

    /// Release the poser's buffers.
    pub fn dispose(self) {
        debug!(bones = self.weights.len(), "Disposed chain poser");
    }

    /// State of the last pass.
    #[must_use]
    pub fn state(&self) -> PoserState {
        self.state
    }

    /// World rotations computed by the last enabled pass.
    #[must_use]
    pub fn world_rotations(&self) -> &[UnitQuaternion<f64>] {
        &self.world_rotations
    }

    /// Bone positions computed by the last enabled pass.
    #[must_use]
    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    /// The curve from the last enabled pass.
    #[must_use]
    pub fn curve(&self) -> &ChainCurve {
        &self.curve
    }

    /// Bone weights.
    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Number of bones.
    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.weights.len()
    }

    /// Number of targets expected per pass.
    #[must_use]
    pub fn control_count(&self) -> usize {
        self.control_points.len()
    }

    /// The poser's configuration.
    #[must_use]
    pub fn config(&self) -> &PoserConfig {
        &self.config
    }
}
