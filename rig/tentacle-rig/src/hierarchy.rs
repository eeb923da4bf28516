//! Bind-time bone hierarchy.
//!
//! The host describes its skeleton as a flat list of nodes with parent links
//! and world-space rest poses. The rig only reads it when binding.

use crate::{BonePose, Result, RigError};
use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Index of a node in a [`Hierarchy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeId(pub usize);

impl NodeId {
    /// Get the raw index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for NodeId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

/// A node in the hierarchy.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Node {
    /// Parent node, `None` for a root.
    pub parent: Option<NodeId>,
    /// World-space rest pose.
    pub rest: BonePose,
}

/// A forest of nodes with parent links.
///
/// Parents are always added before their children, so the parent links can
/// never form a cycle.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Hierarchy {
    nodes: Vec<Node>,
}

impl Hierarchy {
    /// Create an empty hierarchy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and return its ID.
    ///
    /// # Errors
    ///
    /// Returns [`RigError::UnknownNode`] if `parent` is not in the hierarchy.
    pub fn add_node(&mut self, parent: Option<NodeId>, rest: BonePose) -> Result<NodeId> {
        if let Some(parent) = parent {
            if !self.contains(parent) {
                return Err(RigError::UnknownNode(parent.0));
            }
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { parent, rest });
        Ok(id)
    }

    /// Build a single straight chain where each node parents the next.
    #[must_use]
    pub fn chain(rest_poses: &[BonePose]) -> Self {
        let nodes = rest_poses
            .iter()
            .enumerate()
            .map(|(i, &rest)| Node {
                parent: i.checked_sub(1).map(NodeId),
                rest,
            })
            .collect();
        Self { nodes }
    }

    /// Look up a node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// Whether the node exists.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the hierarchy has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `tip` sits strictly below `root`.
    #[must_use]
    pub fn is_descendant(&self, tip: NodeId, root: NodeId) -> bool {
        let mut current = self.parent(tip);
        while let Some(id) = current {
            if id == root {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Nodes from `root` down to `tip`, both included.
    ///
    /// # Errors
    ///
    /// Returns [`RigError::UnknownNode`] for an ID outside the hierarchy and
    /// [`RigError::NotDescendant`] unless `tip` is strictly below `root`.
    pub fn extract_chain(&self, root: NodeId, tip: NodeId) -> Result<Vec<NodeId>> {
        for id in [root, tip] {
            if !self.contains(id) {
                return Err(RigError::UnknownNode(id.0));
            }
        }
        if !self.is_descendant(tip, root) {
            return Err(RigError::NotDescendant {
                root: root.0,
                tip: tip.0,
            });
        }

        let mut chain = vec![tip];
        let mut current = tip;
        while let Some(parent) = self.parent(current) {
            chain.push(parent);
            if parent == root {
                break;
            }
            current = parent;
        }
        chain.reverse();
        Ok(chain)
    }

    /// Rest positions of the given nodes, in order.
    ///
    /// # Errors
    ///
    /// Returns [`RigError::UnknownNode`] for an ID outside the hierarchy.
    pub fn rest_positions(&self, ids: &[NodeId]) -> Result<Vec<Point3<f64>>> {
        ids.iter()
            .map(|&id| {
                self.node(id)
                    .map(|n| n.rest.position)
                    .ok_or(RigError::UnknownNode(id.0))
            })
            .collect()
    }
}

/// Normalized cumulative distance of each position along a chain.
///
/// The first entry is `0`, the last is `1`. When the chain has no length the
/// steps are spread uniformly as `i / (n - 1)`. A single position yields `[0]`.
///
/// ```
/// use tentacle_rig::extract_steps;
/// use nalgebra::Point3;
///
/// let steps = extract_steps(&[
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(4.0, 0.0, 0.0),
/// ]);
/// assert_eq!(steps, vec![0.0, 0.25, 1.0]);
/// ```
#[must_use]
pub fn extract_steps(positions: &[Point3<f64>]) -> Vec<f64> {
    let n = positions.len();
    if n < 2 {
        return vec![0.0; n];
    }

    let mut steps = Vec::with_capacity(n);
    let mut total = 0.0;
    steps.push(0.0);
    for pair in positions.windows(2) {
        total += (pair[1] - pair[0]).norm();
        steps.push(total);
    }

    if total > 0.0 && total.is_finite() {
        for step in &mut steps {
            *step /= total;
        }
        steps[n - 1] = 1.0;
    } else {
        for (i, step) in steps.iter_mut().enumerate() {
            *step = i as f64 / (n - 1) as f64;
        }
    }
    steps
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn branching() -> (Hierarchy, [NodeId; 5]) {
        // 0 ─ 1 ─ 2 ─ 3
        //      └─ 4
        let mut h = Hierarchy::new();
        let pose = |x: f64| BonePose::from_position(Point3::new(x, 0.0, 0.0));
        let n0 = h.add_node(None, pose(0.0)).unwrap();
        let n1 = h.add_node(Some(n0), pose(1.0)).unwrap();
        let n2 = h.add_node(Some(n1), pose(2.0)).unwrap();
        let n3 = h.add_node(Some(n2), pose(3.0)).unwrap();
        let n4 = h.add_node(Some(n1), pose(5.0)).unwrap();
        (h, [n0, n1, n2, n3, n4])
    }

    #[test]
    fn test_extract_chain() {
        let (h, [n0, n1, n2, n3, n4]) = branching();
        assert_eq!(h.extract_chain(n0, n3).unwrap(), vec![n0, n1, n2, n3]);
        assert_eq!(h.extract_chain(n1, n2).unwrap(), vec![n1, n2]);
        assert_eq!(h.extract_chain(n0, n4).unwrap(), vec![n0, n1, n4]);
    }

    #[test]
    fn test_extract_chain_rejects_non_descendants() {
        let (h, [n0, _, n2, n3, n4]) = branching();
        assert!(matches!(
            h.extract_chain(n3, n0),
            Err(RigError::NotDescendant { root: 3, tip: 0 })
        ));
        assert!(h.extract_chain(n4, n2).unwrap_err().is_hierarchy_error());
        assert!(h.extract_chain(n2, n2).is_err());
        assert_eq!(
            h.extract_chain(n0, NodeId(42)).unwrap_err(),
            RigError::UnknownNode(42)
        );
    }

    #[test]
    fn test_add_node_requires_parent() {
        let mut h = Hierarchy::new();
        assert!(h.add_node(Some(NodeId(0)), BonePose::identity()).is_err());
        assert!(h.is_empty());
    }

    #[test]
    fn test_chain_constructor() {
        let poses = [BonePose::identity(); 4];
        let h = Hierarchy::chain(&poses);
        assert_eq!(h.len(), 4);
        assert_eq!(h.parent(NodeId(0)), None);
        assert_eq!(h.parent(NodeId(3)), Some(NodeId(2)));
        assert!(h.is_descendant(NodeId(3), NodeId(0)));
    }

    #[test]
    fn test_steps_by_distance() {
        let (h, [n0, _, _, n3, _]) = branching();
        let chain = h.extract_chain(n0, n3).unwrap();
        let steps = extract_steps(&h.rest_positions(&chain).unwrap());
        assert_eq!(steps.len(), 4);
        assert_eq!(steps[0], 0.0);
        assert_relative_eq!(steps[1], 1.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(steps[2], 2.0 / 3.0, epsilon = 1e-12);
        assert_eq!(steps[3], 1.0);
    }

    #[test]
    fn test_steps_zero_length_are_uniform() {
        let p = Point3::new(1.0, 1.0, 1.0);
        assert_eq!(extract_steps(&[p; 5]), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(extract_steps(&[p]), vec![0.0]);
        assert!(extract_steps(&[]).is_empty());
    }
}
