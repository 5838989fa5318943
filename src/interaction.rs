//! Pointer drag state.
//!
//! Pointer events arrive between frames. The drag state remembers which node
//! is held, where on it the pointer grabbed, and the latest target position;
//! the world applies that target once per step, after physics.

use glam::Vec3;

use crate::graph::NodeId;

/// The single node under pointer control, if any.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DragState {
    selected: Option<NodeId>,
    offset: Vec3,
    pending: Option<Vec3>,
}

impl DragState {
    /// Create an idle drag state.
    pub fn new() -> Self {
        Self::default()
    }

    /// The node currently held.
    #[inline]
    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    /// Take hold of `node`, grabbed at `offset` from its centre.
    ///
    /// Returns the previously held node so the caller can release it.
    pub fn grab(&mut self, node: NodeId, offset: Vec3) -> Option<NodeId> {
        self.pending = None;
        self.offset = offset;
        self.selected.replace(node).filter(|&previous| previous != node)
    }

    /// Let go of the held node, returning it.
    pub fn release(&mut self) -> Option<NodeId> {
        self.pending = None;
        self.offset = Vec3::ZERO;
        self.selected.take()
    }

    /// Node-centre position for a pointer at `point`, or `None` when
    /// nothing is held.
    pub fn target_for(&self, point: Vec3) -> Option<Vec3> {
        self.selected.map(|_| point - self.offset)
    }

    /// Record a target for the held node. Later targets overwrite earlier ones.
    pub fn set_pending(&mut self, target: Vec3) {
        if self.selected.is_some() {
            self.pending = Some(target);
        }
    }

    /// Take the target recorded since the last step.
    pub fn take_pending(&mut self) -> Option<(NodeId, Vec3)> {
        let target = self.pending.take()?;
        self.selected.map(|node| (node, target))
    }
}
