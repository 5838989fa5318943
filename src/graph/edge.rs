//! Edge type and related structures.
//!
//! Edges are directed proximity links between nodes. Each edge has:
//! - A stable unique identifier, which also orders a node's outgoing edges
//! - The line resource that draws it, owned exclusively by the edge

use std::fmt;

use crate::render::LineHandle;

use super::node::NodeId;

/// Stable edge identifier.
///
/// Identifiers are handed out in creation order, so sorting by id recovers
/// the order in which a node's edges were made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(pub u32);

impl EdgeId {
    /// Create a new EdgeId from a raw u32.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw u32 value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Edge({})", self.0)
    }
}

impl From<u32> for EdgeId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<EdgeId> for u32 {
    #[inline]
    fn from(id: EdgeId) -> Self {
        id.0
    }
}

/// Edge weight stored in the graph. Endpoints are the graph's own.
#[derive(Debug)]
pub(crate) struct Edge {
    pub(crate) id: EdgeId,
    pub(crate) line: LineHandle,
}

/// Read-only view of an outgoing edge, for renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeView {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
}
