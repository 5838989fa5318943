//! R-tree based spatial index using the rstar crate.
//!
//! Provides O(log n) point-in-radius queries, used both for connection
//! candidates and pointer hit testing.

use glam::Vec3;
use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::graph::NodeId;

/// A point in the spatial index with associated node ID.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodePoint {
    /// The node identifier.
    pub id: NodeId,
    /// Position in world space.
    pub position: [f32; 3],
}

impl NodePoint {
    /// Create a new NodePoint.
    pub fn new(id: NodeId, position: Vec3) -> Self {
        Self {
            id,
            position: position.to_array(),
        }
    }
}

impl RTreeObject for NodePoint {
    type Envelope = AABB<[f32; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for NodePoint {
    fn distance_2(&self, point: &[f32; 3]) -> f32 {
        Vec3::from_array(self.position).distance_squared(Vec3::from_array(*point))
    }
}

/// Spatial index for node positions.
///
/// Uses an R*-tree for efficient spatial queries. Positions change every
/// step, so the index is bulk-loaded from a snapshot rather than updated
/// incrementally.
pub struct SpatialIndex {
    tree: RTree<NodePoint>,
}

impl SpatialIndex {
    /// Create a new empty spatial index.
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Find all nodes within a radius of a point, with their squared distance.
    ///
    /// The radius is inclusive; callers needing a strict bound filter the
    /// returned distances. Result order is unspecified.
    pub fn in_radius(&self, point: Vec3, radius: f32) -> Vec<(NodeId, f32)> {
        let query = point.to_array();
        self.tree
            .locate_within_distance(query, radius * radius)
            .map(|node| (node.id, node.distance_2(&query)))
            .collect()
    }

    /// Rebuild the index from a list of (id, position) pairs.
    ///
    /// Points with a NaN or infinite coordinate are left out; rstar cannot
    /// order them.
    pub fn rebuild(&mut self, points: &[(NodeId, Vec3)]) {
        let node_points: Vec<_> = points
            .iter()
            .filter(|(_, position)| position.is_finite())
            .map(|&(id, position)| NodePoint::new(id, position))
            .collect();

        self.tree = RTree::bulk_load(node_points);
    }

    /// Clear all nodes from the index.
    pub fn clear(&mut self) {
        self.tree = RTree::new();
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}
