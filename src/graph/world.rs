//! World - owns every node and edge of the field and advances them.
//!
//! Topology lives in petgraph's StableGraph: node weights are the simulated
//! [`Node`]s, edge weights carry the line resource each edge owns. Node IDs
//! map to graph indices through a side table, and a separate insertion-order
//! list fixes the iteration order of every pass so a step is deterministic.

use std::collections::HashMap;

use glam::Vec3;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};
use petgraph::visit::EdgeRef;
use petgraph::{Directed, Direction};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, trace, warn};

use super::edge::{Edge, EdgeId, EdgeView};
use super::neighbors;
use super::node::{Color, Node, NodeId};
use crate::config::SimulationConfig;
use crate::error::ConfigError;
use crate::interaction::DragState;
use crate::render::RenderSink;
use crate::spatial::SpatialIndex;

/// Relative slack on spatial queries so float rounding in squared
/// distances never hides a candidate; exact distances are checked after.
const QUERY_SLACK: f32 = 1e-4;

/// What one call to [`World::step`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// Edges created in the connect pass.
    pub connected: u32,
    /// Edges removed because their endpoints drifted too far apart.
    pub pruned: u32,
}

/// The simulation world.
///
/// This struct manages:
/// - Node entities and directed edges via petgraph
/// - Edge line resources, released through a single path
/// - The spatial index used for connection candidates and hit testing
/// - Pointer drag state
pub struct World {
    /// Nodes are the weights; edges carry their line handle.
    graph: StableGraph<Node, Edge, Directed>,

    /// Map from stable NodeId to petgraph NodeIndex
    node_id_to_index: HashMap<NodeId, NodeIndex>,

    /// Live nodes in insertion order
    order: Vec<NodeId>,

    /// Next node ID to assign
    next_node_id: u32,

    /// Next edge ID to assign
    next_edge_id: u32,

    /// Spatial index over node positions
    spatial: SpatialIndex,

    /// Whether any position changed since the index was built
    spatial_dirty: bool,

    config: SimulationConfig,

    rng: SmallRng,

    drag: DragState,
}

impl World {
    /// Create an empty world with the default configuration.
    pub fn new() -> Self {
        Self::build(SimulationConfig::default())
    }

    /// Create an empty world with a validated configuration.
    pub fn with_config(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: SimulationConfig) -> Self {
        Self {
            graph: StableGraph::with_capacity(config.node_count, 0),
            node_id_to_index: HashMap::with_capacity(config.node_count),
            order: Vec::with_capacity(config.node_count),
            next_node_id: 0,
            next_edge_id: 0,
            spatial: SpatialIndex::new(),
            spatial_dirty: false,
            rng: SmallRng::seed_from_u64(config.seed),
            config,
            drag: DragState::new(),
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Replace the configuration.
    ///
    /// When the connection cap shrinks, each node drops its newest edges
    /// until it fits. The random seed only applies to new worlds.
    pub fn set_config(
        &mut self,
        config: SimulationConfig,
        sink: &mut dyn RenderSink,
    ) -> Result<(), ConfigError> {
        if let Err(err) = config.validate() {
            warn!(%err, "rejected simulation config");
            return Err(err);
        }

        if config.max_connections < self.config.max_connections {
            for id in self.order.clone() {
                let Some(&index) = self.node_id_to_index.get(&id) else {
                    continue;
                };
                let outgoing = self.outgoing(index);
                let excess = outgoing.len().saturating_sub(config.max_connections);
                for &(_, edge_index, _) in outgoing.iter().rev().take(excess) {
                    self.release_edge(edge_index, sink);
                }
            }
        }

        self.config = config;
        Ok(())
    }

    // =========================================================================
    // Node Operations
    // =========================================================================

    /// Add a node resting at `position`.
    ///
    /// The initial velocity is random per axis in `[-0.05, 0.05)`, scaled by
    /// `velocity_scale`. An empty label counts as no label.
    pub fn create_node(
        &mut self,
        position: Vec3,
        size: f32,
        label: Option<String>,
        color: Color,
        velocity_scale: f32,
    ) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;

        let velocity = Vec3::new(
            self.rng.random::<f32>() * 0.1 - 0.05,
            self.rng.random::<f32>() * 0.1 - 0.05,
            self.rng.random::<f32>() * 0.1 - 0.05,
        ) * velocity_scale;

        let index = self
            .graph
            .add_node(Node::new(id, position, size, label, color, velocity));
        self.node_id_to_index.insert(id, index);
        self.order.push(id);

        self.spatial_dirty = true;
        id
    }

    /// Scatter `config.node_count` nodes through the spawn cube.
    ///
    /// Even-numbered nodes are plain grey; odd-numbered nodes are blue and
    /// carry a label, which later shows their distance from the origin.
    pub fn populate(&mut self) -> Vec<NodeId> {
        let count = self.config.node_count;
        let extent = self.config.spawn_extent;
        let size = self.config.node_size;

        let mut ids = Vec::with_capacity(count);
        for i in 0..count {
            let position = Vec3::new(
                self.rng.random::<f32>() * 2.0 * extent - extent,
                self.rng.random::<f32>() * 2.0 * extent - extent,
                self.rng.random::<f32>() * 2.0 * extent - extent,
            );
            let id = if i % 2 == 0 {
                self.create_node(position, size, None, Color::GREY, 0.0)
            } else {
                self.create_node(position, size, Some(i.to_string()), Color::BLUE, 0.0)
            };
            ids.push(id);
        }

        debug!(count, "populated world");
        ids
    }

    /// Remove a node, releasing every edge that touches it.
    pub fn remove_node(&mut self, id: NodeId, sink: &mut dyn RenderSink) -> bool {
        let Some(index) = self.node_id_to_index.remove(&id) else {
            return false;
        };

        let edges: Vec<_> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .chain(self.graph.edges_directed(index, Direction::Incoming))
            .map(|e| e.id())
            .collect();
        for edge_index in edges {
            self.release_edge(edge_index, sink);
        }

        if self.drag.selected() == Some(id) {
            self.drag.release();
        }

        self.graph.remove_node(index);
        self.order.retain(|&other| other != id);
        self.spatial_dirty = true;
        true
    }

    /// Get the number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Live node IDs in insertion order.
    pub fn node_ids(&self) -> &[NodeId] {
        &self.order
    }

    /// Get a node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.node_id_to_index.get(&id).map(|&index| &self.graph[index])
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let index = *self.node_id_to_index.get(&id)?;
        self.graph.node_weight_mut(index)
    }

    /// Move a node directly, bypassing velocity integration.
    pub fn set_node_position(&mut self, id: NodeId, position: Vec3) -> bool {
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        node.set_position(position);
        self.spatial_dirty = true;
        true
    }

    /// Add an impulse to a node's velocity.
    pub fn apply_force(&mut self, id: NodeId, force: Vec3) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.apply_force(force);
                true
            }
            None => false,
        }
    }

    /// Select or deselect a node.
    ///
    /// At most one node is selected; selecting another releases the first.
    /// A newly selected node is grabbed at its centre. Selecting the node
    /// already held keeps its grab offset.
    pub fn set_selected(&mut self, id: NodeId, selected: bool) -> bool {
        if selected {
            if self.drag.selected() == Some(id) {
                return true;
            }
            self.grab(id, Vec3::ZERO)
        } else if self.drag.selected() == Some(id) {
            self.end_drag();
            true
        } else {
            false
        }
    }

    // =========================================================================
    // Edge Operations
    // =========================================================================

    /// Connect `from` to `to` with a new directed edge.
    ///
    /// Refused when the nodes are already linked in either direction or
    /// `from` is at its connection cap. The line is drawn in `from`'s color.
    pub fn connect(&mut self, from: NodeId, to: NodeId, sink: &mut dyn RenderSink) -> bool {
        if from == to {
            return false;
        }
        let (Some(&a), Some(&b)) = (
            self.node_id_to_index.get(&from),
            self.node_id_to_index.get(&to),
        ) else {
            return false;
        };
        if self.graph.find_edge(a, b).is_some() || self.graph.find_edge(b, a).is_some() {
            return false;
        }
        if self.out_degree(a) >= self.config.max_connections {
            return false;
        }

        let line = sink.create_line(
            self.graph[a].position(),
            self.graph[b].position(),
            self.graph[a].color(),
        );
        let id = EdgeId(self.next_edge_id);
        self.next_edge_id += 1;
        self.graph.add_edge(a, b, Edge { id, line });

        debug!(%from, %to, edge = %id, "connected");
        true
    }

    /// Remove the edge `from → to` if it exists.
    ///
    /// Idempotent: returns false and changes nothing when there is no edge.
    pub fn disconnect(&mut self, from: NodeId, to: NodeId, sink: &mut dyn RenderSink) -> bool {
        let (Some(&a), Some(&b)) = (
            self.node_id_to_index.get(&from),
            self.node_id_to_index.get(&to),
        ) else {
            return false;
        };
        match self.graph.find_edge(a, b) {
            Some(edge_index) => {
                self.release_edge(edge_index, sink);
                true
            }
            None => false,
        }
    }

    /// Check for a directed edge `from → to`.
    pub fn is_connected(&self, from: NodeId, to: NodeId) -> bool {
        match (self.node_id_to_index.get(&from), self.node_id_to_index.get(&to)) {
            (Some(&a), Some(&b)) => self.graph.find_edge(a, b).is_some(),
            _ => false,
        }
    }

    /// Outgoing edges of a node in creation order.
    pub fn edges(&self, id: NodeId) -> Vec<EdgeView> {
        let Some(&index) = self.node_id_to_index.get(&id) else {
            return Vec::new();
        };
        self.outgoing(index)
            .into_iter()
            .map(|(edge, _, target)| EdgeView {
                id: edge,
                from: id,
                to: self.graph[target].id(),
            })
            .collect()
    }

    /// Get the number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Every edge as flat pairs [from0, to0, from1, to1, ...].
    ///
    /// Grouped by source node in insertion order, each group in creation order.
    pub fn edge_pairs(&self) -> Vec<u32> {
        let mut pairs = Vec::with_capacity(self.graph.edge_count() * 2);
        for &id in &self.order {
            for edge in self.edges(id) {
                pairs.push(edge.from.0);
                pairs.push(edge.to.0);
            }
        }
        pairs
    }

    fn out_degree(&self, index: NodeIndex) -> usize {
        self.graph.edges_directed(index, Direction::Outgoing).count()
    }

    /// Snapshot of (edge id, edge index, target) sorted by creation.
    fn outgoing(&self, index: NodeIndex) -> Vec<(EdgeId, EdgeIndex, NodeIndex)> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .map(|e| (e.weight().id, e.id(), e.target()))
            .collect();
        edges.sort_by_key(|&(id, _, _)| id);
        edges
    }

    /// The only place an edge leaves the graph. Removing the weight hands
    /// back the line handle, which the sink then consumes.
    fn release_edge(&mut self, edge_index: EdgeIndex, sink: &mut dyn RenderSink) {
        if let Some(edge) = self.graph.remove_edge(edge_index) {
            debug!(edge = %edge.id, "released");
            sink.release_line(edge.line);
        }
    }

    // =========================================================================
    // Spatial Queries
    // =========================================================================

    /// Other nodes closer than `max_connection_dist`, nearest first.
    ///
    /// Ties keep insertion order. Computed from current positions, so it is
    /// valid at any point between or during steps.
    pub fn nearest_nodes(&self, id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.node(id) else {
            return Vec::new();
        };
        let candidates: Vec<_> = self
            .order
            .iter()
            .map(|&other| (other, self.graph[self.node_id_to_index[&other]].position()))
            .collect();
        neighbors::nearest_nodes(
            (id, node.position()),
            &candidates,
            self.config.max_connection_dist,
        )
    }

    /// Same ranking as [`World::nearest_nodes`], answered by the spatial index.
    ///
    /// A node whose position is no longer finite has no neighbors and is
    /// nobody's neighbor.
    fn ranked_neighbors(&mut self, id: NodeId) -> Vec<NodeId> {
        self.refresh_spatial_index();
        let Some(origin) = self.node(id).map(Node::position) else {
            return Vec::new();
        };
        if !origin.is_finite() {
            return Vec::new();
        }
        let max_dist = self.config.max_connection_dist;

        let mut ranked: Vec<(f32, NodeId)> = self
            .spatial
            .in_radius(origin, max_dist * (1.0 + QUERY_SLACK))
            .into_iter()
            .filter(|&(other, _)| other != id)
            .filter_map(|(other, _)| {
                let distance = origin.distance(self.node(other)?.position());
                (distance < max_dist).then_some((distance, other))
            })
            .collect();

        // NodeIds are handed out in insertion order.
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        ranked.into_iter().map(|(_, other)| other).collect()
    }

    /// The node whose body contains `point`.
    ///
    /// When bodies overlap, the node whose centre is closest wins, then the
    /// oldest node.
    pub fn node_at(&mut self, point: Vec3) -> Option<NodeId> {
        if !point.is_finite() {
            return None;
        }
        self.refresh_spatial_index();

        let reach = self
            .order
            .iter()
            .filter_map(|&id| self.node(id))
            .map(Node::size)
            .filter(|size| size.is_finite())
            .fold(0.0_f32, f32::max);

        self.spatial
            .in_radius(point, reach * (1.0 + QUERY_SLACK))
            .into_iter()
            .filter_map(|(id, _)| {
                let node = self.node(id)?;
                let distance = node.position().distance(point);
                (distance <= node.size()).then_some((distance, id))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
            .map(|(_, id)| id)
    }

    /// Rebuild the spatial index if any node moved since the last build.
    pub fn refresh_spatial_index(&mut self) {
        if !self.spatial_dirty {
            return;
        }
        let points: Vec<_> = self
            .order
            .iter()
            .map(|&id| (id, self.graph[self.node_id_to_index[&id]].position()))
            .collect();

        self.spatial.rebuild(&points);
        self.spatial_dirty = false;
    }

    // =========================================================================
    // Pointer Drag
    // =========================================================================

    /// Start dragging the node grabbed at `hit_point`.
    pub fn begin_drag(&mut self, id: NodeId, hit_point: Vec3) -> bool {
        let Some(position) = self.node(id).map(Node::position) else {
            return false;
        };
        self.grab(id, hit_point - position)
    }

    fn grab(&mut self, id: NodeId, offset: Vec3) -> bool {
        if !self.node_id_to_index.contains_key(&id) {
            return false;
        }
        if let Some(previous) = self.drag.grab(id, offset) {
            if let Some(node) = self.node_mut(previous) {
                node.set_selected(false);
            }
        }
        if let Some(node) = self.node_mut(id) {
            node.set_selected(true);
        }
        debug!(node = %id, "drag started");
        true
    }

    /// Move the dragged node so the grab point follows the pointer.
    ///
    /// Targets at or below the floor are ignored. The move lands in the next
    /// step, after physics.
    pub fn drag_to(&mut self, point: Vec3) -> bool {
        match self.drag.target_for(point) {
            Some(target) if target.y > self.config.floor_y => {
                self.drag.set_pending(target);
                true
            }
            _ => false,
        }
    }

    /// Let go of the dragged node; springs take over again.
    pub fn end_drag(&mut self) -> Option<NodeId> {
        let id = self.drag.release()?;
        if let Some(node) = self.node_mut(id) {
            node.set_selected(false);
        }
        debug!(node = %id, "drag ended");
        Some(id)
    }

    /// The node currently under pointer control.
    pub fn selected(&self) -> Option<NodeId> {
        self.drag.selected()
    }

    // =========================================================================
    // Simulation
    // =========================================================================

    /// Advance one node by one step.
    ///
    /// Integrates physics, refreshes the label, then walks the node's
    /// outgoing edges in creation order: every line is moved to the current
    /// endpoints, and edges longer than `max_connection_dist` are dropped in
    /// both directions. Returns the number of edges dropped.
    pub fn tick_node(&mut self, id: NodeId, sink: &mut dyn RenderSink) -> u32 {
        let Some(&index) = self.node_id_to_index.get(&id) else {
            return 0;
        };

        let node = &mut self.graph[index];
        node.integrate(&self.config);
        if let Some(label) = node.refresh_label() {
            sink.label_changed(id, label);
        }
        let from = node.position();
        self.spatial_dirty = true;

        let mut pruned = 0;
        for (_, edge_index, target) in self.outgoing(index) {
            let to = self.graph[target].position();
            if let Some(edge) = self.graph.edge_weight(edge_index) {
                sink.update_line(&edge.line, from, to);
            }

            if from.distance(to) > self.config.max_connection_dist {
                let other = self.graph[target].id();
                if self.disconnect(id, other, sink) {
                    pruned += 1;
                }
                if self.disconnect(other, id, sink) {
                    pruned += 1;
                }
            }
        }
        pruned
    }

    /// Run one frame.
    ///
    /// 1. Each node, in insertion order, links to its nearest neighbor it
    ///    has no edge with in either direction. One attempt per node.
    /// 2. Each node ticks, in insertion order.
    /// 3. The latest drag target is applied.
    /// 4. The sink is told the frame is ready.
    pub fn step(&mut self, sink: &mut dyn RenderSink) -> StepReport {
        let mut report = StepReport::default();
        let order = self.order.clone();

        for &id in &order {
            let candidate = self
                .ranked_neighbors(id)
                .into_iter()
                .find(|&other| !self.is_connected(id, other) && !self.is_connected(other, id));
            if let Some(other) = candidate {
                if self.connect(id, other, sink) {
                    report.connected += 1;
                }
            }
        }

        for &id in &order {
            report.pruned += self.tick_node(id, sink);
        }

        if let Some((id, target)) = self.drag.take_pending() {
            self.set_node_position(id, target);
        }

        sink.present();
        trace!(
            connected = report.connected,
            pruned = report.pruned,
            edges = self.edge_count(),
            "step"
        );
        report
    }

    // =========================================================================
    // Utilities
    // =========================================================================

    /// Node positions as [x0, y0, z0, x1, ...] in insertion order.
    pub fn positions(&self) -> Vec<f32> {
        let mut positions = Vec::with_capacity(self.order.len() * 3);
        for &id in &self.order {
            let position = self.graph[self.node_id_to_index[&id]].position();
            positions.extend_from_slice(&position.to_array());
        }
        positions
    }

    /// Remove every node and edge, releasing all lines.
    pub fn clear(&mut self, sink: &mut dyn RenderSink) {
        let edges: Vec<_> = self.graph.edge_indices().collect();
        for edge_index in edges {
            self.release_edge(edge_index, sink);
        }

        self.graph.clear();
        self.node_id_to_index.clear();
        self.order.clear();
        self.next_node_id = 0;
        self.next_edge_id = 0;
        self.spatial.clear();
        self.spatial_dirty = false;
        self.drag.release();
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
