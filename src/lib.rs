//! Drift Graph - WASM Module
//!
//! This module provides the simulation core for the Drift Graph node field:
//! nodes drift on springs around their rest positions, link up with nearby
//! neighbors, drop links that stretch too far, and can be dragged with the
//! pointer. It is compiled to WebAssembly and exposes a JavaScript-friendly
//! API via wasm-bindgen; the JS side owns the scene and draws what the core
//! tells it to.
//!
//! # Architecture
//!
//! - `graph`: Nodes, edges and the per-frame step, on petgraph's StableGraph
//! - `spatial`: R-tree spatial index for neighbor candidates and hit testing
//! - `render`: The sink the core draws through, and the JS command queue
//! - `interaction`: Pointer drag state
//! - `config`: Tunable simulation parameters

use glam::Vec3;
use js_sys::Float32Array;
use wasm_bindgen::prelude::*;

pub mod config;
pub mod error;
pub mod graph;
pub mod interaction;
pub mod render;
pub mod spatial;

use config::SimulationConfig;
use graph::{Color, NodeId, World};
use render::RenderQueue;

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Main entry point for the simulation.
///
/// This struct wraps the internal World together with the render queue the
/// JS renderer drains each frame.
#[wasm_bindgen]
pub struct DriftGraphWasm {
    world: World,
    queue: RenderQueue,
}

#[wasm_bindgen]
impl DriftGraphWasm {
    /// Create an empty field with the default configuration.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            world: World::new(),
            queue: RenderQueue::new(),
        }
    }

    /// Create an empty field from a config object.
    ///
    /// Missing fields take their defaults. Throws if a value is invalid.
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(config: JsValue) -> Result<DriftGraphWasm, JsError> {
        let config: SimulationConfig = serde_wasm_bindgen::from_value(config)?;
        Ok(Self {
            world: World::with_config(config)?,
            queue: RenderQueue::new(),
        })
    }

    /// Get the current configuration as a plain object.
    pub fn config(&self) -> Result<JsValue, JsError> {
        Ok(serde_wasm_bindgen::to_value(self.world.config())?)
    }

    /// Replace the configuration. Throws if a value is invalid.
    #[wasm_bindgen(js_name = setConfig)]
    pub fn set_config(&mut self, config: JsValue) -> Result<(), JsError> {
        let config: SimulationConfig = serde_wasm_bindgen::from_value(config)?;
        self.world.set_config(config, &mut self.queue)?;
        Ok(())
    }

    // =========================================================================
    // Node Operations
    // =========================================================================

    /// Add a node resting at (x, y, z).
    ///
    /// Returns the stable node ID.
    ///
    /// # Arguments
    ///
    /// * `size` - Radius, used for hit testing
    /// * `label` - Optional label; empty means none
    /// * `color` - Packed 0xRRGGBB
    /// * `velocity_scale` - Scale of the random initial velocity (0 = still)
    #[wasm_bindgen(js_name = createNode)]
    pub fn create_node(
        &mut self,
        x: f32,
        y: f32,
        z: f32,
        size: f32,
        label: Option<String>,
        color: u32,
        velocity_scale: f32,
    ) -> u32 {
        self.world
            .create_node(Vec3::new(x, y, z), size, label, Color(color), velocity_scale)
            .raw()
    }

    /// Scatter the configured number of nodes. Returns their IDs.
    pub fn populate(&mut self) -> Vec<u32> {
        self.world.populate().into_iter().map(NodeId::raw).collect()
    }

    /// Remove a node by ID, along with every edge touching it.
    ///
    /// Returns true if the node existed and was removed.
    #[wasm_bindgen(js_name = removeNode)]
    pub fn remove_node(&mut self, node_id: u32) -> bool {
        self.world.remove_node(NodeId(node_id), &mut self.queue)
    }

    /// Get the number of nodes.
    #[wasm_bindgen(js_name = nodeCount)]
    pub fn node_count(&self) -> u32 {
        self.world.node_count() as u32
    }

    /// Get live node IDs in insertion order.
    #[wasm_bindgen(js_name = getNodeIds)]
    pub fn get_node_ids(&self) -> Vec<u32> {
        self.world.node_ids().iter().map(|id| id.raw()).collect()
    }

    /// Get a node's position as [x, y, z].
    #[wasm_bindgen(js_name = getNodePosition)]
    pub fn get_node_position(&self, node_id: u32) -> Option<Vec<f32>> {
        self.world
            .node(NodeId(node_id))
            .map(|node| node.position().to_array().to_vec())
    }

    /// Set a node's position directly.
    #[wasm_bindgen(js_name = setNodePosition)]
    pub fn set_node_position(&mut self, node_id: u32, x: f32, y: f32, z: f32) -> bool {
        self.world.set_node_position(NodeId(node_id), Vec3::new(x, y, z))
    }

    /// Add an impulse to a node's velocity.
    #[wasm_bindgen(js_name = applyForce)]
    pub fn apply_force(&mut self, node_id: u32, x: f32, y: f32, z: f32) -> bool {
        self.world.apply_force(NodeId(node_id), Vec3::new(x, y, z))
    }

    /// Get a node's label text.
    #[wasm_bindgen(js_name = getNodeLabel)]
    pub fn get_node_label(&self, node_id: u32) -> Option<String> {
        self.world
            .node(NodeId(node_id))
            .and_then(|node| node.label().map(str::to_owned))
    }

    /// Get a node's radius.
    #[wasm_bindgen(js_name = getNodeSize)]
    pub fn get_node_size(&self, node_id: u32) -> Option<f32> {
        self.world.node(NodeId(node_id)).map(|node| node.size())
    }

    /// Get a node's color as packed 0xRRGGBB.
    #[wasm_bindgen(js_name = getNodeColor)]
    pub fn get_node_color(&self, node_id: u32) -> Option<u32> {
        self.world.node(NodeId(node_id)).map(|node| node.color().raw())
    }

    /// Select or deselect a node. Selected nodes ignore their spring.
    #[wasm_bindgen(js_name = setSelected)]
    pub fn set_selected(&mut self, node_id: u32, selected: bool) -> bool {
        self.world.set_selected(NodeId(node_id), selected)
    }

    /// Check if a node is selected.
    #[wasm_bindgen(js_name = isNodeSelected)]
    pub fn is_node_selected(&self, node_id: u32) -> bool {
        self.world
            .node(NodeId(node_id))
            .is_some_and(|node| node.is_selected())
    }

    // =========================================================================
    // Edge Operations
    // =========================================================================

    /// Connect `from` to `to`.
    ///
    /// Returns false if they are already linked either way or `from` is full.
    pub fn connect(&mut self, from: u32, to: u32) -> bool {
        self.world.connect(NodeId(from), NodeId(to), &mut self.queue)
    }

    /// Remove the edge `from → to`. Safe to call when there is none.
    pub fn disconnect(&mut self, from: u32, to: u32) -> bool {
        self.world.disconnect(NodeId(from), NodeId(to), &mut self.queue)
    }

    /// Check for a directed edge `from → to`.
    #[wasm_bindgen(js_name = isConnected)]
    pub fn is_connected(&self, from: u32, to: u32) -> bool {
        self.world.is_connected(NodeId(from), NodeId(to))
    }

    /// Get the targets of a node's outgoing edges, oldest first.
    #[wasm_bindgen(js_name = getEdges)]
    pub fn get_edges(&self, node_id: u32) -> Vec<u32> {
        self.world
            .edges(NodeId(node_id))
            .into_iter()
            .map(|edge| edge.to.raw())
            .collect()
    }

    /// Get every edge as [from0, to0, from1, to1, ...].
    #[wasm_bindgen(js_name = getEdgePairs)]
    pub fn get_edge_pairs(&self) -> Vec<u32> {
        self.world.edge_pairs()
    }

    /// Get the number of edges.
    #[wasm_bindgen(js_name = edgeCount)]
    pub fn edge_count(&self) -> u32 {
        self.world.edge_count() as u32
    }

    /// Get the nodes in connection range of a node, nearest first.
    #[wasm_bindgen(js_name = getNearestNodes)]
    pub fn get_nearest_nodes(&self, node_id: u32) -> Vec<u32> {
        self.world
            .nearest_nodes(NodeId(node_id))
            .into_iter()
            .map(NodeId::raw)
            .collect()
    }

    // =========================================================================
    // Simulation
    // =========================================================================

    /// Run one frame. Returns `{ connected, pruned }`.
    ///
    /// Call once per animation frame, then drain the render commands.
    pub fn step(&mut self) -> Result<JsValue, JsError> {
        let report = self.world.step(&mut self.queue);
        Ok(serde_wasm_bindgen::to_value(&report)?)
    }

    /// Advance a single node. Returns the number of edges it dropped.
    #[wasm_bindgen(js_name = tickNode)]
    pub fn tick_node(&mut self, node_id: u32) -> u32 {
        self.world.tick_node(NodeId(node_id), &mut self.queue)
    }

    /// Get all node positions as a Float32Array [x0, y0, z0, x1, ...],
    /// in the same order as `getNodeIds`.
    #[wasm_bindgen(js_name = getPositions)]
    pub fn get_positions(&self) -> Float32Array {
        Float32Array::from(&self.world.positions()[..])
    }

    /// Take the render commands queued since the last call.
    ///
    /// Each command is an object tagged by `kind`: `createLine`,
    /// `updateLine`, `releaseLine`, `label` or `present`.
    #[wasm_bindgen(js_name = drainRenderCommands)]
    pub fn drain_render_commands(&mut self) -> Result<JsValue, JsError> {
        Ok(serde_wasm_bindgen::to_value(&self.queue.drain())?)
    }

    // =========================================================================
    // Pointer Interaction
    // =========================================================================

    /// Find the node whose body contains the point, if any.
    #[wasm_bindgen(js_name = nodeAt)]
    pub fn node_at(&mut self, x: f32, y: f32, z: f32) -> Option<u32> {
        self.world.node_at(Vec3::new(x, y, z)).map(NodeId::raw)
    }

    /// Start dragging a node, grabbed at the ray hit point (x, y, z).
    #[wasm_bindgen(js_name = beginDrag)]
    pub fn begin_drag(&mut self, node_id: u32, x: f32, y: f32, z: f32) -> bool {
        self.world.begin_drag(NodeId(node_id), Vec3::new(x, y, z))
    }

    /// Move the grab point to (x, y, z). Applied on the next step.
    #[wasm_bindgen(js_name = dragTo)]
    pub fn drag_to(&mut self, x: f32, y: f32, z: f32) -> bool {
        self.world.drag_to(Vec3::new(x, y, z))
    }

    /// Release the dragged node. Returns its ID, if one was held.
    #[wasm_bindgen(js_name = endDrag)]
    pub fn end_drag(&mut self) -> Option<u32> {
        self.world.end_drag().map(NodeId::raw)
    }

    /// Clear all nodes and edges, releasing every line.
    pub fn clear(&mut self) {
        self.world.clear(&mut self.queue);
    }
}

impl Default for DriftGraphWasm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::render::RenderCommand;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn assert_invariants(world: &World, queue: &RenderQueue) {
        let cap = world.config().max_connections;
        for &a in world.node_ids() {
            let edges = world.edges(a);
            assert!(edges.len() <= cap, "{a} has {} edges, cap is {cap}", edges.len());
            for edge in edges {
                assert!(
                    !world.is_connected(edge.to, a),
                    "{a} and {} are linked both ways",
                    edge.to
                );
            }
        }
        assert_eq!(queue.live_lines(), world.edge_count(), "line resources leaked");
    }

    /// Populate the default field and run it, checking the structural
    /// invariants after every frame.
    #[test]
    fn test_populated_field_invariants() {
        init_tracing();
        let config = SimulationConfig {
            max_connections: 3,
            seed: 42,
            ..Default::default()
        };
        let mut world = World::with_config(config).unwrap();
        let mut queue = RenderQueue::new();
        world.populate();
        assert_eq!(world.node_count(), 25);

        for _ in 0..50 {
            world.step(&mut queue);
            assert_invariants(&world, &queue);
            queue.drain();
        }
        assert!(world.edge_count() > 0);
    }

    /// Each frame re-labels every labelled node and ends with one present.
    #[test]
    fn test_frame_commands() {
        let mut world = World::with_config(SimulationConfig {
            node_count: 10,
            ..Default::default()
        })
        .unwrap();
        let mut queue = RenderQueue::new();
        world.populate();

        for _ in 0..3 {
            world.step(&mut queue);
            let commands = queue.drain();
            let labels = commands
                .iter()
                .filter(|c| matches!(c, RenderCommand::Label { .. }))
                .count();
            assert_eq!(labels, 5);
            assert_eq!(commands.last(), Some(&RenderCommand::Present));
        }
    }

    /// Same seed, same frames: identical edges.
    #[test]
    fn test_deterministic_steps() {
        let run = || {
            let mut world = World::with_config(SimulationConfig {
                seed: 9,
                ..Default::default()
            })
            .unwrap();
            let mut queue = RenderQueue::new();
            world.populate();
            for _ in 0..20 {
                world.step(&mut queue);
            }
            (world.edge_pairs(), world.positions())
        };

        assert_eq!(run(), run());
    }

    /// Dragging a node far away drops every edge that touches it within two
    /// frames: its own on its tick, incoming ones on their owners' ticks.
    #[test]
    fn test_drag_away_disconnects() {
        init_tracing();
        let mut world = World::with_config(SimulationConfig {
            seed: 3,
            ..Default::default()
        })
        .unwrap();
        let mut queue = RenderQueue::new();
        world.populate();
        for _ in 0..5 {
            world.step(&mut queue);
        }

        let dragged = world
            .node_ids()
            .iter()
            .copied()
            .max_by_key(|&id| world.edges(id).len())
            .unwrap();
        assert!(!world.edges(dragged).is_empty());

        let position = world.node(dragged).unwrap().position();
        assert!(world.begin_drag(dragged, position));
        assert!(world.drag_to(Vec3::new(50.0, 2.0, 0.0)));

        world.step(&mut queue);
        assert_eq!(world.node(dragged).unwrap().position(), Vec3::new(50.0, 2.0, 0.0));
        world.step(&mut queue);

        assert!(world.edges(dragged).is_empty());
        for &id in world.node_ids() {
            assert!(!world.is_connected(id, dragged));
        }
        assert!(world.nearest_nodes(dragged).is_empty());
        assert_invariants(&world, &queue);

        assert_eq!(world.end_drag(), Some(dragged));
    }

    /// The facade methods that don't cross the JS boundary.
    #[test]
    fn test_facade_roundtrip() {
        let mut graph = DriftGraphWasm::new();
        let a = graph.create_node(0.0, 0.0, 0.0, 0.3, Some("a".to_string()), 0xaaaaff, 0.0);
        let b = graph.create_node(1.0, 0.0, 0.0, 0.3, None, 0xaaaaaa, 0.0);

        assert_eq!(graph.get_nearest_nodes(a), vec![b]);
        assert!(graph.connect(a, b));
        assert!(graph.is_connected(a, b));
        assert!(!graph.is_connected(b, a));
        assert_eq!(graph.get_edges(a), vec![b]);
        assert_eq!(graph.get_edge_pairs(), vec![a, b]);
        assert_eq!(graph.get_node_label(a), Some("a".to_string()));
        assert_eq!(graph.get_node_color(b), Some(0xaaaaaa));

        assert_eq!(graph.node_at(0.9, 0.0, 0.0), Some(b));
        assert!(graph.set_selected(b, true));
        assert!(graph.is_node_selected(b));

        assert!(graph.disconnect(a, b));
        assert!(!graph.disconnect(a, b));
        assert_eq!(graph.edge_count(), 0);

        graph.clear();
        assert_eq!(graph.node_count(), 0);
        assert!(graph.get_node_ids().is_empty());
    }
}
