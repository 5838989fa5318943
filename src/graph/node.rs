//! Node type and related structures.
//!
//! Nodes are the drifting points of the field. Each node has:
//! - A stable unique identifier (survives removal of other nodes)
//! - Position and velocity in world space
//! - A rest position it is sprung toward while not being dragged
//! - Presentation data (size, color, optional label)

use std::fmt;

use glam::Vec3;

use crate::config::SimulationConfig;

/// Stable node identifier.
///
/// This ID remains valid even after other nodes are removed from the world.
/// It wraps a u32 for efficient storage and WebAssembly interop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a new NodeId from a raw u32.
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

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

impl From<u32> for NodeId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<NodeId> for u32 {
    #[inline]
    fn from(id: NodeId) -> Self {
        id.0
    }
}

/// Packed `0xRRGGBB` color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    /// Color of unlabelled nodes.
    pub const GREY: Color = Color(0xaa_aa_aa);
    /// Color of labelled nodes.
    pub const BLUE: Color = Color(0xaa_aa_ff);

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    #[inline]
    pub fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    pub fn b(self) -> u8 {
        self.0 as u8
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::GREY
    }
}

/// A simulated point in the field.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    position: Vec3,
    rest_position: Vec3,
    velocity: Vec3,
    size: f32,
    color: Color,
    label: Option<String>,
    selected: bool,
}

impl Node {
    /// Create a node resting at `position`.
    ///
    /// An empty label means the node has no label at all.
    pub fn new(
        id: NodeId,
        position: Vec3,
        size: f32,
        label: Option<String>,
        color: Color,
        velocity: Vec3,
    ) -> Self {
        Self {
            id,
            position,
            rest_position: position,
            velocity,
            size,
            color,
            label: label.filter(|l| !l.is_empty()),
            selected: false,
        }
    }

    /// Advance position and velocity by one step.
    ///
    /// Position moves first, using the velocity from the previous step. The
    /// spring force grows with the distance to the rest position, so nodes
    /// overshoot before settling. Selected nodes keep their velocity as is.
    pub fn integrate(&mut self, config: &SimulationConfig) {
        self.position += self.velocity;

        if !self.selected {
            let displacement = self.rest_position - self.position;
            let distance = displacement.length();
            self.velocity += displacement * (config.spring_strength * distance);
            self.velocity *= config.spring_dampening;
        }

        if let Some(bounds) = config.bounds {
            self.reflect(bounds);
        }
    }

    /// Flip the velocity on every axis where the node is outside `[-bounds, bounds]`.
    fn reflect(&mut self, bounds: f32) {
        let outside =
            self.position.cmplt(Vec3::splat(-bounds)) | self.position.cmpgt(Vec3::splat(bounds));
        self.velocity = Vec3::select(outside, -self.velocity, self.velocity);
    }

    /// Rewrite the label as the node's distance from the origin.
    ///
    /// Returns the new text for labelled nodes, every call, whether or not
    /// it changed.
    pub fn refresh_label(&mut self) -> Option<&str> {
        let label = self.label.as_mut()?;
        *label = format!("{:.6}", self.position.length());
        Some(label.as_str())
    }

    /// Add an external impulse to the velocity.
    #[inline]
    pub fn apply_force(&mut self, force: Vec3) {
        self.velocity += force;
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Move the node directly, bypassing velocity integration.
    #[inline]
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    #[inline]
    pub fn rest_position(&self) -> Vec3 {
        self.rest_position
    }

    #[inline]
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    #[inline]
    pub fn size(&self) -> f32 {
        self.size
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    #[inline]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Check if the node is being dragged.
    #[inline]
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Set the selected state. Selected nodes ignore the spring force.
    #[inline]
    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(position: Vec3) -> Node {
        Node::new(NodeId(0), position, 0.3, None, Color::GREY, Vec3::ZERO)
    }

    #[test]
    fn test_node_id() {
        let id = NodeId::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(id.0, 42);
        assert_eq!(format!("{}", id), "Node(42)");
    }

    #[test]
    fn test_node_id_conversion() {
        let id: NodeId = 123.into();
        let raw: u32 = id.into();
        assert_eq!(raw, 123);
    }

    #[test]
    fn test_color_channels() {
        let color = Color(0x12_34_56);
        assert_eq!((color.r(), color.g(), color.b()), (0x12, 0x34, 0x56));
        assert_eq!(Color::default(), Color::GREY);
    }

    #[test]
    fn test_empty_label_is_none() {
        let node = Node::new(
            NodeId(0),
            Vec3::ZERO,
            0.3,
            Some(String::new()),
            Color::GREY,
            Vec3::ZERO,
        );
        assert_eq!(node.label(), None);
    }

    #[test]
    fn test_spring_step() {
        let config = SimulationConfig::default();
        let mut node = at(Vec3::ZERO);
        node.set_position(Vec3::X);

        node.integrate(&config);

        // Position used the old (zero) velocity.
        assert_eq!(node.position(), Vec3::X);
        // (rest - pos) * 0.05 * 1 * 0.85
        assert!((node.velocity() - Vec3::new(-0.0425, 0.0, 0.0)).length() < 1e-6);
        assert_eq!(node.rest_position(), Vec3::ZERO);
    }

    #[test]
    fn test_spring_force_scales_with_distance() {
        let config = SimulationConfig::default();
        let mut node = at(Vec3::ZERO);
        node.set_position(Vec3::new(2.0, 0.0, 0.0));

        node.integrate(&config);

        // -2 * 0.05 * 2 * 0.85
        assert!((node.velocity().x + 0.17).abs() < 1e-6);
    }

    #[test]
    fn test_selected_skips_spring() {
        let config = SimulationConfig::default();
        let velocity = Vec3::new(0.1, 0.0, 0.0);
        let mut node = Node::new(NodeId(0), Vec3::ZERO, 0.3, None, Color::GREY, velocity);
        node.set_selected(true);
        node.set_position(Vec3::X);

        node.integrate(&config);

        assert_eq!(node.velocity(), Vec3::new(0.1, 0.0, 0.0));
        assert!((node.position().x - 1.1).abs() < 1e-6);

        node.set_selected(false);
        node.integrate(&config);
        assert!(node.velocity().x < 0.1);
    }

    #[test]
    fn test_reflects_per_axis() {
        let config = SimulationConfig {
            bounds: Some(1.0),
            spring_strength: 0.0,
            spring_dampening: 1.0,
            ..Default::default()
        };
        let velocity = Vec3::new(0.5, 0.5, -0.5);
        let mut node = Node::new(NodeId(0), Vec3::ZERO, 0.3, None, Color::GREY, velocity);
        node.set_position(Vec3::new(0.9, 0.0, 0.0));

        node.integrate(&config);

        // Only x crossed the boundary.
        assert!((node.position().x - 1.4).abs() < 1e-6);
        assert_eq!(node.velocity(), Vec3::new(-0.5, 0.5, -0.5));

        // Back inside (y and z sit exactly on the boundary): no flip.
        node.integrate(&config);
        assert_eq!(node.velocity(), Vec3::new(-0.5, 0.5, -0.5));
    }

    #[test]
    fn test_unbounded_never_reflects() {
        let config = SimulationConfig {
            spring_strength: 0.0,
            spring_dampening: 1.0,
            ..Default::default()
        };
        let mut node = Node::new(NodeId(0), Vec3::splat(1000.0), 0.3, None, Color::GREY, Vec3::ONE);
        node.integrate(&config);
        assert_eq!(node.velocity(), Vec3::ONE);
    }

    #[test]
    fn test_refresh_label() {
        let mut node = Node::new(
            NodeId(0),
            Vec3::new(3.0, 4.0, 0.0),
            0.3,
            Some("7".into()),
            Color::BLUE,
            Vec3::ZERO,
        );
        assert_eq!(node.label(), Some("7"));
        assert_eq!(node.refresh_label(), Some("5.000000"));
        assert_eq!(node.label(), Some("5.000000"));

        let mut plain = at(Vec3::ONE);
        assert_eq!(plain.refresh_label(), None);
    }

    #[test]
    fn test_apply_force() {
        let mut node = at(Vec3::ZERO);
        node.apply_force(Vec3::Y);
        node.apply_force(Vec3::Y);
        assert_eq!(node.velocity(), Vec3::new(0.0, 2.0, 0.0));
    }
}
