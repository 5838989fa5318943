//! Boundary to the rendering layer.
//!
//! The simulation never touches scene objects directly. It asks a
//! [`RenderSink`] to create, move and release line resources and to refresh
//! text labels, and refers to them through opaque [`LineHandle`]s. The wasm
//! build uses [`RenderQueue`], which records commands for the JS renderer to
//! replay each frame.

mod queue;

pub use queue::{RenderCommand, RenderQueue};

use glam::Vec3;

use crate::graph::{Color, NodeId};

/// Opaque handle to a line resource owned by the renderer.
///
/// Deliberately neither `Clone` nor `Copy`: the edge holding it is the only
/// owner, and [`RenderSink::release_line`] consumes it.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct LineHandle(u32);

impl LineHandle {
    /// Wrap a renderer-assigned id.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw id.
    #[inline]
    pub fn raw(&self) -> u32 {
        self.0
    }
}

/// Calls the simulation makes into the rendering layer.
pub trait RenderSink {
    /// Allocate a line between two points, drawn in `color`.
    fn create_line(&mut self, from: Vec3, to: Vec3, color: Color) -> LineHandle;

    /// Move both endpoints of an existing line.
    fn update_line(&mut self, line: &LineHandle, from: Vec3, to: Vec3);

    /// Dispose of a line and its material.
    fn release_line(&mut self, line: LineHandle);

    /// Re-rasterize the text label attached to a node.
    fn label_changed(&mut self, node: NodeId, label: &str);

    /// The frame's simulation work is done and can be drawn.
    fn present(&mut self) {}
}
