//! Node field data structures and the simulation step.
//!
//! This module provides the world that owns all nodes and their proximity
//! edges, using petgraph's StableGraph for stable node/edge indices, plus
//! the pure neighbor ranking the connect pass is built on.

mod edge;
mod neighbors;
mod node;
mod world;

pub use edge::{EdgeId, EdgeView};
pub use neighbors::nearest_nodes;
pub use node::{Color, Node, NodeId};
pub use world::{StepReport, World};
