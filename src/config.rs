//! Simulation parameters.
//!
//! All tuning constants live here so hosts and tests can run the same
//! simulation at different scales. The defaults reproduce the browser demo:
//! 25 nodes in a 6-unit cube that link up with anything closer than 3 units.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for the node field simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationConfig {
    /// Maximum outgoing edges per node (default: 1000).
    pub max_connections: usize,
    /// Edges are created below and pruned above this distance (default: 3.0).
    pub max_connection_dist: f32,
    /// Soft reflective boundary per axis. `None` disables it (default).
    pub bounds: Option<f32>,
    /// Spring pull toward the rest position, scaled by distance (default: 0.05).
    pub spring_strength: f32,
    /// Per-tick velocity decay factor (default: 0.85).
    pub spring_dampening: f32,
    /// Nodes created by `World::populate` (default: 25).
    pub node_count: usize,
    /// Radius of populated nodes, also the hit-test radius (default: 0.3).
    pub node_size: f32,
    /// Populated nodes spawn uniformly in `[-extent, extent]` per axis (default: 3.0).
    pub spawn_extent: f32,
    /// Drag targets at or below this height are rejected (default: -1.5).
    pub floor_y: f32,
    /// Seed for initial positions and velocities (default: 0).
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_connections: 1000,
            max_connection_dist: 3.0,
            bounds: None,
            spring_strength: 0.05,
            spring_dampening: 0.85,
            node_count: 25,
            node_size: 0.3,
            spawn_extent: 3.0,
            floor_y: -1.5,
            seed: 0,
        }
    }
}

impl SimulationConfig {
    /// Check that every parameter keeps the simulation well defined.
    ///
    /// Odd but finite spring constants are accepted; they only change how
    /// the field looks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        finite("springStrength", self.spring_strength)?;
        finite("springDampening", self.spring_dampening)?;
        finite("floorY", self.floor_y)?;
        non_negative("maxConnectionDist", self.max_connection_dist)?;
        non_negative("nodeSize", self.node_size)?;
        non_negative("spawnExtent", self.spawn_extent)?;
        finite("spawnExtent", self.spawn_extent)?;

        if let Some(bounds) = self.bounds {
            // Infinity is allowed and behaves like no bounds at all.
            if bounds.is_nan() || bounds < 0.0 {
                return Err(ConfigError::InvalidBounds(bounds));
            }
        }
        Ok(())
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_nan() {
        return Err(ConfigError::NotFinite { field, value });
    }
    if value < 0.0 {
        return Err(ConfigError::Negative { field, value });
    }
    Ok(())
}
