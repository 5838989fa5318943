//! Spatial indexing for O(log n) proximity queries.
//!
//! This module provides an R-tree based spatial index for efficient
//! radius queries on node positions.

mod rtree;

pub use rtree::SpatialIndex;
