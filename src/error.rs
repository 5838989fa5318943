//! Error types.
//!
//! Graph operations themselves are total: invalid calls are no-ops that
//! report `false` or `None`. The only fallible surface is configuration.

use thiserror::Error;

/// Rejected simulation configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be finite, got {value}")]
    NotFinite { field: &'static str, value: f32 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },

    #[error("bounds must be a non-negative number, got {0}")]
    InvalidBounds(f32),
}
