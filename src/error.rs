//! Error taxonomy for the simulation engine.
//!
//! Engine operations return [`SimError`]. File-facing code (graph loader,
//! config loader, reports, CLI) wraps these in `color_eyre` reports with
//! context instead.

use thiserror::Error;

/// Errors raised by the simulation engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// A referenced node or edge is absent from the graph snapshot.
    #[error("{kind} '{id}' not found in graph")]
    NotFound { kind: &'static str, id: String },

    /// A configuration value was rejected; the previous value is retained.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A computation needs more nodes than the graph provides.
    #[error("Operation requires at least {required} nodes, graph has {available}")]
    InsufficientNodes { required: usize, available: usize },

    /// The graph snapshot violates a structural invariant.
    #[error("Invalid graph: {0}")]
    InvalidGraph(String),
}

impl SimError {
    /// Creates a not-found error for a node id.
    pub fn node_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "Node",
            id: id.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
