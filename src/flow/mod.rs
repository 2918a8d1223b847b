//! Request flow tracing.
//!
//! Computes the branch-aware path a request takes through the graph from a
//! chosen source node, following edge direction only.

pub mod tracer;
pub mod types;

pub use tracer::trace;
pub use types::{BranchLevel, BranchStep, FlowPath, FlowStep};
