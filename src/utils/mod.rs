//! Shared utilities: structural validation of graphs and configurations.

pub mod validation;

pub use validation::{validate_chaos_config, validate_graph};
