//! Validation utilities.
//!
//! Structural checks for graph snapshots and range checks for chaos
//! configuration values.

use std::collections::HashSet;

use crate::chaos::ChaosConfig;
use crate::graph::Graph;

/// Validate the structural invariants of a graph snapshot
///
/// Checks for:
/// - Empty node or edge ids
/// - Duplicate node ids
/// - Duplicate edge ids
/// - Edges whose source or target does not reference an existing node
///
/// # Returns
/// * `Ok(())` if validation succeeds
/// * `Err(String)` with an error message if validation fails
///
/// # Examples
/// ```
/// use archsim::graph::{Edge, Graph, Node};
/// use archsim::utils::validation::validate_graph;
///
/// let graph = Graph::new(
///     vec![Node::new("a", "service"), Node::new("b", "service")],
///     vec![Edge::new("e1", "a", "b")],
/// );
/// assert!(validate_graph(&graph).is_ok());
///
/// let dangling = Graph::new(vec![Node::new("a", "service")], vec![Edge::new("e1", "a", "b")]);
/// assert!(validate_graph(&dangling).is_err());
/// ```
pub fn validate_graph(graph: &Graph) -> Result<(), String> {
    let mut node_ids: HashSet<&str> = HashSet::new();
    for node in &graph.nodes {
        if node.id.is_empty() {
            return Err("Node id cannot be empty".to_string());
        }
        if !node_ids.insert(node.id.as_str()) {
            return Err(format!("Duplicate node id '{}'", node.id));
        }
    }

    let mut edge_ids: HashSet<&str> = HashSet::new();
    for edge in &graph.edges {
        if edge.id.is_empty() {
            return Err(format!("Edge {} -> {} has an empty id", edge.source, edge.target));
        }
        if !edge_ids.insert(edge.id.as_str()) {
            return Err(format!("Duplicate edge id '{}'", edge.id));
        }
        if !node_ids.contains(edge.source.as_str()) {
            return Err(format!("Edge '{}' references unknown source node '{}'", edge.id, edge.source));
        }
        if !node_ids.contains(edge.target.as_str()) {
            return Err(format!("Edge '{}' references unknown target node '{}'", edge.id, edge.target));
        }
        if let Some(latency) = edge.latency_ms {
            if !latency.is_finite() || latency < 0.0 {
                return Err(format!("Edge '{}' has invalid latency {}", edge.id, latency));
            }
        }
    }

    if graph.nodes.is_empty() {
        log::info!("Graph snapshot is empty - all simulations will produce empty results");
    }

    Ok(())
}

/// Validate chaos configuration ranges
///
/// - `interval_ms` must be greater than zero
/// - `failure_probability` must lie in `[0, 1]`
///
/// `max_failures_per_round` is unsigned so it cannot be negative.
///
/// # Examples
/// ```
/// use archsim::chaos::ChaosConfig;
/// use archsim::utils::validation::validate_chaos_config;
///
/// assert!(validate_chaos_config(&ChaosConfig::default()).is_ok());
///
/// let bad = ChaosConfig {
///     failure_probability: 1.5,
///     ..ChaosConfig::default()
/// };
/// assert!(validate_chaos_config(&bad).is_err());
/// ```
pub fn validate_chaos_config(config: &ChaosConfig) -> Result<(), String> {
    if config.interval_ms == 0 {
        return Err("interval_ms must be greater than 0".to_string());
    }

    let p = config.failure_probability;
    if !(0.0..=1.0).contains(&p) {
        return Err(format!("failure_probability must be within [0, 1], got {}", p));
    }

    Ok(())
}
