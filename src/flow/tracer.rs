//! Branch-aware breadth-first path tracer.

use std::collections::{HashMap, HashSet};

use log::debug;

use super::types::{BranchLevel, BranchStep, FlowPath};
use crate::error::SimError;
use crate::graph::GraphAccessor;

/// Trace every path a request can take from `source_node_id`.
///
/// Edges are followed source to target only. A node is claimed by the first
/// depth at which it is reached and is never revisited, so cyclic graphs
/// terminate and no node appears in more than one level. Within a level,
/// fan-out from the same node keeps input edge order.
///
/// `levels[0]` holds the direct successors of the source; the source itself
/// only appears in `node_ids`.
pub fn trace<G: GraphAccessor + ?Sized>(graph: &G, source_node_id: &str) -> Result<FlowPath, SimError> {
    if !graph.contains_node(source_node_id) {
        return Err(SimError::node_not_found(source_node_id));
    }

    let index = graph.outgoing_index();
    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(source_node_id);

    // node id -> branch id of the step that claimed it
    let mut branch_of: HashMap<&str, String> = HashMap::new();
    let mut frontier: Vec<&str> = vec![source_node_id];
    let mut levels: Vec<BranchLevel> = Vec::new();

    while !frontier.is_empty() {
        let depth = levels.len();
        let mut steps = Vec::new();
        let mut next_frontier = Vec::new();

        for &from in &frontier {
            for edge in index.outgoing(from) {
                let to = edge.target.as_str();
                if !visited.insert(to) {
                    continue;
                }

                let branch_id = match branch_of.get(from) {
                    Some(parent) => format!("{}/{}", parent, edge.id),
                    None => format!("{}/{}", from, edge.id),
                };
                branch_of.insert(to, branch_id.clone());

                steps.push(BranchStep {
                    edge_id: edge.id.clone(),
                    from_node_id: from.to_string(),
                    to_node_id: to.to_string(),
                    protocol: edge.protocol.clone(),
                    latency_ms: edge.latency_ms,
                    branch_id,
                    depth,
                });
                next_frontier.push(to);
            }
        }

        if steps.is_empty() {
            break;
        }

        debug!("Flow trace from {}: depth {} reached {} node(s)", source_node_id, depth, steps.len());
        levels.push(BranchLevel { depth, steps });
        frontier = next_frontier;
    }

    let mut path = FlowPath {
        node_ids: vec![source_node_id.to_string()],
        ..FlowPath::default()
    };
    for step in levels.iter().flat_map(|level| level.steps.iter()) {
        path.node_ids.push(step.to_node_id.clone());
        path.edge_ids.push(step.edge_id.clone());
        path.steps.push(step.to_flow_step());
    }
    path.levels = Some(levels);

    Ok(path)
}
