//! Blast-radius computation.
//!
//! Failures propagate downstream only (source to target). Each affected node
//! is assigned to the smallest hop distance at which any failed node reaches
//! it. Protected nodes stop propagation: they keep their severed inbound
//! edge but are never marked affected.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use super::types::{BlastRadius, CascadeLevel};
use crate::graph::GraphAccessor;

/// Compute the blast radius of `failed_node_ids`.
///
/// Ids listed in `protected_node_ids` are removed from the failed set first.
/// Ids absent from the graph are ignored with a warning. An empty failed set
/// yields an empty result.
pub fn compute_blast_radius<G, F, P>(graph: &G, failed_node_ids: &[F], protected_node_ids: &[P]) -> BlastRadius
where
    G: GraphAccessor + ?Sized,
    F: AsRef<str>,
    P: AsRef<str>,
{
    let protected: HashSet<&str> = protected_node_ids.iter().map(|id| id.as_ref()).collect();

    let mut failed: HashSet<&str> = HashSet::new();
    for id in failed_node_ids.iter().map(|id| id.as_ref()) {
        if protected.contains(id) {
            debug!("Node {} is protected, excluding it from the failed set", id);
        } else if !graph.contains_node(id) {
            warn!("Ignoring failed node {} which is not in the graph", id);
        } else {
            failed.insert(id);
        }
    }

    if failed.is_empty() {
        return BlastRadius::default();
    }

    let index = graph.outgoing_index();

    // Seed in graph order so results do not depend on caller ordering
    let mut frontier: Vec<&str> = graph
        .nodes()
        .iter()
        .map(|n| n.id.as_str())
        .filter(|id| failed.contains(id))
        .collect();

    // node id -> depth at which it was claimed (failed nodes are never claimed)
    let mut claimed_at: HashMap<&str, usize> = HashMap::new();
    let mut result = BlastRadius::default();

    while !frontier.is_empty() {
        let depth = result.levels.len();
        let mut level = CascadeLevel {
            depth,
            node_ids: Vec::new(),
            edge_ids: Vec::new(),
        };
        let mut next_frontier = Vec::new();

        for &from in &frontier {
            for edge in index.outgoing(from) {
                let to = edge.target.as_str();
                result.broken_edge_ids.push(edge.id.clone());

                if protected.contains(to) || failed.contains(to) {
                    continue;
                }

                match claimed_at.get(to) {
                    None => {
                        claimed_at.insert(to, depth);
                        level.node_ids.push(to.to_string());
                        level.edge_ids.push(edge.id.clone());
                        next_frontier.push(to);
                    }
                    Some(&claimed) if claimed == depth => {
                        level.edge_ids.push(edge.id.clone());
                    }
                    Some(_) => {}
                }
            }
        }

        if level.node_ids.is_empty() {
            break;
        }

        debug!("Cascade depth {}: {} node(s) affected", depth, level.node_ids.len());
        result.affected_node_ids.extend(level.node_ids.iter().cloned());
        result.levels.push(level);
        frontier = next_frontier;
    }

    result
}
