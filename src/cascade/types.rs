//! Cascade and partition result types.

use serde::{Deserialize, Serialize};

/// Nodes and edges reached at one hop distance from the nearest failed node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeLevel {
    /// 0 = directly downstream of a failed node
    pub depth: usize,
    pub node_ids: Vec<String>,
    /// Edges carrying the failure into this level's nodes
    pub edge_ids: Vec<String>,
}

/// Everything transitively impacted by a set of failed nodes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlastRadius {
    pub affected_node_ids: Vec<String>,
    pub broken_edge_ids: Vec<String>,
    pub levels: Vec<CascadeLevel>,
}

impl BlastRadius {
    pub fn is_empty(&self) -> bool {
        self.affected_node_ids.is_empty() && self.broken_edge_ids.is_empty()
    }
}

/// Two disjoint node groups and the edges cut between them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionResult {
    pub group_a: Vec<String>,
    pub group_b: Vec<String>,
    pub severed_edge_ids: Vec<String>,
}

impl PartitionResult {
    /// Size of the smaller group
    pub fn minority_size(&self) -> usize {
        self.group_a.len().min(self.group_b.len())
    }
}
