//! Flow path data types.

use serde::{Deserialize, Serialize};

/// One hop along a traced path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowStep {
    pub edge_id: String,
    pub from_node_id: String,
    pub to_node_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
}

/// A hop annotated with its branch and BFS depth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchStep {
    pub edge_id: String,
    pub from_node_id: String,
    pub to_node_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
    /// Unique per root-to-node path
    pub branch_id: String,
    /// Hop count from the source, starting at 0 for direct successors
    pub depth: usize,
}

impl BranchStep {
    /// Drop the branch annotations
    pub fn to_flow_step(&self) -> FlowStep {
        FlowStep {
            edge_id: self.edge_id.clone(),
            from_node_id: self.from_node_id.clone(),
            to_node_id: self.to_node_id.clone(),
            protocol: self.protocol.clone(),
            latency_ms: self.latency_ms,
        }
    }
}

/// All hops discovered at one BFS depth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchLevel {
    pub depth: usize,
    pub steps: Vec<BranchStep>,
}

/// A traced request path.
///
/// `node_ids`, `edge_ids` and `steps` are the flattened depth-ordered view
/// for consumers that are not branch aware. `levels` holds the same hops
/// grouped by depth and is absent only for externally supplied paths.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowPath {
    pub node_ids: Vec<String>,
    pub edge_ids: Vec<String>,
    pub steps: Vec<FlowStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub levels: Option<Vec<BranchLevel>>,
}

impl FlowPath {
    /// Highest valid playback step index, `None` if there is nothing to step through.
    ///
    /// Steps are levels when present, flat steps otherwise.
    pub fn max_step_index(&self) -> Option<usize> {
        match &self.levels {
            Some(levels) => levels.len().checked_sub(1),
            None => self.steps.len().checked_sub(1),
        }
    }

    /// The deepest level, if any
    pub fn deepest_level(&self) -> Option<&BranchLevel> {
        self.levels.as_ref().and_then(|levels| levels.last())
    }
}
