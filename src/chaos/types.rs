//! Chaos event log types.

use serde::{Deserialize, Serialize};

/// Kind of a logged chaos round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChaosEventType {
    NodeFailure,
    Partition,
    /// The round's computation failed; the session keeps running
    Degraded,
}

impl std::fmt::Display for ChaosEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChaosEventType::NodeFailure => write!(f, "node-failure"),
            ChaosEventType::Partition => write!(f, "partition"),
            ChaosEventType::Degraded => write!(f, "degraded"),
        }
    }
}

/// One entry of the chaos event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChaosEvent {
    /// Strictly increasing from 1 within a session
    pub round: u32,
    /// Scheduler time of the round in milliseconds
    pub timestamp: u64,
    #[serde(rename = "type")]
    pub event_type: ChaosEventType,
    pub message: String,
    pub node_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_ids: Option<Vec<String>>,
    pub affected_count: usize,
}

/// Whether the round timer is live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChaosStatus {
    #[default]
    Stopped,
    Running,
}
