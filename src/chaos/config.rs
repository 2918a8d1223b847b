//! Chaos configuration.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::utils::validation::validate_chaos_config;

/// Kind of fault injected each round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChaosSubMode {
    /// Independently fail random nodes and cascade downstream
    #[default]
    RandomFailure,
    /// Split the graph into two groups and sever the edges between them
    NetworkPartition,
}

impl std::fmt::Display for ChaosSubMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChaosSubMode::RandomFailure => write!(f, "random-failure"),
            ChaosSubMode::NetworkPartition => write!(f, "network-partition"),
        }
    }
}

/// Parameters of a chaos session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaosConfig {
    pub sub_mode: ChaosSubMode,
    /// Period of the round timer, must be > 0
    pub interval_ms: u64,
    /// Upper bound on nodes failed per round (0 disables failures)
    pub max_failures_per_round: usize,
    /// Per-node failure probability, within [0, 1]
    pub failure_probability: f64,
    /// Nodes that are never selected and never marked affected
    pub protected_node_ids: BTreeSet<String>,
}

impl Default for ChaosConfig {
    fn default() -> Self {
        Self {
            sub_mode: ChaosSubMode::RandomFailure,
            interval_ms: 2000,
            max_failures_per_round: 1,
            failure_probability: 0.3,
            protected_node_ids: BTreeSet::new(),
        }
    }
}

impl ChaosConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), SimError> {
        validate_chaos_config(self).map_err(SimError::InvalidConfig)
    }

    /// Timer period
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn is_protected(&self, node_id: &str) -> bool {
        self.protected_node_ids.contains(node_id)
    }
}
