//! Derived simulation statistics.
//!
//! Every figure here is a pure function of the current engine outputs and
//! is recomputed on each request; nothing is cached between state changes.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::cascade::BlastRadius;
use crate::chaos::{ChaosEvent, ChaosEventType, ChaosSession};
use crate::flow::FlowPath;

/// Statistics for a traced flow
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowStats {
    pub total_hops: usize,
    /// Sum of step latencies, missing values count as 0
    pub total_latency_ms: f64,
    /// Step edge with the highest latency, first one wins ties
    pub bottleneck_edge_id: Option<String>,
    /// Distinct branches at the deepest level; see `peak_branch_width` for
    /// the widest level, e.g. the two branches leaving a diamond's source
    pub branch_count: usize,
    pub max_depth: usize,
    /// Most distinct branches on any single level
    pub peak_branch_width: usize,
}

/// Statistics for a failure-mode blast radius
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureStats {
    pub failed_count: usize,
    pub affected_count: usize,
    pub broken_edge_count: usize,
    pub cascade_depth: usize,
    pub impact_percentage: f64,
}

/// Statistics for a chaos session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChaosStats {
    pub rounds: u32,
    pub event_count: usize,
    pub degraded_rounds: usize,
    pub failed_count: usize,
    pub affected_count: usize,
    pub severed_edge_count: usize,
    pub impact_percentage: f64,
    /// Mean time between node failures in milliseconds
    pub mtbf_ms: Option<f64>,
}

/// Mode-specific statistics for the stats panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SimulationStats {
    Idle,
    Flow(FlowStats),
    Failure(FailureStats),
    Chaos(ChaosStats),
}

/// Compute flow statistics for a path
pub fn flow_stats(path: &FlowPath) -> FlowStats {
    let total_latency_ms = path.steps.iter().filter_map(|s| s.latency_ms).sum();

    let mut bottleneck: Option<(&str, f64)> = None;
    for step in &path.steps {
        if let Some(latency) = step.latency_ms {
            if bottleneck.map_or(true, |(_, max)| latency > max) {
                bottleneck = Some((step.edge_id.as_str(), latency));
            }
        }
    }

    let (branch_count, max_depth, peak_branch_width) = match &path.levels {
        Some(levels) => {
            let widths: Vec<usize> = levels
                .iter()
                .map(|level| level.steps.iter().map(|s| s.branch_id.as_str()).collect::<HashSet<_>>().len())
                .collect();
            (
                widths.last().copied().unwrap_or(0),
                levels.len(),
                widths.iter().copied().max().unwrap_or(0),
            )
        }
        // a flat path is a single branch
        None => {
            let branches = usize::from(!path.steps.is_empty());
            (branches, path.steps.len(), branches)
        }
    };

    FlowStats {
        total_hops: path.steps.len(),
        total_latency_ms,
        bottleneck_edge_id: bottleneck.map(|(id, _)| id.to_string()),
        branch_count,
        max_depth,
        peak_branch_width,
    }
}

/// Percentage of the graph impacted, 0 for an empty graph
pub fn impact_percentage(impacted: usize, total_nodes: usize) -> f64 {
    if total_nodes == 0 {
        0.0
    } else {
        impacted as f64 / total_nodes as f64 * 100.0
    }
}

/// Compute failure statistics; impact counts affected nodes only
pub fn failure_stats(failed_count: usize, radius: &BlastRadius, total_nodes: usize) -> FailureStats {
    let affected_count = radius.affected_node_ids.len();
    FailureStats {
        failed_count,
        affected_count,
        broken_edge_count: radius.broken_edge_ids.len(),
        cascade_depth: radius.levels.len(),
        impact_percentage: impact_percentage(affected_count, total_nodes),
    }
}

/// Mean interval between consecutive rounds that actually failed nodes.
///
/// `None` with fewer than two such rounds.
pub fn mean_time_between_failures(events: &[ChaosEvent]) -> Option<f64> {
    let timestamps: Vec<u64> = events
        .iter()
        .filter(|e| e.event_type == ChaosEventType::NodeFailure && !e.node_ids.is_empty())
        .map(|e| e.timestamp)
        .collect();

    if timestamps.len() < 2 {
        return None;
    }

    let total: u64 = timestamps.windows(2).map(|w| w[1].saturating_sub(w[0])).sum();
    Some(total as f64 / (timestamps.len() - 1) as f64)
}

/// Compute chaos statistics for a session
pub fn chaos_stats(session: &ChaosSession, total_nodes: usize) -> ChaosStats {
    let failed_count = session.failed_node_ids().len();
    let affected_count = session.affected_node_ids().len();
    ChaosStats {
        rounds: session.round(),
        event_count: session.events().len(),
        degraded_rounds: session
            .events()
            .iter()
            .filter(|e| e.event_type == ChaosEventType::Degraded)
            .count(),
        failed_count,
        affected_count,
        severed_edge_count: session.severed_edge_ids().len(),
        impact_percentage: impact_percentage(affected_count, total_nodes),
        mtbf_ms: mean_time_between_failures(session.events()),
    }
}
