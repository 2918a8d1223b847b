//! Report generation for simulation runs.
//!
//! Generates both JSON and human-readable text reports from a
//! [`RunSummary`] snapshot of the controller.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use color_eyre::eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cascade::{BlastRadius, PartitionResult};
use crate::chaos::{ChaosEvent, Scheduler};
use crate::flow::FlowPath;
use crate::graph::GraphAccessor;
use crate::playback::{NodeSimulationState, SimulationController, SimulationMode};
use crate::stats::SimulationStats;

/// Snapshot of everything a finished run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub mode: SimulationMode,
    pub total_nodes: usize,
    pub total_edges: usize,
    pub stats: SimulationStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_path: Option<FlowPath>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blast_radius: Option<BlastRadius>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition: Option<PartitionResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chaos_events: Vec<ChaosEvent>,
    pub node_states: BTreeMap<String, NodeSimulationState>,
}

impl RunSummary {
    /// Capture the controller's current results
    pub fn capture<S: Scheduler>(controller: &SimulationController<S>) -> Self {
        Self {
            mode: controller.mode(),
            total_nodes: controller.graph().node_count(),
            total_edges: controller.graph().edges().len(),
            stats: controller.stats(),
            flow_path: controller.flow_path().cloned(),
            blast_radius: controller.failure_state().map(|f| f.blast_radius.clone()),
            partition: controller.chaos_session().and_then(|s| s.partition()).cloned(),
            chaos_events: controller.chaos_events().to_vec(),
            node_states: controller.node_states(),
        }
    }
}

/// Generate JSON report
pub fn generate_json_report(summary: &RunSummary, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(summary).context("Failed to serialize report to JSON")?;

    fs::write(output_path, json)
        .with_context(|| format!("Failed to write JSON report to {}", output_path.display()))?;

    log::info!("JSON report written to {}", output_path.display());
    Ok(())
}

fn section(lines: &mut Vec<String>, title: &str) {
    lines.push("=".repeat(80));
    lines.push(format!("{:^80}", title));
    lines.push("=".repeat(80));
    lines.push(String::new());
}

fn join_or_none(ids: &[String]) -> String {
    if ids.is_empty() {
        "(none)".to_string()
    } else {
        ids.join(", ")
    }
}

/// Render a human-readable text report
pub fn render_text_report(summary: &RunSummary) -> String {
    let mut lines: Vec<String> = Vec::new();

    section(&mut lines, "ARCHITECTURE SIMULATION REPORT");
    lines.push(format!("Mode: {}", summary.mode));
    lines.push(format!("Nodes: {}", summary.total_nodes));
    lines.push(format!("Edges: {}", summary.total_edges));
    lines.push(String::new());

    match &summary.stats {
        SimulationStats::Idle => {
            lines.push("No simulation results.".to_string());
        }
        SimulationStats::Flow(stats) => {
            section(&mut lines, "REQUEST FLOW");
            lines.push(format!("Total Hops: {}", stats.total_hops));
            lines.push(format!("Total Latency: {:.1} ms", stats.total_latency_ms));
            lines.push(format!(
                "Bottleneck Edge: {}",
                stats.bottleneck_edge_id.as_deref().unwrap_or("(none)")
            ));
            lines.push(format!("Depth: {}", stats.max_depth));
            lines.push(format!(
                "Branches: {} at deepest level, {} at widest",
                stats.branch_count, stats.peak_branch_width
            ));
            lines.push(String::new());

            if let Some(path) = &summary.flow_path {
                match &path.levels {
                    Some(levels) => {
                        for level in levels {
                            lines.push(format!("Level {}:", level.depth));
                            for step in &level.steps {
                                lines.push(format!(
                                    "  {} -> {} via {}{}",
                                    step.from_node_id,
                                    step.to_node_id,
                                    step.edge_id,
                                    step.latency_ms.map(|l| format!(" ({:.1} ms)", l)).unwrap_or_default()
                                ));
                            }
                        }
                    }
                    None => {
                        for step in &path.steps {
                            lines.push(format!("  {} -> {} via {}", step.from_node_id, step.to_node_id, step.edge_id));
                        }
                    }
                }
                lines.push(String::new());
            }
        }
        SimulationStats::Failure(stats) => {
            section(&mut lines, "BLAST RADIUS");
            lines.push(format!("Failed Nodes: {}", stats.failed_count));
            lines.push(format!("Affected Nodes: {}", stats.affected_count));
            lines.push(format!("Broken Edges: {}", stats.broken_edge_count));
            lines.push(format!("Cascade Depth: {}", stats.cascade_depth));
            lines.push(format!("Impact: {:.1}%", stats.impact_percentage));
            lines.push(String::new());

            if let Some(radius) = &summary.blast_radius {
                for level in &radius.levels {
                    lines.push(format!("Level {}: {}", level.depth, join_or_none(&level.node_ids)));
                }
                if !radius.levels.is_empty() {
                    lines.push(String::new());
                }
            }
        }
        SimulationStats::Chaos(stats) => {
            section(&mut lines, "CHAOS SESSION");
            lines.push(format!("Rounds: {}", stats.rounds));
            lines.push(format!("Degraded Rounds: {}", stats.degraded_rounds));
            lines.push(format!("Failed Nodes: {}", stats.failed_count));
            lines.push(format!("Affected Nodes: {}", stats.affected_count));
            lines.push(format!("Severed Edges: {}", stats.severed_edge_count));
            lines.push(format!("Impact: {:.1}%", stats.impact_percentage));
            match stats.mtbf_ms {
                Some(mtbf) => lines.push(format!("MTBF: {:.0} ms", mtbf)),
                None => lines.push("MTBF: n/a".to_string()),
            }
            lines.push(String::new());

            if let Some(partition) = &summary.partition {
                lines.push(format!("Group A: {}", join_or_none(&partition.group_a)));
                lines.push(format!("Group B: {}", join_or_none(&partition.group_b)));
                lines.push(String::new());
            }

            if !summary.chaos_events.is_empty() {
                lines.push("Event Log:".to_string());
                for event in &summary.chaos_events {
                    lines.push(format!("  [{:>8} ms] {:<14} {}", event.timestamp, event.event_type.to_string(), event.message));
                }
                lines.push(String::new());
            }
        }
    }

    lines.push("=".repeat(80));
    lines.join("\n")
}
