//! Per-mode simulation state.
//!
//! Each mode carries only its own fields. Switching modes replaces the whole
//! [`ModeState`], so results of one mode can never leak into another.

use serde::{Deserialize, Serialize};

use crate::cascade::BlastRadius;
use crate::chaos::ChaosSession;
use crate::flow::FlowPath;

/// Top-level simulation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationMode {
    #[default]
    Idle,
    Flow,
    Failure,
    Chaos,
}

impl std::fmt::Display for SimulationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulationMode::Idle => write!(f, "idle"),
            SimulationMode::Flow => write!(f, "flow"),
            SimulationMode::Failure => write!(f, "failure"),
            SimulationMode::Chaos => write!(f, "chaos"),
        }
    }
}

/// Direction of the animated traversal in round-trip flows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundTripPhase {
    #[default]
    Request,
    Response,
}

impl RoundTripPhase {
    pub fn toggled(self) -> Self {
        match self {
            RoundTripPhase::Request => RoundTripPhase::Response,
            RoundTripPhase::Response => RoundTripPhase::Request,
        }
    }
}

/// Overlay tag a renderer draws on a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeSimulationState {
    Source,
    Active,
    Failed,
    Affected,
    Protected,
}

/// Flow mode state
#[derive(Debug, Clone, Default)]
pub struct FlowState {
    pub source_node_id: Option<String>,
    pub path: Option<FlowPath>,
    pub current_step_index: usize,
    pub stepping_mode: bool,
    pub round_trip_enabled: bool,
    pub round_trip_phase: RoundTripPhase,
}

/// Failure mode state
#[derive(Debug, Clone, Default)]
pub struct FailureState {
    pub failed_node_ids: Vec<String>,
    pub protected_node_ids: Vec<String>,
    /// Recomputed after every change to the failed or protected sets
    pub blast_radius: BlastRadius,
}

/// State of the active mode
#[derive(Debug, Default)]
pub enum ModeState {
    #[default]
    Idle,
    Flow(FlowState),
    Failure(FailureState),
    Chaos(ChaosSession),
}

impl ModeState {
    /// Fresh state for `mode`
    pub fn fresh(mode: SimulationMode) -> Self {
        match mode {
            SimulationMode::Idle => ModeState::Idle,
            SimulationMode::Flow => ModeState::Flow(FlowState::default()),
            SimulationMode::Failure => ModeState::Failure(FailureState::default()),
            SimulationMode::Chaos => ModeState::Chaos(ChaosSession::new()),
        }
    }

    pub fn mode(&self) -> SimulationMode {
        match self {
            ModeState::Idle => SimulationMode::Idle,
            ModeState::Flow(_) => SimulationMode::Flow,
            ModeState::Failure(_) => SimulationMode::Failure,
            ModeState::Chaos(_) => SimulationMode::Chaos,
        }
    }
}
