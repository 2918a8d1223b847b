//! Simulation controller.
//!
//! The controller is the single owner of every simulation field. Renderers
//! read through its accessors; all mutation goes through the operations
//! below so the invariants of each mode hold. Nothing here is persisted or
//! recorded in the diagram's undo history.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::state::{FailureState, FlowState, ModeState, NodeSimulationState, RoundTripPhase, SimulationMode};
use crate::cascade::compute_blast_radius;
use crate::chaos::{ChaosConfig, ChaosEvent, ChaosSession, ManualScheduler, Scheduler, Tick};
use crate::error::SimError;
use crate::flow::{trace, FlowPath};
use crate::graph::{Graph, GraphAccessor};
use crate::stats::{chaos_stats, failure_stats, flow_stats, SimulationStats};

/// Node and edge ids a renderer highlights for the active flow
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightedPath {
    pub node_ids: BTreeSet<String>,
    pub edge_ids: BTreeSet<String>,
}

/// Owner of all simulation state over one graph snapshot
pub struct SimulationController<S: Scheduler = ManualScheduler> {
    graph: Graph,
    scheduler: S,
    rng: StdRng,
    chaos_config: ChaosConfig,
    speed: f64,
    running: bool,
    paused: bool,
    state: ModeState,
}

impl SimulationController<ManualScheduler> {
    /// Controller driven by a virtual clock
    pub fn manual(graph: Graph, seed: u64) -> Self {
        Self::with_seed(graph, ManualScheduler::new(), seed)
    }

    /// Advance the virtual clock and run every round that became due
    pub fn advance(&mut self, by: Duration) -> usize {
        self.scheduler.advance(by);
        self.pump()
    }
}

impl<S: Scheduler> SimulationController<S> {
    pub fn new(graph: Graph, scheduler: S) -> Self {
        Self::with_rng(graph, scheduler, StdRng::from_entropy())
    }

    /// Controller whose chaos rounds are reproducible for a given seed
    pub fn with_seed(graph: Graph, scheduler: S, seed: u64) -> Self {
        Self::with_rng(graph, scheduler, StdRng::seed_from_u64(seed))
    }

    fn with_rng(graph: Graph, scheduler: S, rng: StdRng) -> Self {
        Self {
            graph,
            scheduler,
            rng,
            chaos_config: ChaosConfig::default(),
            speed: 1.0,
            running: false,
            paused: false,
            state: ModeState::Idle,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn mode(&self) -> SimulationMode {
        self.state.mode()
    }

    pub fn state(&self) -> &ModeState {
        &self.state
    }

    pub fn chaos_config(&self) -> &ChaosConfig {
        &self.chaos_config
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn is_running(&self) -> bool {
        match &self.state {
            ModeState::Chaos(session) => session.is_running(),
            _ => self.running,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn flow_state(&self) -> Option<&FlowState> {
        match &self.state {
            ModeState::Flow(flow) => Some(flow),
            _ => None,
        }
    }

    pub fn flow_path(&self) -> Option<&FlowPath> {
        self.flow_state().and_then(|flow| flow.path.as_ref())
    }

    pub fn failure_state(&self) -> Option<&FailureState> {
        match &self.state {
            ModeState::Failure(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn chaos_session(&self) -> Option<&ChaosSession> {
        match &self.state {
            ModeState::Chaos(session) => Some(session),
            _ => None,
        }
    }

    /// Chaos event log, empty outside chaos mode
    pub fn chaos_events(&self) -> &[ChaosEvent] {
        self.chaos_session().map(ChaosSession::events).unwrap_or(&[])
    }

    // ------------------------------------------------------------------
    // Mode and playback transitions
    // ------------------------------------------------------------------

    /// Enter `mode`, discarding the results of every other mode.
    ///
    /// Re-entering the current mode keeps its state.
    pub fn set_mode(&mut self, mode: SimulationMode) {
        if self.state.mode() == mode {
            return;
        }
        self.cancel_chaos_timer();
        info!("Simulation mode: {} -> {}", self.state.mode(), mode);
        self.state = ModeState::fresh(mode);
        self.running = false;
        self.paused = false;
    }

    /// Replace the graph snapshot and discard current results
    pub fn set_graph(&mut self, graph: Graph) {
        self.cancel_chaos_timer();
        info!("Graph replaced: {} nodes, {} edges", graph.nodes.len(), graph.edges.len());
        self.graph = graph;
        self.state = ModeState::fresh(self.state.mode());
        self.running = false;
        self.paused = false;
    }

    /// Discard all results of the current mode, keeping the mode
    pub fn reset(&mut self) {
        self.cancel_chaos_timer();
        self.state = ModeState::fresh(self.state.mode());
        self.running = false;
        self.paused = false;
        debug!("Simulation state reset ({})", self.state.mode());
    }

    /// Stop playback while keeping mode and selection
    pub fn stop(&mut self) {
        self.running = false;
        self.paused = false;
        match &mut self.state {
            ModeState::Flow(flow) => {
                flow.current_step_index = 0;
                flow.round_trip_phase = RoundTripPhase::Request;
            }
            ModeState::Chaos(session) => {
                session.stop(&mut self.scheduler);
            }
            _ => {}
        }
    }

    /// Pause playback; in chaos mode this cancels the round timer
    pub fn pause(&mut self) -> bool {
        let paused = match &mut self.state {
            ModeState::Idle => false,
            ModeState::Chaos(session) => session.stop(&mut self.scheduler),
            _ => self.running && !self.paused,
        };
        if paused {
            self.paused = true;
        }
        paused
    }

    /// Resume from a pause; in chaos mode this restarts the round timer
    pub fn resume(&mut self) -> bool {
        if !self.paused {
            return false;
        }
        if let ModeState::Chaos(session) = &mut self.state {
            session.start(&mut self.scheduler, &self.chaos_config);
        }
        self.paused = false;
        true
    }

    /// Set the renderer's playback speed multiplier; engine output is unaffected
    pub fn set_speed(&mut self, speed: f64) -> Result<(), SimError> {
        if !speed.is_finite() || speed <= 0.0 {
            warn!("Rejected playback speed {}", speed);
            return Err(SimError::invalid_config(format!("speed must be a positive number, got {}", speed)));
        }
        self.speed = speed;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Flow mode
    // ------------------------------------------------------------------

    /// Trace from `source_node_id` and start a flow simulation.
    ///
    /// On failure the simulation does not start and no state changes.
    pub fn start_flow(&mut self, source_node_id: &str) -> Result<(), SimError> {
        let path = trace(&self.graph, source_node_id).map_err(|e| {
            warn!("Cannot start flow simulation: {}", e);
            e
        })?;
        self.start_flow_with_path(source_node_id, path)
    }

    /// Start a flow simulation over an already computed path
    pub fn start_flow_with_path(&mut self, source_node_id: &str, path: FlowPath) -> Result<(), SimError> {
        self.require_node(source_node_id)?;
        self.set_mode(SimulationMode::Flow);
        if let ModeState::Flow(flow) = &mut self.state {
            info!(
                "Flow simulation from {}: {} hop(s) over {} level(s)",
                source_node_id,
                path.steps.len(),
                path.levels.as_ref().map_or(0, Vec::len)
            );
            flow.source_node_id = Some(source_node_id.to_string());
            flow.path = Some(path);
            flow.current_step_index = 0;
            flow.round_trip_phase = RoundTripPhase::Request;
        }
        self.running = true;
        self.paused = false;
        Ok(())
    }

    /// Enable or disable manual stepping; only valid in flow mode
    pub fn set_stepping_mode(&mut self, enabled: bool) -> bool {
        match &mut self.state {
            ModeState::Flow(flow) => {
                flow.stepping_mode = enabled;
                true
            }
            _ => false,
        }
    }

    /// Advance one step; ignored unless stepping and not at the last step
    pub fn step_forward(&mut self) -> bool {
        let flow = match self.stepping_flow_mut() {
            Some(flow) => flow,
            None => return false,
        };
        let max = match flow.path.as_ref().and_then(FlowPath::max_step_index) {
            Some(max) => max,
            None => return false,
        };
        if flow.current_step_index >= max {
            return false;
        }
        flow.current_step_index += 1;
        true
    }

    /// Go back one step; ignored unless stepping and past the first step
    pub fn step_backward(&mut self) -> bool {
        let flow = match self.stepping_flow_mut() {
            Some(flow) => flow,
            None => return false,
        };
        if flow.current_step_index == 0 {
            return false;
        }
        flow.current_step_index -= 1;
        true
    }

    fn stepping_flow_mut(&mut self) -> Option<&mut FlowState> {
        match &mut self.state {
            ModeState::Flow(flow) if flow.stepping_mode => Some(flow),
            _ => None,
        }
    }

    pub fn set_round_trip_enabled(&mut self, enabled: bool) -> bool {
        match &mut self.state {
            ModeState::Flow(flow) => {
                flow.round_trip_enabled = enabled;
                if !enabled {
                    flow.round_trip_phase = RoundTripPhase::Request;
                }
                true
            }
            _ => false,
        }
    }

    /// Flip request/response; the step index is left untouched
    pub fn toggle_round_trip_phase(&mut self) -> Option<RoundTripPhase> {
        match &mut self.state {
            ModeState::Flow(flow) if flow.round_trip_enabled => {
                flow.round_trip_phase = flow.round_trip_phase.toggled();
                Some(flow.round_trip_phase)
            }
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Failure mode
    // ------------------------------------------------------------------

    /// Toggle a node's failed flag, entering failure mode if needed.
    ///
    /// Returns whether the node is now failed.
    pub fn toggle_failed_node(&mut self, node_id: &str) -> Result<bool, SimError> {
        self.require_node(node_id)?;
        self.set_mode(SimulationMode::Failure);
        let mut now_failed = false;
        if let ModeState::Failure(failure) = &mut self.state {
            now_failed = toggle_member(&mut failure.failed_node_ids, node_id);
        }
        self.recompute_blast_radius();
        Ok(now_failed)
    }

    /// Replace the failed set, entering failure mode if needed
    pub fn set_failed_nodes<T: AsRef<str>>(&mut self, node_ids: &[T]) -> Result<(), SimError> {
        for id in node_ids {
            self.require_node(id.as_ref())?;
        }
        self.set_mode(SimulationMode::Failure);
        if let ModeState::Failure(failure) = &mut self.state {
            failure.failed_node_ids.clear();
            for id in node_ids {
                if !failure.failed_node_ids.iter().any(|existing| existing == id.as_ref()) {
                    failure.failed_node_ids.push(id.as_ref().to_string());
                }
            }
        }
        self.recompute_blast_radius();
        Ok(())
    }

    /// Toggle protection of a node.
    ///
    /// In chaos mode this edits the chaos configuration and releases the node
    /// from accumulated failures; otherwise it edits the failure-mode set.
    pub fn toggle_protected_node(&mut self, node_id: &str) -> Result<bool, SimError> {
        self.require_node(node_id)?;

        if let ModeState::Chaos(session) = &mut self.state {
            let protected = &mut self.chaos_config.protected_node_ids;
            let now_protected = if protected.remove(node_id) {
                false
            } else {
                protected.insert(node_id.to_string());
                session.release_node(node_id);
                true
            };
            return Ok(now_protected);
        }

        self.set_mode(SimulationMode::Failure);
        let mut now_protected = false;
        if let ModeState::Failure(failure) = &mut self.state {
            now_protected = toggle_member(&mut failure.protected_node_ids, node_id);
        }
        self.recompute_blast_radius();
        Ok(now_protected)
    }

    /// Clear all failed nodes in failure mode
    pub fn clear_failures(&mut self) {
        if let ModeState::Failure(failure) = &mut self.state {
            failure.failed_node_ids.clear();
        }
        self.recompute_blast_radius();
    }

    fn recompute_blast_radius(&mut self) {
        if let ModeState::Failure(failure) = &mut self.state {
            failure.blast_radius = compute_blast_radius(
                &self.graph,
                failure.failed_node_ids.as_slice(),
                failure.protected_node_ids.as_slice(),
            );
            self.running = !failure.failed_node_ids.is_empty();
        }
    }

    // ------------------------------------------------------------------
    // Chaos mode
    // ------------------------------------------------------------------

    /// Replace the chaos configuration.
    ///
    /// An invalid configuration is rejected and the previous one retained.
    /// A running timer is rescheduled when the interval changes.
    pub fn set_chaos_config(&mut self, config: ChaosConfig) -> Result<(), SimError> {
        if let Err(e) = config.validate() {
            warn!("Rejected chaos configuration: {}", e);
            return Err(e);
        }
        let interval_changed = config.interval_ms != self.chaos_config.interval_ms;
        self.chaos_config = config;
        if interval_changed {
            if let ModeState::Chaos(session) = &mut self.state {
                session.reschedule(&mut self.scheduler, &self.chaos_config);
            }
        }
        Ok(())
    }

    /// Start the chaos timer, entering chaos mode if needed
    pub fn start_chaos(&mut self) -> bool {
        self.set_mode(SimulationMode::Chaos);
        self.paused = false;
        match &mut self.state {
            ModeState::Chaos(session) => session.start(&mut self.scheduler, &self.chaos_config),
            _ => false,
        }
    }

    pub fn stop_chaos(&mut self) -> bool {
        match &mut self.state {
            ModeState::Chaos(session) => {
                self.paused = false;
                session.stop(&mut self.scheduler)
            }
            _ => false,
        }
    }

    /// Clear accumulated chaos failures, keeping the round counter and log
    pub fn clear_chaos_failures(&mut self) {
        if let ModeState::Chaos(session) = &mut self.state {
            session.clear_failures();
        }
    }

    /// Run one chaos round immediately, outside the timer
    pub fn run_chaos_round(&mut self) -> Option<ChaosEvent> {
        let now = self.scheduler.now_ms();
        match &mut self.state {
            ModeState::Chaos(session) => Some(
                session
                    .run_round(&self.graph, &self.chaos_config, &mut self.rng, now)
                    .clone(),
            ),
            _ => None,
        }
    }

    /// Deliver one timer tick. Stale ticks are no-ops.
    pub fn on_timer(&mut self, tick: Tick) -> bool {
        match &mut self.state {
            ModeState::Chaos(session) => session.on_tick(tick, &self.graph, &self.chaos_config, &mut self.rng),
            _ => {
                debug!("Ignoring timer tick {:?} outside chaos mode", tick.token);
                false
            }
        }
    }

    /// Poll the scheduler and deliver every due tick; returns rounds executed
    pub fn pump(&mut self) -> usize {
        let ticks = self.scheduler.poll_due();
        let mut executed = 0;
        for tick in ticks {
            if self.on_timer(tick) {
                executed += 1;
            }
        }
        executed
    }

    fn cancel_chaos_timer(&mut self) {
        if let ModeState::Chaos(session) = &mut self.state {
            session.stop(&mut self.scheduler);
        }
    }

    // ------------------------------------------------------------------
    // Renderer outputs
    // ------------------------------------------------------------------

    /// Nodes and edges of the active flow; while stepping, only levels up to
    /// the current step
    pub fn highlighted_path(&self) -> HighlightedPath {
        let mut highlighted = HighlightedPath::default();
        let flow = match &self.state {
            ModeState::Flow(flow) => flow,
            _ => return highlighted,
        };
        let (source, path) = match (&flow.source_node_id, &flow.path) {
            (Some(source), Some(path)) => (source, path),
            _ => return highlighted,
        };

        highlighted.node_ids.insert(source.clone());
        let visible = |len: usize| {
            if flow.stepping_mode {
                (flow.current_step_index + 1).min(len)
            } else {
                len
            }
        };

        match &path.levels {
            Some(levels) => {
                for step in levels.iter().take(visible(levels.len())).flat_map(|l| l.steps.iter()) {
                    highlighted.node_ids.insert(step.to_node_id.clone());
                    highlighted.edge_ids.insert(step.edge_id.clone());
                }
            }
            None => {
                for step in path.steps.iter().take(visible(path.steps.len())) {
                    highlighted.node_ids.insert(step.from_node_id.clone());
                    highlighted.node_ids.insert(step.to_node_id.clone());
                    highlighted.edge_ids.insert(step.edge_id.clone());
                }
            }
        }
        highlighted
    }

    /// Overlay tag of a single node, `None` when it has no overlay
    pub fn node_state(&self, node_id: &str) -> Option<NodeSimulationState> {
        let highlighted = match &self.state {
            ModeState::Flow(_) => self.highlighted_path(),
            _ => HighlightedPath::default(),
        };
        self.state_of(node_id, &highlighted)
    }

    /// Overlay tags of every node that has one
    pub fn node_states(&self) -> BTreeMap<String, NodeSimulationState> {
        let highlighted = self.highlighted_path();
        self.graph
            .nodes
            .iter()
            .filter_map(|node| self.state_of(&node.id, &highlighted).map(|state| (node.id.clone(), state)))
            .collect()
    }

    fn state_of(&self, node_id: &str, highlighted: &HighlightedPath) -> Option<NodeSimulationState> {
        match &self.state {
            ModeState::Idle => None,
            ModeState::Flow(flow) => {
                if flow.source_node_id.as_deref() == Some(node_id) {
                    Some(NodeSimulationState::Source)
                } else if highlighted.node_ids.contains(node_id) {
                    Some(NodeSimulationState::Active)
                } else {
                    None
                }
            }
            ModeState::Failure(failure) => {
                if failure.protected_node_ids.iter().any(|id| id == node_id) {
                    Some(NodeSimulationState::Protected)
                } else if failure.failed_node_ids.iter().any(|id| id == node_id) {
                    Some(NodeSimulationState::Failed)
                } else if failure.blast_radius.affected_node_ids.iter().any(|id| id == node_id) {
                    Some(NodeSimulationState::Affected)
                } else {
                    None
                }
            }
            ModeState::Chaos(session) => {
                if self.chaos_config.is_protected(node_id) {
                    Some(NodeSimulationState::Protected)
                } else if session.failed_node_ids().contains(node_id) {
                    Some(NodeSimulationState::Failed)
                } else if session.affected_node_ids().contains(node_id) {
                    Some(NodeSimulationState::Affected)
                } else {
                    None
                }
            }
        }
    }

    /// Edges broken by failed or affected nodes
    pub fn broken_edge_ids(&self) -> Vec<String> {
        match &self.state {
            ModeState::Failure(failure) => failure.blast_radius.broken_edge_ids.clone(),
            ModeState::Chaos(session) => session.broken_edge_ids().iter().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Edges cut by the current network partition
    pub fn severed_edge_ids(&self) -> Vec<String> {
        match &self.state {
            ModeState::Chaos(session) => session.severed_edge_ids().to_vec(),
            _ => Vec::new(),
        }
    }

    /// Statistics for the current mode, recomputed on every call
    pub fn stats(&self) -> SimulationStats {
        let total_nodes = self.graph.node_count();
        match &self.state {
            ModeState::Idle => SimulationStats::Idle,
            ModeState::Flow(flow) => SimulationStats::Flow(flow.path.as_ref().map(flow_stats).unwrap_or_default()),
            ModeState::Failure(failure) => {
                let failed = failure
                    .failed_node_ids
                    .iter()
                    .filter(|id| !failure.protected_node_ids.contains(id))
                    .count();
                SimulationStats::Failure(failure_stats(failed, &failure.blast_radius, total_nodes))
            }
            ModeState::Chaos(session) => SimulationStats::Chaos(chaos_stats(session, total_nodes)),
        }
    }

    fn require_node(&self, node_id: &str) -> Result<(), SimError> {
        if self.graph.contains_node(node_id) {
            Ok(())
        } else {
            warn!("Unknown node {}", node_id);
            Err(SimError::node_not_found(node_id))
        }
    }
}

impl<S: Scheduler> Drop for SimulationController<S> {
    fn drop(&mut self) {
        self.cancel_chaos_timer();
    }
}

/// Add `id` if absent, remove it if present; returns whether it is now a member
fn toggle_member(ids: &mut Vec<String>, id: &str) -> bool {
    match ids.iter().position(|existing| existing == id) {
        Some(pos) => {
            ids.remove(pos);
            false
        }
        None => {
            ids.push(id.to_string());
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chaos::{ChaosEventType, ChaosSubMode};
    use crate::graph::{Edge, Node};

    fn chain() -> Graph {
        Graph::new(
            ["a", "b", "c", "d"].iter().map(|id| Node::new(*id, "service")).collect(),
            vec![
                Edge::new("ab", "a", "b").with_latency(5.0),
                Edge::new("bc", "b", "c").with_latency(15.0),
                Edge::new("cd", "c", "d"),
            ],
        )
    }

    fn always_fail() -> ChaosConfig {
        ChaosConfig {
            interval_ms: 1000,
            max_failures_per_round: 1,
            failure_probability: 1.0,
            ..ChaosConfig::default()
        }
    }

    #[test]
    fn test_start_flow_unknown_source_does_not_start() {
        let mut controller = SimulationController::manual(chain(), 1);
        assert_eq!(controller.start_flow("ghost"), Err(SimError::node_not_found("ghost")));
        assert_eq!(controller.mode(), SimulationMode::Idle);
        assert!(!controller.is_running());
    }

    #[test]
    fn test_start_flow_sets_running() {
        let mut controller = SimulationController::manual(chain(), 1);
        controller.start_flow("a").unwrap();
        assert_eq!(controller.mode(), SimulationMode::Flow);
        assert!(controller.is_running());
        assert_eq!(controller.flow_state().unwrap().current_step_index, 0);
        assert_eq!(controller.flow_path().unwrap().node_ids, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_step_forward_requires_stepping_mode() {
        let mut controller = SimulationController::manual(chain(), 1);
        controller.start_flow("a").unwrap();
        assert!(!controller.step_forward());
        assert_eq!(controller.flow_state().unwrap().current_step_index, 0);
    }

    #[test]
    fn test_stepping_is_clamped() {
        let mut controller = SimulationController::manual(chain(), 1);
        controller.start_flow("a").unwrap();
        controller.set_stepping_mode(true);

        assert!(!controller.step_backward());
        assert!(controller.step_forward());
        assert!(controller.step_forward());
        // three levels: index 2 is the last
        assert!(!controller.step_forward());
        assert_eq!(controller.flow_state().unwrap().current_step_index, 2);
        assert!(controller.step_backward());
        assert_eq!(controller.flow_state().unwrap().current_step_index, 1);
    }

    #[test]
    fn test_stepping_limits_highlight() {
        let mut controller = SimulationController::manual(chain(), 1);
        controller.start_flow("a").unwrap();
        controller.set_stepping_mode(true);

        let highlighted = controller.highlighted_path();
        assert_eq!(highlighted.node_ids.len(), 2);
        assert!(highlighted.edge_ids.contains("ab"));
        assert_eq!(controller.node_state("a"), Some(NodeSimulationState::Source));
        assert_eq!(controller.node_state("b"), Some(NodeSimulationState::Active));
        assert_eq!(controller.node_state("c"), None);

        controller.set_stepping_mode(false);
        assert_eq!(controller.highlighted_path().node_ids.len(), 4);
    }

    #[test]
    fn test_flat_path_steps_when_levels_absent() {
        let mut controller = SimulationController::manual(chain(), 1);
        let mut path = trace(controller.graph(), "a").unwrap();
        path.levels = None;
        controller.start_flow_with_path("a", path).unwrap();
        controller.set_stepping_mode(true);
        assert!(controller.step_forward());
        assert!(controller.step_forward());
        assert!(!controller.step_forward());
    }

    #[test]
    fn test_round_trip_phase_independent_of_step() {
        let mut controller = SimulationController::manual(chain(), 1);
        controller.start_flow("a").unwrap();
        assert_eq!(controller.toggle_round_trip_phase(), None);

        controller.set_round_trip_enabled(true);
        controller.set_stepping_mode(true);
        controller.step_forward();
        assert_eq!(controller.toggle_round_trip_phase(), Some(RoundTripPhase::Response));
        assert_eq!(controller.flow_state().unwrap().current_step_index, 1);
        assert_eq!(controller.toggle_round_trip_phase(), Some(RoundTripPhase::Request));
    }

    #[test]
    fn test_stop_keeps_mode_and_source() {
        let mut controller = SimulationController::manual(chain(), 1);
        controller.start_flow("a").unwrap();
        controller.set_stepping_mode(true);
        controller.step_forward();
        controller.stop();

        assert!(!controller.is_running());
        assert_eq!(controller.mode(), SimulationMode::Flow);
        let flow = controller.flow_state().unwrap();
        assert_eq!(flow.source_node_id.as_deref(), Some("a"));
        assert_eq!(flow.current_step_index, 0);
    }

    #[test]
    fn test_pause_and_resume_flow() {
        let mut controller = SimulationController::manual(chain(), 1);
        assert!(!controller.pause());
        controller.start_flow("a").unwrap();
        assert!(controller.pause());
        assert!(controller.is_paused());
        assert!(!controller.pause());
        assert!(controller.resume());
        assert!(!controller.is_paused());
    }

    #[test]
    fn test_set_speed_validation() {
        let mut controller = SimulationController::manual(chain(), 1);
        assert!(controller.set_speed(2.0).is_ok());
        assert!(controller.set_speed(0.0).is_err());
        assert!(controller.set_speed(f64::NAN).is_err());
        assert_eq!(controller.speed(), 2.0);
    }

    #[test]
    fn test_mode_switch_discards_other_results() {
        let mut controller = SimulationController::manual(chain(), 1);
        controller.start_flow("a").unwrap();
        controller.toggle_failed_node("b").unwrap();

        assert_eq!(controller.mode(), SimulationMode::Failure);
        assert!(controller.flow_state().is_none());
        assert!(controller.highlighted_path().node_ids.is_empty());

        controller.set_mode(SimulationMode::Flow);
        assert!(controller.failure_state().is_none());
        assert!(controller.flow_path().is_none());
        assert!(controller.node_states().is_empty());
    }

    #[test]
    fn test_failure_mode_states() {
        let mut controller = SimulationController::manual(chain(), 1);
        assert!(controller.toggle_failed_node("b").unwrap());
        controller.toggle_protected_node("d").unwrap();

        let states = controller.node_states();
        assert_eq!(states.get("a"), None);
        assert_eq!(states.get("b"), Some(&NodeSimulationState::Failed));
        assert_eq!(states.get("c"), Some(&NodeSimulationState::Affected));
        assert_eq!(states.get("d"), Some(&NodeSimulationState::Protected));
        assert_eq!(controller.broken_edge_ids(), vec!["bc", "cd"]);

        match controller.stats() {
            SimulationStats::Failure(stats) => {
                assert_eq!(stats.failed_count, 1);
                assert_eq!(stats.affected_count, 1);
                assert_eq!(stats.impact_percentage, 25.0);
            }
            other => panic!("unexpected stats {:?}", other),
        }

        assert!(!controller.toggle_failed_node("b").unwrap());
        assert!(!controller.is_running());
        assert!(controller.broken_edge_ids().is_empty());
    }

    #[test]
    fn test_set_failed_nodes_rejects_unknown() {
        let mut controller = SimulationController::manual(chain(), 1);
        let err = controller.set_failed_nodes(&["a", "ghost"]).unwrap_err();
        assert_eq!(err, SimError::node_not_found("ghost"));
        assert_eq!(controller.mode(), SimulationMode::Idle);

        controller.set_failed_nodes(&["c", "c"]).unwrap();
        assert_eq!(controller.failure_state().unwrap().failed_node_ids, vec!["c"]);
        controller.clear_failures();
        assert!(controller.failure_state().unwrap().blast_radius.is_empty());
    }

    #[test]
    fn test_invalid_chaos_config_keeps_previous() {
        let mut controller = SimulationController::manual(chain(), 1);
        controller.set_chaos_config(always_fail()).unwrap();

        let bad = ChaosConfig {
            failure_probability: 1.5,
            ..always_fail()
        };
        assert!(matches!(controller.set_chaos_config(bad), Err(SimError::InvalidConfig(_))));
        assert_eq!(controller.chaos_config(), &always_fail());
    }

    #[test]
    fn test_chaos_rounds_on_timer() {
        let mut controller = SimulationController::manual(chain(), 42);
        controller.set_chaos_config(always_fail()).unwrap();
        assert!(controller.start_chaos());
        assert!(controller.is_running());

        assert_eq!(controller.advance(Duration::from_millis(999)), 0);
        assert_eq!(controller.advance(Duration::from_millis(2001)), 3);

        let rounds: Vec<u32> = controller.chaos_events().iter().map(|e| e.round).collect();
        assert_eq!(rounds, vec![1, 2, 3]);
        let timestamps: Vec<u64> = controller.chaos_events().iter().map(|e| e.timestamp).collect();
        assert_eq!(timestamps, vec![1000, 2000, 3000]);

        match controller.stats() {
            SimulationStats::Chaos(stats) => {
                assert_eq!(stats.rounds, 3);
                assert_eq!(stats.failed_count, 3);
                assert_eq!(stats.mtbf_ms, Some(1000.0));
            }
            other => panic!("unexpected stats {:?}", other),
        }
    }

    #[test]
    fn test_stop_chaos_cancels_timer_and_stale_ticks() {
        let mut controller = SimulationController::manual(chain(), 42);
        controller.set_chaos_config(always_fail()).unwrap();
        controller.start_chaos();

        controller.scheduler_mut().advance(Duration::from_millis(1000));
        let pending = controller.scheduler_mut().poll_due();
        assert!(controller.stop_chaos());
        assert_eq!(controller.scheduler().active_timers(), 0);

        for tick in pending {
            assert!(!controller.on_timer(tick));
        }
        assert_eq!(controller.advance(Duration::from_secs(10)), 0);
        assert!(controller.chaos_events().is_empty());
    }

    #[test]
    fn test_mode_change_and_reset_cancel_chaos() {
        let mut controller = SimulationController::manual(chain(), 42);
        controller.start_chaos();
        controller.set_mode(SimulationMode::Flow);
        assert_eq!(controller.scheduler().active_timers(), 0);

        controller.start_chaos();
        controller.advance(Duration::from_millis(2000));
        controller.reset();
        assert_eq!(controller.scheduler().active_timers(), 0);
        assert_eq!(controller.mode(), SimulationMode::Chaos);
        assert!(controller.chaos_events().is_empty());

        // a new session numbers rounds from 1 again
        controller.start_chaos();
        controller.advance(Duration::from_millis(2000));
        assert_eq!(controller.chaos_events()[0].round, 1);
    }

    #[test]
    fn test_interval_change_reschedules() {
        let mut controller = SimulationController::manual(chain(), 3);
        controller.set_chaos_config(always_fail()).unwrap();
        controller.start_chaos();
        controller
            .set_chaos_config(ChaosConfig {
                interval_ms: 100,
                ..always_fail()
            })
            .unwrap();
        assert_eq!(controller.scheduler().active_timers(), 1);
        assert_eq!(controller.advance(Duration::from_millis(300)), 3);
    }

    #[test]
    fn test_pause_resume_chaos() {
        let mut controller = SimulationController::manual(chain(), 3);
        controller.set_chaos_config(always_fail()).unwrap();
        controller.start_chaos();
        assert!(controller.pause());
        assert_eq!(controller.advance(Duration::from_secs(5)), 0);
        assert!(controller.resume());
        assert!(controller.is_running());
        assert_eq!(controller.advance(Duration::from_millis(1000)), 1);
    }

    #[test]
    fn test_protecting_in_chaos_releases_node() {
        let mut controller = SimulationController::manual(chain(), 3);
        controller.set_chaos_config(always_fail()).unwrap();
        controller.start_chaos();
        controller.run_chaos_round();
        assert_eq!(controller.node_state("a"), Some(NodeSimulationState::Failed));

        assert!(controller.toggle_protected_node("a").unwrap());
        assert_eq!(controller.node_state("a"), Some(NodeSimulationState::Protected));
        assert!(!controller.chaos_session().unwrap().failed_node_ids().contains("a"));
        assert!(controller.chaos_config().is_protected("a"));
    }

    #[test]
    fn test_partition_round_reports_severed_edges() {
        let mut controller = SimulationController::manual(chain(), 8);
        controller
            .set_chaos_config(ChaosConfig {
                sub_mode: ChaosSubMode::NetworkPartition,
                ..ChaosConfig::default()
            })
            .unwrap();
        controller.start_chaos();
        let event = controller.run_chaos_round().unwrap();
        assert_eq!(event.event_type, ChaosEventType::Partition);
        assert_eq!(controller.severed_edge_ids().len(), 1);

        controller.clear_chaos_failures();
        assert!(controller.severed_edge_ids().is_empty());
        assert_eq!(controller.chaos_session().unwrap().round(), 1);
    }

    #[test]
    fn test_set_graph_discards_results() {
        let mut controller = SimulationController::manual(chain(), 1);
        controller.start_flow("a").unwrap();
        controller.set_graph(Graph::default());
        assert_eq!(controller.mode(), SimulationMode::Flow);
        assert!(controller.flow_path().is_none());
        assert_eq!(controller.stats(), SimulationStats::Flow(Default::default()));
    }
}
