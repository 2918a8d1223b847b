//! Chaos session state machine.
//!
//! A session is `Stopped` or `Running`. While running it owns exactly one
//! live timer; each tick of that timer executes one complete round. Ticks
//! carrying any other token are stale and ignored. Random-failure effects
//! accumulate across rounds until cleared; a partition round replaces the
//! previous cut.

use std::collections::BTreeSet;

use log::{debug, info, warn};
use rand::Rng;

use super::config::{ChaosConfig, ChaosSubMode};
use super::scheduler::{Scheduler, Tick, TimerToken};
use super::types::{ChaosEvent, ChaosEventType, ChaosStatus};
use crate::cascade::{compute_blast_radius, compute_partition, PartitionResult};
use crate::error::SimError;
use crate::graph::GraphAccessor;

/// Outcome of a successful round, before it is logged
struct RoundOutcome {
    event_type: ChaosEventType,
    message: String,
    node_ids: Vec<String>,
    edge_ids: Vec<String>,
    affected_count: usize,
}

/// State of one chaos session
#[derive(Debug, Default)]
pub struct ChaosSession {
    status: ChaosStatus,
    timer: Option<TimerToken>,
    round_in_progress: bool,
    round: u32,
    events: Vec<ChaosEvent>,
    failed_node_ids: BTreeSet<String>,
    affected_node_ids: BTreeSet<String>,
    broken_edge_ids: BTreeSet<String>,
    severed_edge_ids: Vec<String>,
    partition: Option<PartitionResult>,
}

impl ChaosSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> ChaosStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == ChaosStatus::Running
    }

    /// Number of rounds executed in this session
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn events(&self) -> &[ChaosEvent] {
        &self.events
    }

    pub fn failed_node_ids(&self) -> &BTreeSet<String> {
        &self.failed_node_ids
    }

    pub fn affected_node_ids(&self) -> &BTreeSet<String> {
        &self.affected_node_ids
    }

    pub fn broken_edge_ids(&self) -> &BTreeSet<String> {
        &self.broken_edge_ids
    }

    /// Edges cut by the most recent partition round
    pub fn severed_edge_ids(&self) -> &[String] {
        &self.severed_edge_ids
    }

    pub fn partition(&self) -> Option<&PartitionResult> {
        self.partition.as_ref()
    }

    /// The live timer, if running
    pub fn timer(&self) -> Option<TimerToken> {
        self.timer
    }

    /// Start the round timer. Returns false if already running.
    pub fn start<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S, config: &ChaosConfig) -> bool {
        if self.is_running() {
            return false;
        }
        self.timer = Some(scheduler.schedule(config.interval()));
        self.status = ChaosStatus::Running;
        info!("Chaos started: {} every {} ms", config.sub_mode, config.interval_ms);
        true
    }

    /// Cancel the round timer. Returns false if it was not running.
    pub fn stop<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) -> bool {
        if let Some(token) = self.timer.take() {
            scheduler.cancel(token);
        }
        if !self.is_running() {
            return false;
        }
        self.status = ChaosStatus::Stopped;
        info!("Chaos stopped after {} round(s)", self.round);
        true
    }

    /// Replace the live timer after an interval change
    pub fn reschedule<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S, config: &ChaosConfig) {
        if let Some(old) = self.timer.take() {
            scheduler.cancel(old);
            self.timer = Some(scheduler.schedule(config.interval()));
            debug!("Chaos timer rescheduled to {} ms", config.interval_ms);
        }
    }

    /// Handle one timer tick. Returns true if a round was executed.
    ///
    /// Stale ticks (stopped session, cancelled or replaced timer) and ticks
    /// arriving while a round is still executing are no-ops.
    pub fn on_tick<G, R>(&mut self, tick: Tick, graph: &G, config: &ChaosConfig, rng: &mut R) -> bool
    where
        G: GraphAccessor + ?Sized,
        R: Rng + ?Sized,
    {
        if !self.is_running() || self.timer != Some(tick.token) {
            debug!("Ignoring stale chaos tick {:?}", tick.token);
            return false;
        }
        if self.round_in_progress {
            warn!("Chaos tick at {} ms skipped: previous round still in progress", tick.due_ms);
            return false;
        }

        self.round_in_progress = true;
        self.run_round(graph, config, rng, tick.due_ms);
        self.round_in_progress = false;
        true
    }

    /// Execute exactly one round and log it.
    ///
    /// A failing round is logged as a `degraded` event instead of
    /// propagating, so the session keeps going on the next tick.
    pub fn run_round<G, R>(&mut self, graph: &G, config: &ChaosConfig, rng: &mut R, timestamp: u64) -> &ChaosEvent
    where
        G: GraphAccessor + ?Sized,
        R: Rng + ?Sized,
    {
        self.round += 1;
        let round = self.round;

        let outcome = config.validate().and_then(|()| match config.sub_mode {
            ChaosSubMode::RandomFailure => Ok(self.random_failure_round(graph, config, rng, round)),
            ChaosSubMode::NetworkPartition => self.partition_round(graph, rng, round),
        });

        let event = match outcome {
            Ok(outcome) => ChaosEvent {
                round,
                timestamp,
                event_type: outcome.event_type,
                message: outcome.message,
                node_ids: outcome.node_ids,
                edge_ids: Some(outcome.edge_ids),
                affected_count: outcome.affected_count,
            },
            Err(e) => {
                warn!("Chaos round {} degraded: {}", round, e);
                ChaosEvent {
                    round,
                    timestamp,
                    event_type: ChaosEventType::Degraded,
                    message: format!("Round {}: {}", round, e),
                    node_ids: Vec::new(),
                    edge_ids: None,
                    affected_count: 0,
                }
            }
        };

        debug!("Chaos round {}: {}", round, event.message);
        self.events.push(event);
        &self.events[self.events.len() - 1]
    }

    fn random_failure_round<G, R>(&mut self, graph: &G, config: &ChaosConfig, rng: &mut R, round: u32) -> RoundOutcome
    where
        G: GraphAccessor + ?Sized,
        R: Rng + ?Sized,
    {
        // nodes protected since an earlier round are released first
        self.failed_node_ids.retain(|id| !config.is_protected(id));
        self.affected_node_ids.retain(|id| !config.is_protected(id));

        let mut selected: Vec<String> = Vec::new();
        for node in graph.nodes() {
            if config.is_protected(&node.id) || self.failed_node_ids.contains(&node.id) {
                continue;
            }
            if rng.gen_bool(config.failure_probability) {
                selected.push(node.id.clone());
            }
        }
        selected.truncate(config.max_failures_per_round);

        // nodes failed in earlier rounds stop propagation like protected ones
        let mut halted: Vec<&str> = config.protected_node_ids.iter().map(String::as_str).collect();
        halted.extend(self.failed_node_ids.iter().map(String::as_str));
        let radius = compute_blast_radius(graph, selected.as_slice(), halted.as_slice());

        for id in &selected {
            self.affected_node_ids.remove(id);
            self.failed_node_ids.insert(id.clone());
        }
        for id in &radius.affected_node_ids {
            if !self.failed_node_ids.contains(id) {
                self.affected_node_ids.insert(id.clone());
            }
        }
        self.broken_edge_ids.extend(radius.broken_edge_ids.iter().cloned());

        let message = if selected.is_empty() {
            format!("Round {}: no nodes failed", round)
        } else {
            format!(
                "Round {}: {} node(s) failed ({}), {} downstream affected",
                round,
                selected.len(),
                selected.join(", "),
                radius.affected_node_ids.len()
            )
        };

        RoundOutcome {
            event_type: ChaosEventType::NodeFailure,
            message,
            node_ids: selected,
            edge_ids: radius.broken_edge_ids,
            affected_count: radius.affected_node_ids.len(),
        }
    }

    fn partition_round<G, R>(&mut self, graph: &G, rng: &mut R, round: u32) -> Result<RoundOutcome, SimError>
    where
        G: GraphAccessor + ?Sized,
        R: Rng + ?Sized,
    {
        let partition = compute_partition(graph, rng)?;

        let message = format!(
            "Round {}: network split into {} and {} node(s), {} edge(s) severed",
            round,
            partition.group_a.len(),
            partition.group_b.len(),
            partition.severed_edge_ids.len()
        );
        let outcome = RoundOutcome {
            event_type: ChaosEventType::Partition,
            message,
            node_ids: partition.group_a.clone(),
            edge_ids: partition.severed_edge_ids.clone(),
            affected_count: partition.minority_size(),
        };

        self.severed_edge_ids = partition.severed_edge_ids.clone();
        self.partition = Some(partition);
        Ok(outcome)
    }

    /// Remove a single node from the accumulated failure sets
    pub fn release_node(&mut self, node_id: &str) {
        self.failed_node_ids.remove(node_id);
        self.affected_node_ids.remove(node_id);
    }

    /// Drop accumulated failures and the current cut; keeps the round counter and log.
    pub fn clear_failures(&mut self) {
        self.failed_node_ids.clear();
        self.affected_node_ids.clear();
        self.broken_edge_ids.clear();
        self.severed_edge_ids.clear();
        self.partition = None;
    }
}
