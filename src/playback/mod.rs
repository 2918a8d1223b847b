//! Simulation playback.
//!
//! [`SimulationController`] owns the active mode's state and exposes the
//! transitions and renderer outputs; [`state`] holds the per-mode data.

pub mod controller;
pub mod state;

pub use controller::{HighlightedPath, SimulationController};
pub use state::{FailureState, FlowState, ModeState, NodeSimulationState, RoundTripPhase, SimulationMode};
