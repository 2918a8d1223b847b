//! # Archsim - Request-flow and failure simulation over architecture diagrams
//!
//! This library simulates behavior over a directed graph of architecture
//! components: how a request fans out from a source node, how failures
//! cascade downstream, and how repeated randomized faults degrade the
//! system over time.
//!
//! ## Key Features
//!
//! - **Flow Tracing**: Branch-aware breadth-first request paths with per-hop latency
//! - **Blast Radius**: Level-by-level downstream cascade of failed nodes, honoring protected nodes
//! - **Chaos Mode**: Timer-driven random failures or network partitions with an event log
//! - **Playback**: Stepping, round-trip phases and speed control for renderers
//! - **Reproducible**: Seeded randomness and a virtual-clock scheduler
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - `graph`: Graph snapshot types, the read-only `GraphAccessor` and file loading
//! - `flow`: Flow tracer
//! - `cascade`: Blast radius and network partition computation
//! - `chaos`: Chaos configuration, cancellable timers and round logic
//! - `playback`: `SimulationController`, the single owner of simulation state
//! - `stats`: Derived statistics for each mode
//! - `report`: JSON and text reports of a run
//! - `config`, `config_loader`: YAML run configuration
//! - `utils`: Graph and configuration validation
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use archsim::graph::load_graph;
//! use archsim::playback::SimulationController;
//! use std::path::Path;
//!
//! let graph = load_graph(Path::new("architecture.json"))?;
//! let mut controller = SimulationController::manual(graph, 42);
//!
//! controller.toggle_failed_node("database")?;
//! println!("{:?}", controller.stats());
//! # Ok::<(), color_eyre::Report>(())
//! ```
//!
//! ## Error Handling
//!
//! Engine operations return [`error::SimError`]. File-facing functions
//! return `color_eyre::Result` with context attached.

pub mod cascade;
pub mod chaos;
pub mod config;
pub mod config_loader;
pub mod error;
pub mod flow;
pub mod graph;
pub mod playback;
pub mod report;
pub mod stats;
pub mod utils;

pub use error::SimError;
