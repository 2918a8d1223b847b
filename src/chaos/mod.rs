//! Chaos mode.
//!
//! Repeated randomized failure or partition injection driven by a
//! cancellable recurring timer, with an append-only event log.

pub mod config;
pub mod scheduler;
pub mod session;
pub mod types;

pub use config::{ChaosConfig, ChaosSubMode};
pub use scheduler::{ManualScheduler, Scheduler, SystemScheduler, Tick, TimerToken};
pub use session::ChaosSession;
pub use types::{ChaosEvent, ChaosEventType, ChaosStatus};
