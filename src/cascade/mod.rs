//! Failure propagation.
//!
//! - `blast_radius`: downstream cascade of a set of failed nodes
//! - `partition`: randomized two-way network partition
//! - `types`: result types shared with the controller and renderers

pub mod blast_radius;
pub mod partition;
pub mod types;

pub use blast_radius::compute_blast_radius;
pub use partition::compute_partition;
pub use types::{BlastRadius, CascadeLevel, PartitionResult};
