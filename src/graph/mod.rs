//! Read-only graph snapshot.
//!
//! The diagram collaborator supplies nodes and directed edges; every engine
//! in this crate reads them through [`GraphAccessor`] and never mutates them.

pub mod loader;
pub mod types;

pub use loader::{load_graph, parse_graph_str, GraphFormat};
pub use types::{Edge, Graph, GraphAccessor, Node, OutgoingIndex};
