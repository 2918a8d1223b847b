//! Graph snapshot types and adjacency helpers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A node of the architecture diagram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    /// Component kind as reported by the diagram (service, database, queue...)
    #[serde(rename = "type", default)]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Node {
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            parent_id: None,
            label: None,
        }
    }
}

/// A directed edge between two nodes, optionally annotated with protocol and latency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
}

impl Edge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            protocol: None,
            latency_ms: None,
        }
    }

    /// Builder-style protocol annotation
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    /// Builder-style latency annotation
    pub fn with_latency(mut self, latency_ms: f64) -> Self {
        self.latency_ms = Some(latency_ms);
        self
    }
}

/// A complete graph snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }
}

/// Read-only access to a graph snapshot.
///
/// Iteration order of `nodes()` and `edges()` is the input order; the engines
/// rely on it for deterministic tie-breaking.
pub trait GraphAccessor {
    fn nodes(&self) -> &[Node];

    fn edges(&self) -> &[Edge];

    fn node(&self, id: &str) -> Option<&Node> {
        self.nodes().iter().find(|n| n.id == id)
    }

    fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    fn node_count(&self) -> usize {
        self.nodes().len()
    }

    /// Builds an index of outgoing edges per source node.
    fn outgoing_index(&self) -> OutgoingIndex<'_> {
        OutgoingIndex::build(self.edges())
    }
}

impl GraphAccessor for Graph {
    fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    fn edges(&self) -> &[Edge] {
        &self.edges
    }
}

/// Outgoing edges grouped by source node id, preserving input edge order.
#[derive(Debug, Default)]
pub struct OutgoingIndex<'a> {
    by_source: HashMap<&'a str, Vec<&'a Edge>>,
}

impl<'a> OutgoingIndex<'a> {
    pub fn build(edges: &'a [Edge]) -> Self {
        let mut by_source: HashMap<&'a str, Vec<&'a Edge>> = HashMap::new();
        for edge in edges {
            by_source.entry(edge.source.as_str()).or_default().push(edge);
        }
        Self { by_source }
    }

    /// Outgoing edges of `node_id` in input order (empty if none)
    pub fn outgoing(&self, node_id: &str) -> &[&'a Edge] {
        self.by_source
            .get(node_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
