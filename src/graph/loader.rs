//! Graph snapshot loading.
//!
//! Snapshots exported by the diagram editor are accepted as JSON or YAML.
//! Every snapshot is validated before it is handed to an engine.

use std::fs;
use std::path::Path;

use color_eyre::eyre::{eyre, Result, WrapErr};
use log::info;

use super::types::Graph;
use crate::error::SimError;
use crate::utils::validation::validate_graph;

/// Serialization format of a graph snapshot file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Json,
    Yaml,
}

impl GraphFormat {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Some(Self::Json),
            Some("yaml") | Some("yml") => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// Parse and validate a graph snapshot from a string
pub fn parse_graph_str(content: &str, format: GraphFormat) -> Result<Graph> {
    let graph: Graph = match format {
        GraphFormat::Json => serde_json::from_str(content).wrap_err("Failed to parse JSON graph")?,
        GraphFormat::Yaml => serde_yaml::from_str(content).wrap_err("Failed to parse YAML graph")?,
    };

    validate_graph(&graph).map_err(SimError::InvalidGraph)?;

    Ok(graph)
}

/// Load a graph snapshot from a `.json`, `.yaml` or `.yml` file
pub fn load_graph(path: &Path) -> Result<Graph> {
    info!("Loading graph snapshot from: {:?}", path);

    let format = GraphFormat::from_path(path)
        .ok_or_else(|| eyre!("Unsupported graph file extension: {}", path.display()))?;

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read graph file '{}'", path.display()))?;

    let graph = parse_graph_str(&content, format)
        .with_context(|| format!("Invalid graph file '{}'", path.display()))?;

    info!("Loaded graph with {} nodes and {} edges", graph.nodes.len(), graph.edges.len());
    Ok(graph)
}
