//! Randomized network partition.
//!
//! The graph is viewed as undirected. A disconnected graph is split along
//! its components: one random component becomes group A and nothing is
//! severed. A connected graph gets a BFS spanning tree grown from a random
//! root; one random tree edge is removed, splitting the tree into two sides
//! that stay internally connected through tree edges. Every graph edge
//! crossing the two sides is severed.

use std::collections::{HashMap, HashSet, VecDeque};

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

use super::types::PartitionResult;
use crate::error::SimError;
use crate::graph::GraphAccessor;

/// Split the graph into two non-empty groups.
///
/// Fails with [`SimError::InsufficientNodes`] for graphs with fewer than two
/// nodes. Group A is always connected internally; group B is too unless the
/// graph has three or more components, where no two-way split can keep both
/// sides connected.
pub fn compute_partition<G, R>(graph: &G, rng: &mut R) -> Result<PartitionResult, SimError>
where
    G: GraphAccessor + ?Sized,
    R: Rng + ?Sized,
{
    let nodes = graph.nodes();
    if nodes.len() < 2 {
        return Err(SimError::InsufficientNodes {
            required: 2,
            available: nodes.len(),
        });
    }

    let mut neighbors: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in graph.edges() {
        if edge.source == edge.target {
            continue;
        }
        neighbors.entry(edge.source.as_str()).or_default().push(edge.target.as_str());
        neighbors.entry(edge.target.as_str()).or_default().push(edge.source.as_str());
    }

    let components = connected_components(graph, &neighbors);
    let group_a: HashSet<&str> = if components.len() >= 2 {
        // whole components split cleanly without severing anything
        components[rng.gen_range(0..components.len())].iter().copied().collect()
    } else {
        spanning_tree_cut(nodes[rng.gen_range(0..nodes.len())].id.as_str(), &neighbors, rng)
    };

    let mut result = PartitionResult::default();
    for node in nodes {
        if group_a.contains(node.id.as_str()) {
            result.group_a.push(node.id.clone());
        } else {
            result.group_b.push(node.id.clone());
        }
    }
    for edge in graph.edges() {
        let source_in_a = group_a.contains(edge.source.as_str());
        let target_in_a = group_a.contains(edge.target.as_str());
        if source_in_a != target_in_a {
            result.severed_edge_ids.push(edge.id.clone());
        }
    }

    debug!(
        "Partition: {} | {} nodes, {} edge(s) severed",
        result.group_a.len(),
        result.group_b.len(),
        result.severed_edge_ids.len()
    );

    Ok(result)
}

/// Undirected connected components, in graph node order
fn connected_components<'a, G>(graph: &'a G, neighbors: &HashMap<&'a str, Vec<&'a str>>) -> Vec<Vec<&'a str>>
where
    G: GraphAccessor + ?Sized,
{
    let mut visited: HashSet<&str> = HashSet::new();
    let mut components = Vec::new();

    for node in graph.nodes() {
        let start = node.id.as_str();
        if !visited.insert(start) {
            continue;
        }
        let mut component = Vec::new();
        let mut queue: VecDeque<&str> = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            component.push(current);
            for &next in neighbors.get(current).map(Vec::as_slice).unwrap_or(&[]) {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        components.push(component);
    }

    components
}

/// Grow a shuffled BFS spanning tree from `root` and detach the subtree
/// below a random non-root node
fn spanning_tree_cut<'a, R>(root: &'a str, neighbors: &HashMap<&'a str, Vec<&'a str>>, rng: &mut R) -> HashSet<&'a str>
where
    R: Rng + ?Sized,
{
    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut order: Vec<&str> = Vec::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    visited.insert(root);
    queue.push_back(root);

    while let Some(current) = queue.pop_front() {
        order.push(current);
        let mut adjacent = neighbors.get(current).cloned().unwrap_or_default();
        adjacent.shuffle(rng);
        for next in adjacent {
            if visited.insert(next) {
                children.entry(current).or_default().push(next);
                queue.push_back(next);
            }
        }
    }

    if order.len() < 2 {
        return HashSet::from([root]);
    }

    // cutting the edge above `cut_root` detaches its whole subtree
    let cut_root = order[rng.gen_range(1..order.len())];
    let mut subtree = HashSet::new();
    let mut stack = vec![cut_root];
    while let Some(current) = stack.pop() {
        subtree.insert(current);
        if let Some(kids) = children.get(current) {
            stack.extend(kids.iter().copied());
        }
    }
    subtree
}
