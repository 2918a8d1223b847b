//! End-to-end simulation scenarios through the public API.

use std::collections::HashSet;
use std::io::Write;
use std::time::Duration;

use archsim::cascade::compute_blast_radius;
use archsim::chaos::{ChaosConfig, ChaosEventType, ChaosSubMode};
use archsim::config_loader::load_config;
use archsim::flow::trace;
use archsim::graph::{load_graph, Edge, Graph, Node};
use archsim::playback::{NodeSimulationState, SimulationController, SimulationMode};
use archsim::report::{generate_json_report, RunSummary};
use archsim::stats::SimulationStats;
use archsim::SimError;
use tempfile::{Builder, NamedTempFile};

fn graph(nodes: &[&str], edges: &[(&str, &str, &str)]) -> Graph {
    Graph::new(
        nodes.iter().map(|id| Node::new(*id, "service")).collect(),
        edges.iter().map(|(id, s, t)| Edge::new(*id, *s, *t)).collect(),
    )
}

fn chain() -> Graph {
    graph(&["A", "B", "C", "D"], &[("ab", "A", "B"), ("bc", "B", "C"), ("cd", "C", "D")])
}

fn diamond() -> Graph {
    graph(
        &["A", "B", "C", "D"],
        &[("ab", "A", "B"), ("ac", "A", "C"), ("bd", "B", "D"), ("cd", "C", "D")],
    )
}

#[test]
fn scenario_a_linear_chain_blast_radius() {
    let radius = compute_blast_radius(&chain(), &["B"], &[] as &[&str]);

    assert_eq!(radius.affected_node_ids, vec!["C", "D"]);
    assert_eq!(radius.levels.len(), 2);
    assert_eq!(radius.levels[0].depth, 0);
    assert_eq!(radius.levels[0].node_ids, vec!["C"]);
    assert_eq!(radius.levels[1].depth, 1);
    assert_eq!(radius.levels[1].node_ids, vec!["D"]);
}

#[test]
fn scenario_b_diamond_trace() {
    let path = trace(&diamond(), "A").unwrap();
    let levels = path.levels.as_ref().unwrap();

    let first: Vec<&str> = levels[0].steps.iter().map(|s| s.to_node_id.as_str()).collect();
    assert_eq!(first, vec!["B", "C"]);
    let branches: HashSet<&str> = levels[0].steps.iter().map(|s| s.branch_id.as_str()).collect();
    assert_eq!(branches.len(), 2);

    let second: Vec<&str> = levels[1].steps.iter().map(|s| s.to_node_id.as_str()).collect();
    assert_eq!(second, vec!["D"]);
}

#[test]
fn scenario_c_step_forward_without_stepping() {
    let mut controller = SimulationController::manual(chain(), 1);
    controller.start_flow("A").unwrap();

    assert!(!controller.step_forward());
    assert_eq!(controller.flow_state().unwrap().current_step_index, 0);
}

#[test]
fn scenario_d_invalid_probability_rejected() {
    let mut controller = SimulationController::manual(chain(), 1);
    let valid = ChaosConfig {
        failure_probability: 0.5,
        ..ChaosConfig::default()
    };
    controller.set_chaos_config(valid.clone()).unwrap();

    let result = controller.set_chaos_config(ChaosConfig {
        failure_probability: 1.5,
        ..ChaosConfig::default()
    });
    assert!(matches!(result, Err(SimError::InvalidConfig(_))));
    assert_eq!(controller.chaos_config(), &valid);

    let result = controller.set_chaos_config(ChaosConfig {
        interval_ms: 0,
        ..ChaosConfig::default()
    });
    assert!(result.is_err());
    assert_eq!(controller.chaos_config(), &valid);
}

#[test]
fn cyclic_graph_trace_terminates_without_revisits() {
    let cyclic = graph(
        &["A", "B", "C"],
        &[("ab", "A", "B"), ("bc", "B", "C"), ("ca", "C", "A"), ("cb", "C", "B")],
    );
    let path = trace(&cyclic, "A").unwrap();

    let mut seen = HashSet::new();
    for level in path.levels.as_ref().unwrap() {
        for step in &level.steps {
            assert!(seen.insert(step.to_node_id.clone()), "{} appears twice", step.to_node_id);
        }
    }
    assert_eq!(path.node_ids, vec!["A", "B", "C"]);
}

#[test]
fn acyclic_levels_match_longest_path() {
    // A -> B -> C -> D plus a shortcut fan-out A -> E
    let dag = graph(
        &["A", "B", "C", "D", "E"],
        &[("ab", "A", "B"), ("ae", "A", "E"), ("bc", "B", "C"), ("cd", "C", "D")],
    );
    let path = trace(&dag, "A").unwrap();
    assert_eq!(path.levels.unwrap().len(), 3);
}

#[test]
fn source_without_outgoing_edges() {
    let path = trace(&chain(), "D").unwrap();
    assert_eq!(path.node_ids, vec!["D"]);
    assert!(path.levels.unwrap().is_empty());
    assert!(path.steps.is_empty());
}

#[test]
fn empty_graph_is_not_an_error() {
    let mut controller = SimulationController::manual(Graph::default(), 1);
    controller.set_failed_nodes(&[] as &[&str]).unwrap();
    match controller.stats() {
        SimulationStats::Failure(stats) => assert_eq!(stats.impact_percentage, 0.0),
        other => panic!("unexpected stats {:?}", other),
    }
}

#[test]
fn chaos_session_protects_and_numbers_rounds() {
    let mut controller = SimulationController::manual(diamond(), 17);
    let mut protected = std::collections::BTreeSet::new();
    protected.insert("C".to_string());
    controller
        .set_chaos_config(ChaosConfig {
            interval_ms: 500,
            max_failures_per_round: 2,
            failure_probability: 0.6,
            protected_node_ids: protected,
            ..ChaosConfig::default()
        })
        .unwrap();
    controller.start_chaos();

    for _ in 0..8 {
        controller.advance(Duration::from_millis(500));
        let session = controller.chaos_session().unwrap();
        assert!(!session.failed_node_ids().contains("C"));
        assert!(!session.affected_node_ids().contains("C"));
    }

    let rounds: Vec<u32> = controller.chaos_events().iter().map(|e| e.round).collect();
    assert_eq!(rounds, (1..=8).collect::<Vec<u32>>());
    assert_eq!(controller.node_state("C"), Some(NodeSimulationState::Protected));
}

#[test]
fn chaos_is_reproducible_for_a_seed() {
    let run = |seed| {
        let mut controller = SimulationController::manual(diamond(), seed);
        controller
            .set_chaos_config(ChaosConfig {
                interval_ms: 100,
                failure_probability: 0.5,
                ..ChaosConfig::default()
            })
            .unwrap();
        controller.start_chaos();
        controller.advance(Duration::from_millis(500));
        controller.chaos_events().to_vec()
    };
    assert_eq!(run(99), run(99));
}

#[test]
fn partition_chaos_degrades_on_single_node() {
    let mut controller = SimulationController::manual(graph(&["solo"], &[]), 2);
    controller
        .set_chaos_config(ChaosConfig {
            sub_mode: ChaosSubMode::NetworkPartition,
            interval_ms: 100,
            ..ChaosConfig::default()
        })
        .unwrap();
    controller.start_chaos();
    assert_eq!(controller.advance(Duration::from_millis(300)), 3);

    assert!(controller
        .chaos_events()
        .iter()
        .all(|e| e.event_type == ChaosEventType::Degraded));
    assert!(controller.is_running());
}

#[test]
fn stale_tick_after_mode_change_is_ignored() {
    let mut controller = SimulationController::manual(chain(), 4);
    controller.start_chaos();
    controller.scheduler_mut().advance(Duration::from_millis(2000));
    let ticks = archsim::chaos::Scheduler::poll_due(controller.scheduler_mut());

    controller.set_mode(SimulationMode::Failure);
    for tick in ticks {
        assert!(!controller.on_timer(tick));
    }
    assert!(controller.failure_state().unwrap().failed_node_ids.is_empty());
}

#[test]
fn load_files_and_write_report() {
    let mut graph_file = Builder::new().suffix(".yaml").tempfile().unwrap();
    write!(
        graph_file,
        r#"
nodes:
  - id: web
    type: client
  - id: api
    type: service
  - id: db
    type: database
edges:
  - id: web-api
    source: web
    target: api
    protocol: https
    latencyMs: 20
  - id: api-db
    source: api
    target: db
    latencyMs: 4
"#
    )
    .unwrap();

    let mut config_file = NamedTempFile::new().unwrap();
    write!(config_file, "seed: 5\nchaos:\n  interval_ms: 250\n").unwrap();

    let graph = load_graph(graph_file.path()).unwrap();
    let config = load_config(config_file.path()).unwrap();
    assert_eq!(config.chaos.interval_ms, 250);

    let mut controller = SimulationController::manual(graph, config.seed.unwrap_or_default());
    controller.start_flow("web").unwrap();
    assert_eq!(controller.flow_path().unwrap().steps[0].protocol.as_deref(), Some("https"));

    let report_file = NamedTempFile::new().unwrap();
    generate_json_report(&RunSummary::capture(&controller), report_file.path()).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(report_file.path()).unwrap()).unwrap();
    assert_eq!(value["stats"]["totalLatencyMs"], 24.0);
    assert_eq!(value["stats"]["bottleneckEdgeId"], "web-api");
}
