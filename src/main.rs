use archsim::chaos::{ManualScheduler, Scheduler, SystemScheduler};
use archsim::config::SimulationConfig;
use archsim::graph::{load_graph, Graph};
use archsim::playback::SimulationController;
use archsim::report::{generate_json_report, render_text_report, RunSummary};
use archsim::{config_loader, SimError};
use clap::{Parser, Subcommand};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::{Path, PathBuf};
use std::thread;

/// Request-flow and failure simulation over architecture diagrams
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Also write the run summary as JSON to this file
    #[arg(long, global = true)]
    json_out: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Trace the request flow from a source node
    Trace {
        /// Graph snapshot (.json, .yaml or .yml)
        #[arg(short, long)]
        graph: PathBuf,

        /// Node the request enters at
        #[arg(short, long)]
        source: String,

        /// Run configuration YAML file (stepping and round-trip options)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Compute the downstream blast radius of failed nodes
    Blast {
        /// Graph snapshot (.json, .yaml or .yml)
        #[arg(short, long)]
        graph: PathBuf,

        /// Node to mark as failed (repeatable)
        #[arg(long = "fail", required = true)]
        fail: Vec<String>,

        /// Node that never fails or becomes affected (repeatable)
        #[arg(long = "protect")]
        protect: Vec<String>,
    },

    /// Run a chaos session for a number of rounds
    Chaos {
        /// Graph snapshot (.json, .yaml or .yml)
        #[arg(short, long)]
        graph: PathBuf,

        /// Run configuration YAML file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of rounds to run
        #[arg(long, default_value_t = 10)]
        rounds: u32,

        /// Random seed, overrides the configuration file
        #[arg(long)]
        seed: Option<u64>,

        /// Wait for the real interval between rounds instead of a virtual clock
        #[arg(long)]
        realtime: bool,
    },
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse command-line arguments
    let args = Args::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let json_out = args.json_out.as_deref();

    match args.command {
        Command::Trace { graph, source, config } => {
            let sim_config = load_sim_config(config.as_deref())?;
            let mut controller = build_controller(load_graph(&graph)?, ManualScheduler::new(), &sim_config)?;
            start_trace(&mut controller, &source, &sim_config)?;
            finish(&controller, json_out)
        }
        Command::Blast { graph, fail, protect } => {
            let mut controller = SimulationController::manual(load_graph(&graph)?, 0);
            controller.set_failed_nodes(fail.as_slice())?;
            for id in &protect {
                if !controller
                    .failure_state()
                    .map_or(false, |f| f.protected_node_ids.contains(id))
                {
                    controller.toggle_protected_node(id)?;
                }
            }
            finish(&controller, json_out)
        }
        Command::Chaos {
            graph,
            config,
            rounds,
            seed,
            realtime,
        } => {
            let graph = load_graph(&graph)?;
            let mut sim_config = load_sim_config(config.as_deref())?;
            if seed.is_some() {
                sim_config.seed = seed;
            }

            if realtime {
                let mut controller = build_controller(graph, SystemScheduler::new(), &sim_config)?;
                run_chaos(&mut controller, rounds, |controller, remaining| {
                    let interval = controller.chaos_config().interval();
                    let wait = controller.scheduler().until_next_due().unwrap_or(interval);
                    thread::sleep(wait);
                    deliver_due(controller, remaining);
                })?;
                finish(&controller, json_out)
            } else {
                let mut controller = build_controller(graph, ManualScheduler::new(), &sim_config)?;
                run_chaos(&mut controller, rounds, |controller, _| {
                    let interval = controller.chaos_config().interval();
                    controller.advance(interval);
                })?;
                finish(&controller, json_out)
            }
        }
    }
}

/// Load the run configuration, or the defaults without a file
fn load_sim_config(path: Option<&Path>) -> Result<SimulationConfig> {
    match path {
        Some(path) => config_loader::load_config(path),
        None => Ok(SimulationConfig::default()),
    }
}

/// Create a controller with the run configuration applied
fn build_controller<S: Scheduler>(
    graph: Graph,
    scheduler: S,
    config: &SimulationConfig,
) -> Result<SimulationController<S>, SimError> {
    let mut controller = match config.seed {
        Some(seed) => SimulationController::with_seed(graph, scheduler, seed),
        None => SimulationController::new(graph, scheduler),
    };
    controller.set_speed(config.speed)?;
    controller.set_chaos_config(config.chaos.clone())?;
    Ok(controller)
}

/// Start a flow from `source` with the configured playback options
fn start_trace<S: Scheduler>(
    controller: &mut SimulationController<S>,
    source: &str,
    config: &SimulationConfig,
) -> Result<(), SimError> {
    controller.start_flow(source)?;
    controller.set_stepping_mode(config.stepping);
    controller.set_round_trip_enabled(config.round_trip);
    Ok(())
}

fn rounds_done<S: Scheduler>(controller: &SimulationController<S>) -> u32 {
    controller.chaos_session().map_or(0, |s| s.round())
}

/// Deliver due ticks one at a time, running at most `remaining` rounds
fn deliver_due<S: Scheduler>(controller: &mut SimulationController<S>, remaining: u32) -> u32 {
    let ticks = controller.scheduler_mut().poll_due();
    let mut executed = 0;
    for tick in ticks {
        if executed >= remaining {
            break;
        }
        if controller.on_timer(tick) {
            executed += 1;
        }
    }
    executed
}

/// Start chaos and call `wait` with the rounds still to run until `rounds`
/// rounds have executed
fn run_chaos<S, F>(controller: &mut SimulationController<S>, rounds: u32, mut wait: F) -> Result<()>
where
    S: Scheduler,
    F: FnMut(&mut SimulationController<S>, u32),
{
    info!(
        "Running {} chaos round(s): {} every {} ms",
        rounds,
        controller.chaos_config().sub_mode,
        controller.chaos_config().interval_ms
    );
    controller.start_chaos();
    while rounds_done(controller) < rounds {
        let remaining = rounds - rounds_done(controller);
        wait(controller, remaining);
    }
    controller.stop_chaos();
    Ok(())
}

/// Print the text report and write the JSON report if requested
fn finish<S: Scheduler>(controller: &SimulationController<S>, json_out: Option<&Path>) -> Result<()> {
    let summary = RunSummary::capture(controller);
    println!("{}", render_text_report(&summary));

    if let Some(path) = json_out {
        generate_json_report(&summary, path)
            .wrap_err_with(|| format!("Failed to write run summary to '{}'", path.display()))?;
    }

    info!("Simulation completed successfully");
    Ok(())
}
