use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{Level, info};

use interaction_graph::Session;
use interaction_graph::filter::ToggleTarget;
use interaction_graph::graph::load_graph;
use interaction_graph::report::LayoutReport;
use interaction_graph::simulation::SimulationConfig;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Graph payload with `users`, `links` and `assignments`.
    data: PathBuf,

    /// Filter entry to toggle, applied in order starting from `all`.
    #[arg(long = "toggle", value_name = "all|ID")]
    toggles: Vec<ToggleTarget>,

    /// Stop after this many ticks even if the layout has not cooled.
    #[arg(long)]
    max_ticks: Option<u64>,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[arg(long, default_value_t = -30.0, allow_hyphen_values = true)]
    charge_strength: f32,

    #[arg(long, default_value_t = 30.0)]
    link_distance: f32,

    #[arg(long, default_value_t = 1.0)]
    link_strength: f32,

    #[arg(long, default_value_t = 0.1)]
    center_strength: f32,

    #[arg(long, default_value_t = 0.4)]
    velocity_decay: f32,

    /// Ticks needed to cool from alpha 1 to the minimum.
    #[arg(long, default_value_t = 300)]
    cooling_ticks: u32,

    #[arg(long, default_value_t = 0.9)]
    theta: f32,

    /// Print the report on a single line.
    #[arg(long)]
    compact: bool,

    /// Log more detail to stderr (repeat for trace output).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn simulation_config(&self) -> SimulationConfig {
        SimulationConfig {
            charge_strength: self.charge_strength,
            link_distance: self.link_distance,
            link_strength: self.link_strength,
            center_strength: self.center_strength,
            velocity_decay: self.velocity_decay,
            theta: self.theta,
            seed: self.seed,
            ..SimulationConfig::default()
        }
        .with_cooling_ticks(self.cooling_ticks)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    let graph = load_graph(&args.data)?;
    let mut session = Session::new(graph, args.simulation_config())
        .context("failed to start layout session")?;

    for &target in &args.toggles {
        session.toggle(target)?;
    }

    let summary = session
        .simulation_mut()
        .run_to_convergence(args.max_ticks)
        .context("failed to run layout")?;
    info!(
        ticks = summary.ticks,
        cooled = summary.cooled,
        selection = %session.selection(),
        "layout finished"
    );

    let report = LayoutReport::from_session(&session);
    let mut stdout = io::stdout().lock();
    if args.compact {
        serde_json::to_writer(&mut stdout, &report)?;
    } else {
        serde_json::to_writer_pretty(&mut stdout, &report)?;
    }
    writeln!(stdout).context("failed to write layout report")?;
    Ok(())
}
