//! Run a PHOLD grid on the sequential reference kernel.
//!
//! Prints one `row,col:recvCount` line per node when `--verbose` is set, the
//! same format the parallel runs emit, so outputs can be diffed across
//! kernels and partitionings.

use std::process;

use clap::Parser;
use phold::{GridWorld, NodeConfig, Params, PholdResult, parse_time};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "phold-grid", version, about = "PHOLD benchmark on a 2D grid")]
struct Cli {
    /// Number of grid rows.
    #[arg(long = "rows", alias = "N", default_value_t = 10)]
    rows: u32,
    /// Number of grid columns.
    #[arg(long = "cols", alias = "M", default_value_t = 10)]
    cols: u32,
    /// Rings of neighbors linked to each node.
    #[arg(long, default_value_t = 1)]
    num_rings: u32,
    /// Initial events per node (may be fractional).
    #[arg(long, default_value_t = 0.1)]
    event_density: f64,
    /// Neighbor selection: random or cyclic.
    #[arg(long, default_value = "random")]
    movement: String,
    /// Delay model: constant, exponential or uniform.
    #[arg(long, default_value = "constant")]
    delay: String,
    /// Exponential delay multiplier.
    #[arg(long, default_value_t = 1.0)]
    multiplier: f64,
    /// Uniform delay lower bound.
    #[arg(long, default_value_t = 0.0)]
    min: f64,
    /// Uniform delay upper bound.
    #[arg(long, default_value_t = 1.0)]
    max: f64,
    /// Size of small payloads in bytes.
    #[arg(long, default_value_t = 8)]
    small_payload: usize,
    /// Size of large payloads in bytes.
    #[arg(long, default_value_t = 1024)]
    large_payload: usize,
    /// Fraction of events that carry a large payload.
    #[arg(long, default_value_t = 0.0)]
    large_event_fraction: f64,
    /// Bytes of auxiliary memory per node.
    #[arg(long, default_value_t = 0)]
    component_size: usize,
    /// Simulated run time.
    #[arg(long, default_value = "1000ns")]
    time_to_run: String,
    /// Latency of every link.
    #[arg(long, default_value = "1ns")]
    link_delay: String,
    /// Print per-node receive counts at the end.
    #[arg(long)]
    verbose: bool,
    /// Append the link count to each printed line.
    #[arg(long)]
    print_links: bool,
    /// Checkpoint and restore the whole grid at this time.
    #[arg(long)]
    checkpoint_at: Option<String>,
}

impl Cli {
    fn params(&self) -> Params {
        Params::new()
            .with("i", 0)
            .with("j", 0)
            .with("rowCount", self.rows)
            .with("colCount", self.cols)
            .with("numRings", self.num_rings)
            .with("eventDensity", self.event_density)
            .with("movementFunction", &self.movement)
            .with("delayFunction", &self.delay)
            .with("multiplier", self.multiplier)
            .with("min", self.min)
            .with("max", self.max)
            .with("smallPayload", self.small_payload)
            .with("largePayload", self.large_payload)
            .with("largeEventFraction", self.large_event_fraction)
            .with("componentSize", self.component_size)
            .with("timeToRun", &self.time_to_run)
            .with("verbose", u8::from(self.verbose))
    }
}

fn run(cli: &Cli) -> PholdResult<()> {
    let template = NodeConfig::from_params(&cli.params());
    let link_delay = parse_time(&cli.link_delay)?;
    let end = template.time_to_run;

    let mut world = GridWorld::new(&template, link_delay)?;
    world.setup();

    if let Some(at) = &cli.checkpoint_at {
        let at = parse_time(at)?.min(end);
        world.run_until(at);
        let snapshot = world.checkpoint();
        let bytes = serde_json::to_vec(&snapshot)?;
        tracing::info!(time = at, bytes = bytes.len(), "checkpointed grid");
        let snapshot = serde_json::from_slice(&bytes)?;
        world = GridWorld::restore(&template, link_delay, &snapshot)?;
    }

    world.run_until(end);

    for summary in world.finish() {
        println!("{}", summary.line(cli.print_links));
    }
    eprintln!(
        "simulated {} ps, {} events processed, {} pending",
        world.now(),
        world.events_processed(),
        world.pending_event_count()
    );
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("phold-grid: {e}");
        process::exit(1);
    }
}
