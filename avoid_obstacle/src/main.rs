//! Obstacle-avoidance controller
//!
//! Reads laser scans, either replayed as JSON lines or produced by a
//! simulated scanner, and prints one JSON velocity command per scan.

mod sink;

use anyhow::{bail, Context, Result};
use avoid_core::params::DEFAULT_PARAMS_PATH;
use avoid_core::{Hub, RuntimeParams, Scheduler};
use avoid_library::nodes::{AvoidObstacleNode, AvoidanceConfig, PointObstacle, SimulatedLidarNode};
use avoid_library::LaserScan;
use clap::{Parser, Subcommand};
use sink::JsonLinesSink;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "avoid_obstacle")]
#[command(about = "Sector-based reactive obstacle avoidance", long_about = None)]
struct Args {
    /// Parameter file (YAML); defaults to config/params.yaml when present
    #[arg(long, global = true)]
    params: Option<PathBuf>,

    /// Override the safety threshold in meters
    #[arg(long, global = true)]
    threshold: Option<f32>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read one JSON LaserScan per line and print one JSON CmdVel per command
    Replay {
        /// Input file, or '-' for stdin
        #[arg(short, long, default_value = "-")]
        input: String,
    },
    /// Drive the controller from a simulated scanner
    Simulate {
        /// Run time in seconds
        #[arg(short, long, default_value_t = 5.0)]
        duration: f64,

        /// Point obstacle as <bearing_deg>:<distance_m>, repeatable
        #[arg(short, long = "obstacle", value_name = "DEG:DIST")]
        obstacles: Vec<PointObstacle>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries the command stream
    let filter = if args.verbose {
        "avoid_obstacle=debug,avoid_core=debug,avoid_library=debug,avoid=debug"
    } else {
        "avoid_obstacle=info,avoid_core=info,avoid_library=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    let params = load_params(args.params.as_deref(), args.threshold)?;
    let config = AvoidanceConfig::from_params(&params).context("invalid parameters")?;

    match args.command {
        Command::Replay { input } => {
            let reader: Box<dyn BufRead> = if input == "-" {
                Box::new(BufReader::new(io::stdin()))
            } else {
                let file = File::open(&input).with_context(|| format!("failed to open '{}'", input))?;
                Box::new(BufReader::new(file))
            };
            let scans = replay(config, reader, io::stdout())?;
            info!("Replayed {} scan(s)", scans);
        }
        Command::Simulate {
            duration,
            obstacles,
        } => {
            if !duration.is_finite() || duration < 0.0 {
                bail!("duration must be a non-negative number of seconds");
            }
            let tick_rate = params.get_f64("tick_rate", 10.0);
            let beams = params.get_or("beams_per_revolution", 360usize);
            simulate(config, &obstacles, beams, tick_rate, Duration::from_secs_f64(duration))?;
        }
    }

    Ok(())
}

fn load_params(path: Option<&Path>, threshold: Option<f32>) -> Result<RuntimeParams> {
    let params = match path {
        Some(path) => RuntimeParams::from_file(path)
            .with_context(|| format!("failed to load parameters from {}", path.display()))?,
        None => RuntimeParams::init(Path::new(DEFAULT_PARAMS_PATH))
            .context("failed to load default parameter file")?,
    };

    if let Some(threshold) = threshold {
        params.set("safety_threshold", threshold)?;
    }
    Ok(params)
}

/// Feed every parseable line through the controller, one tick per scan
///
/// Returns the number of scans handed to the controller.
fn replay<R, W>(config: AvoidanceConfig, reader: R, out: W) -> Result<u64>
where
    R: BufRead,
    W: Write + Send + 'static,
{
    let scans: Hub<LaserScan> = Hub::new_with_capacity(&config.scan_topic, config.scan_queue_depth)?;
    let sink = JsonLinesSink::new(&config.cmd_topic, out);
    let node = AvoidObstacleNode::with_transport(scans.clone(), sink, config);

    let mut scheduler = Scheduler::new().name("replay");
    scheduler.add(Box::new(node), 0, None);

    let mut count = 0;
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.context("failed to read input")?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<LaserScan>(&line) {
            Ok(scan) => {
                if scans.send(scan, None).is_err() {
                    bail!("scan topic '{}' closed", scans.get_topic_name());
                }
                count += 1;
                scheduler.tick_once()?;
            }
            Err(e) => warn!("Skipping line {}: {}", line_no + 1, e),
        }
    }

    scheduler.shutdown()?;
    Ok(count)
}

/// Simulated scanner matching the controller's resolution and tick rate
fn build_lidar(
    scans: Hub<LaserScan>,
    obstacles: &[PointObstacle],
    beams: usize,
    tick_rate: f64,
) -> Result<SimulatedLidarNode> {
    let mut lidar = SimulatedLidarNode::with_hub(scans);
    lidar.set_beams(beams)?;
    lidar.set_scan_frequency(tick_rate as f32);
    for obstacle in obstacles {
        lidar.add_obstacle(*obstacle);
    }
    Ok(lidar)
}

fn simulate(
    config: AvoidanceConfig,
    obstacles: &[PointObstacle],
    beams: usize,
    tick_rate: f64,
    duration: Duration,
) -> Result<()> {
    let scans: Hub<LaserScan> = Hub::new_with_capacity(&config.scan_topic, config.scan_queue_depth)?;
    let lidar = build_lidar(scans.clone(), obstacles, beams, tick_rate)?;
    let sink = JsonLinesSink::new(&config.cmd_topic, io::stdout());
    let avoid = AvoidObstacleNode::with_transport(scans, sink, config);

    info!(
        "Simulating {} obstacle(s) for {:?} at {} Hz",
        obstacles.len(),
        duration,
        tick_rate
    );

    let mut scheduler = Scheduler::new().name("simulate").with_tick_rate(tick_rate);
    scheduler.add(Box::new(lidar), 0, None);
    scheduler.add(Box::new(avoid), 1, None);
    scheduler.run_for(duration)?;
    Ok(())
}
