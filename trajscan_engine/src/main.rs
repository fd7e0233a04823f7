//! # trajscan
//!
//! Streams a JSON point set through the trajectory engine against the
//! simulated servo, one point per controller cycle.
//!
//! ```text
//! trajscan --config config/trajscan.toml --points config/snake_scan.json
//! trajscan --points config/snake_scan.json --emit-words 4
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::Ordering;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;
use trajscan_common::config::{ConfigError, LogLevel};
use trajscan_common::consts::DEFAULT_CONFIG_PATH;
use trajscan_engine::config::{load_config, AppConfig};
use trajscan_engine::cycle::{rt_setup, CycleRunner, StopReason};
use trajscan_engine::host::PointSet;

/// trajscan: double-buffered trajectory streaming
#[derive(Parser, Debug)]
#[command(name = "trajscan")]
#[command(version)]
#[command(about = "Stream pre-planned trajectories through a ping-pong buffer engine")]
struct Args {
    /// Runner configuration TOML.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// JSON point set, overrides `host.points_file`.
    #[arg(long, value_name = "FILE")]
    points: Option<PathBuf>,

    /// CPU core to pin the cycle thread to.
    #[arg(long, default_value_t = 1)]
    cpu_core: usize,

    /// SCHED_FIFO priority.
    #[arg(long, default_value_t = 80)]
    rt_priority: i32,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,

    /// Print controller memory literals for the first N points and exit.
    #[arg(long, value_name = "N")]
    emit_words: Option<usize>,

    /// Print the final status registers as JSON.
    #[arg(long)]
    report: bool,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    print_config: bool,
}

fn main() {
    let args = Args::parse();
    let config = load_config(&args.config);
    setup_tracing(&args, config.as_ref().map(|c| c.shared.log_level).ok());

    info!("trajscan v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args, config) {
        error!("FATAL: {e}");
        process::exit(1);
    }
}

fn run(args: &Args, config: Result<AppConfig, ConfigError>) -> Result<(), Box<dyn std::error::Error>> {
    let config = config?;
    info!(
        service = %config.shared.service_name,
        cycle_time_us = config.engine.cycle_time_us,
        buffer_length = config.engine.buffer_length,
        axes = ?config.engine.axes,
        "config OK"
    );

    if args.print_config {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let points_path = args
        .points
        .clone()
        .or_else(|| config.host.points_file.clone())
        .ok_or("no point set given (use --points or host.points_file)")?;
    let points = PointSet::load(&points_path)?;
    info!(points = points.len(), path = %points_path.display(), "point set loaded");

    if let Some(n) = args.emit_words {
        for index in 0..n.min(points.len()) {
            println!("{index}: {}", points.controller_literals(index)?.join(" "));
        }
        return Ok(());
    }

    if points.axis_mask().register_value() != config.engine.axes_register() {
        warn!(
            point_axes = points.axis_mask().register_value(),
            engine_axes = config.engine.axes_register(),
            "point set axes differ from engine.axes"
        );
    }

    rt_setup(args.cpu_core, args.rt_priority)?;
    info!(cpu_core = args.cpu_core, priority = args.rt_priority, "RT setup complete");

    let mut runner = CycleRunner::new(&config, points)?;

    let running = runner.running_flag();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        running.store(false, Ordering::Release);
    })?;

    let summary = runner.run()?;
    info!(
        total_points = summary.total_points,
        points_sent = summary.points_sent,
        buffer_fills = summary.buffer_fills,
        avg_cycle_ns = summary.stats.avg_cycle_ns(),
        max_cycle_ns = summary.stats.max_cycle_ns,
        "trajectory scan finished"
    );

    if args.report {
        println!("{}", serde_json::to_string_pretty(&runner.engine().snapshot())?);
    }

    match summary.reason {
        StopReason::Faulted(code) => Err(format!("engine halted with {code:?}").into()),
        StopReason::Completed | StopReason::Aborted => Ok(()),
    }
}

/// Setup tracing subscriber from the CLI flags and the configured level.
fn setup_tracing(args: &Args, configured: Option<LogLevel>) {
    let filter = if args.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        let directive = configured.unwrap_or_default().as_directive();
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive))
    };

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
