//! # Plant Control
//!
//! Runs a configured plant on the simulated or real-time scan clock.
//!
//! The configuration file describes the scan period and mode, sensors,
//! actuators, mechanisms and the initial simulated I/O image. Events are
//! written through `tracing`; the final device status is logged as JSON.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use plant_common::config::LogLevel;
use plant_common::consts::DEFAULT_CONFIG_PATH;
use plant_control::config::{build_runner, load_plant, scan_limit};
use plant_control::event::TracingSink;
use tracing::{error, info, Level};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

/// Plant Control: scan-cycle engine for pumps, valves and tanks
#[derive(Parser, Debug)]
#[command(name = "plant_control")]
#[command(version)]
#[command(about = "Scan-cycle control loop for a configured plant")]
struct Args {
    /// Path to the plant configuration TOML.
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Stop after this many scans (overrides `[scan].max_scans`; a simulated
    /// plant with neither stops after 1000 scans).
    #[arg(long)]
    max_scans: Option<u64>,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    let loaded = load_plant(&args.config);
    let log_level = loaded
        .as_ref()
        .map(|c| c.shared.log_level)
        .unwrap_or_default();
    setup_tracing(&args, log_level);

    info!("Plant Control v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!(path = %args.config.display(), "FATAL: {e}");
            process::exit(1);
        }
    };

    let mut runner = match build_runner(&config, Box::new(TracingSink)) {
        Ok(runner) => runner,
        Err(e) => {
            error!("FATAL: {e}");
            process::exit(1);
        }
    };

    let scans = scan_limit(&config.scan, args.max_scans);
    info!(scans, mode = ?config.scan.mode, "scan loop starting");
    if let Err(e) = runner.run(scans) {
        error!("scan loop error: {e}");
        process::exit(1);
    }

    match serde_json::to_string(&runner.statuses()) {
        Ok(json) => info!(status = %json, "final device status"),
        Err(e) => error!("status serialization failed: {e}"),
    }
    info!("Plant Control shutdown complete");
}

/// Setup tracing subscriber from CLI arguments and the configured level.
fn setup_tracing(args: &Args, log_level: LogLevel) {
    let directive: Directive = if args.verbose {
        Level::DEBUG.into()
    } else {
        log_level
            .as_directive()
            .parse()
            .unwrap_or_else(|_| Level::INFO.into())
    };

    let filter = EnvFilter::from_default_env().add_directive(directive);

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
