use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use drive_subsystem::config::{DriveConfig, LOOP_HZ, MAX_LOOP_HZ};

/// Drive subsystem runtime
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// JSON drive configuration; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Control loop frequency (Hz)
    #[arg(long, default_value_t = LOOP_HZ, value_parser = clap::value_parser!(u64).range(1..=MAX_LOOP_HZ))]
    loop_hz: u64,
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init(); // installs the subscriber globally

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            info!("Loading drive configuration from {}", path.display());
            DriveConfig::load(path)
        }
        None => Ok(DriveConfig::default()),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(2);
        }
    };

    if let Err(e) = drive_subsystem::runtime::run(config, args.loop_hz).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
