use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use omni_motion::config::{MOTOR_ENABLED, MOTOR_PORT, PlatformConfig};

/// Heading-holding runtime for an omniwheel base
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Platform layout and gains (JSON); the LeKiwi base when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial port of the Feetech motor bus
    #[arg(short, long, default_value = MOTOR_PORT)]
    port: String,

    /// Drive simulated motors instead of the bus
    #[arg(long)]
    simulate: bool,
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match PlatformConfig::load(path) {
            Ok(config) => {
                info!("Loaded platform config from {}", path.display());
                config
            }
            Err(e) => {
                eprintln!("Config error: {}", e);
                std::process::exit(2);
            }
        },
        None => PlatformConfig::default(),
    };

    let simulate = args.simulate || !MOTOR_ENABLED;
    if let Err(e) = omni_motion::runtime::run(config, &args.port, simulate).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
