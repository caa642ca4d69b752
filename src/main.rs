//! front-door: static file server and sticky round-robin reverse proxy.
//!
//! ```text
//!     Client ──▶ net listener ──▶ http connection loop ──▶ routing
//!                                                           │
//!                               ┌───────────────────────────┴──────────┐
//!                               ▼                                      ▼
//!                         files (root or                     load_balancer
//!                         virtual host)                  (affinity + forwarder)
//!                                                                      │
//!                                                                      ▼
//!                                                                 Backend
//! ```

use std::path::PathBuf;

use clap::Parser;

use front_door::config::{resolve_config, ConfigOverrides};
use front_door::lifecycle;
use front_door::observability::init_logging;

const DEFAULT_CONFIG_PATH: &str = "./front-door.toml";

#[derive(Debug, Parser)]
#[command(name = "front-door", version, about = "Static file server and sticky load balancer")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Default document root
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let required = cli.config.is_some();
    let config_path = cli
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let overrides = ConfigOverrides {
        port: cli.port,
        root: cli.root,
        log_level: cli.log_level,
    };

    let config = resolve_config(&config_path, required, overrides)?;

    init_logging(&config.log_level)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path.display(),
        "front-door starting"
    );

    lifecycle::start(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
