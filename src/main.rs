//! People app server.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────┐
//!                       │                 PEOPLE APP                   │
//!   Load balancer       │  ┌─────────┐   ┌──────────┐   ┌───────────┐  │
//!   ────────────────────┼─▶│  http   │──▶│ handlers │──▶│   store   │──┼──▶ PostgreSQL
//!   GET /health         │  │ server  │   │ health / │   │ (deadpool)│  │
//!   GET /api/*          │  └────▲────┘   │ info     │   └───────────┘  │
//!                       │       │ close  └────▲─────┘                  │
//!                       │  ┌────┴────────┐    │ draining?              │
//!   SIGTERM / SIGINT ───┼─▶│  lifecycle  │────┘                        │
//!                       │  │ coordinator │                             │
//!                       │  └─────────────┘                             │
//!                       └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use people_app::config::load_config;
use people_app::lifecycle::{forward_signals, Service, SHUTDOWN_CHANNEL_CAPACITY};
use people_app::observability::{logging, metrics};
use people_app::store;

#[derive(Parser)]
#[command(name = "people-app")]
#[command(about = "People demo service with graceful rolling-deploy shutdown", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    logging::init_logging(&config.observability);
    tracing::info!("people-app v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        store = ?config.database.backend,
        drain_window_ms = config.shutdown.drain_window_ms,
        probe_timeout_ms = config.health.probe_timeout_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let store = store::open(&config.database)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Ready");

    // Signals are caught before the schema bootstrap, which can stall on the database.
    let (tx, rx) = mpsc::channel(SHUTDOWN_CHANNEL_CAPACITY);
    tokio::spawn(forward_signals(tx));

    let service = Service::new(config, store);
    if let Err(e) = service.start(listener, rx).await {
        tracing::error!(error = %e, "Server did not close cleanly");
    }

    tracing::info!("Server closed, exiting");
    Ok(())
}
