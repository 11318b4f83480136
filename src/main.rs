//! Skew protection gateway.
//!
//! Sits in front of the current deployment's origin and keeps every client
//! on the deployment that served its first page load.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────┐
//!                      │                  SKEW GATEWAY                    │
//!   Client Request     │  ┌────────┐   ┌────────────┐   ┌─────────────┐   │
//!   ───────────────────┼─▶│  http  │──▶│ entrypoint │──▶│   engine    │   │
//!                      │  │ server │   │ classifier │   │  decision   │   │
//!                      │  └────────┘   └────────────┘   └──────┬──────┘   │
//!                      │                                       │          │
//!                      │            ┌──────────────────────────┼───────┐  │
//!                      │            ▼                          ▼       │  │
//!                      │   ┌────────────────┐        ┌──────────────┐  │  │
//!                      │   │ token (HMAC)   │        │   reroute    │──┼──┼──▶ Pinned
//!                      │   │ sign / verify  │        │ (+ bypass)   │  │  │    Deployment
//!                      │   └────────────────┘        └──────────────┘  │  │
//!                      │                                               │  │
//!   Client Response    │  ┌────────────────┐   continue                │  │
//!   ◀──────────────────┼──│ + Set-Cookie   │◀──────────────────────────┘  │
//!                      │  └───────┬────────┘                              │
//!                      │          └─────────────────────────────────────────▶ Current
//!                      └──────────────────────────────────────────────────┘   Deployment
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use skew_protection::config::loader::load_config;
use skew_protection::http::GatewayServer;
use skew_protection::lifecycle::{signals, Shutdown};
use skew_protection::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "skew-gateway")]
#[command(about = "Pins clients to the deployment they first loaded", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "skew-gateway.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    logging::init(&config.observability, config.skew_protection.verbose);

    tracing::info!(
        config = %cli.config.display(),
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = GatewayServer::new(config)?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
