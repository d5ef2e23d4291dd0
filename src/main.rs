//! reskin-proxy
//!
//! Mirrors a single upstream site under the proxy's own origin, reskinning
//! every HTML page into a local shell.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request      ┌──────────────────────────────────────────────┐
//!     ────────────────────┼─▶ http::server ──▶ http::handler             │
//!                         │                       │                      │
//!                         │                       ▼                      │
//!                         │                 http::upstream ─────────────┼──▶ Upstream
//!                         │                       │                      │     Site
//!                         │                       ▼                      │
//!                         │                 http::response (classify) │
//!                         │                  │          │             │
//!                         │        redirect ◀┘          └▶ rewrite::*    │
//!                         │                                │           │
//!     Client Response     │                                ▼           │
//!     ◀───────────────────┼──────────────────────── http::render        │
//!                         │                                              │
//!                         │  config · security · observability · lifecycle│
//!                         └──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use reskin_proxy::config::load_config;
use reskin_proxy::lifecycle::{signals, Shutdown};
use reskin_proxy::observability::{logging, metrics};
use reskin_proxy::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "reskin-proxy", version, about = "HTML-rewriting mirror proxy")]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(short, long, env = "RESKIN_CONFIG")]
    config: Option<PathBuf>,

    /// Dotenv file loaded before reading the environment.
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // A missing dotenv file is normal outside development.
    let env_loaded = dotenvy::from_path(&cli.env_file).is_ok();

    let config = load_config(cli.config.as_deref())?;
    logging::init(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "reskin-proxy starting");
    tracing::info!(
        env_file = %cli.env_file.display(),
        env_loaded,
        config_file = ?cli.config,
        upstream = %config.upstream_base(),
        port = config.listener.port,
        external_port = config.external_port(),
        trust_proxy = %config.trust_proxy,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(config.listener.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    tokio::spawn(async move {
        signals::shutdown_signal().await;
        shutdown.trigger();
    });

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown_rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
