//! Ask relay server.
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │                  ASK RELAY                    │
//!   POST /ask            │  ┌───────────┐   ┌──────────┐   ┌──────────┐  │
//!   POST /ask/stream ────┼─▶│ validator │──▶│  relay   │──▶│ upstream │──┼──▶ RAG service
//!                        │  └───────────┘   │ ask /    │   │  client  │  │
//!   JSON or SSE     ◀────┼──────────────────│ stream   │◀──│          │◀─┼───
//!                        │                  └──────────┘   └──────────┘  │
//!                        │   config · secrets · logging · metrics        │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use ask_relay::config::{load_config, RelayConfig, Secrets};
use ask_relay::http::HttpServer;
use ask_relay::lifecycle::{spawn_signal_listener, Shutdown};
use ask_relay::observability::{logging, metrics};
use ask_relay::upstream::RagClient;

#[derive(Parser)]
#[command(name = "ask-relay")]
#[command(about = "Relay portfolio chat questions to the RAG service", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults are used when omitted.
    #[arg(short, long, env = "ASK_RELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RelayConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);

    tracing::info!("ask-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        connect_timeout_secs = config.upstream.connect_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let secrets = Secrets::from_env(&config.secrets);
    let upstream = Arc::new(RagClient::new(&config.upstream)?);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());

    let server = HttpServer::new(config, secrets, upstream);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
