//! Subscription gateway
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ───────────────▶ http::server ──▶ routing::matcher
//!                                           │
//!                     ┌─────────────────────┴──────────────────┐
//!                     ▼                                        ▼
//!            /sub/{key}                               /i/{key}[/{platform}]
//!     subscription::middleware                        import::router
//!     (headers over upstream body)          (404 / 302 / landing page)
//!                     │                                        │
//!                     └──────────────┬─────────────────────────┘
//!                                    ▼
//!                     store::{ClientDirectory, LinkDirectory}
//!                          (TTL cache over JSON tables)
//! ```

use std::path::PathBuf;

use clap::Parser;

use subscription_gateway::config::{load_config, GatewayConfig};
use subscription_gateway::lifecycle::startup;
use subscription_gateway::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "subscription-gateway")]
#[command(about = "Subscription headers and import links for VPN clients", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
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
        None => GatewayConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    init_logging(&config.observability.log_level);
    tracing::info!("subscription-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        clients = %config.tables.clients_path,
        links = %config.tables.links_path,
        cache_ttl_ms = config.tables.cache_ttl_ms,
        upstream = ?config.subscription.upstream,
        "Configuration loaded"
    );

    startup::run(config).await
}
