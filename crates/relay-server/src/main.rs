//! alert-relay - relays Alertmanager notifications to Google Chat rooms.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use relay_server::{RelayConfig, RelayServer};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "alert-relay")]
#[command(about = "Relays Alertmanager webhook notifications to Google Chat")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, env = "ALERT_RELAY_CONFIG", default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = RelayConfig::from_file(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.app.log))
        .context("invalid log filter")?;
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    info!(
        config = %cli.config.display(),
        version = env!("CARGO_PKG_VERSION"),
        "starting alert-relay"
    );

    let server = RelayServer::from_config(&config).context("initialising providers")?;
    server.serve_with_shutdown(shutdown_signal()).await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
