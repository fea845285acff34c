//! Command API for Aqara shutters and Slide curtains.
//!
//! ```bash
//! # Uses rs-curtains.toml next to the executable
//! rs-curtains
//!
//! # Explicit config file
//! rs-curtains --config /etc/rs-curtains.toml
//!
//! # Show the effective configuration and exit
//! rs-curtains --config ./rs-curtains.toml --print-config
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use rs_curtains::config::{self, Config};
use rs_curtains::hal::ReqwestTransport;
use rs_curtains::logging::init_logging;
use rs_curtains::registry::DeviceRegistry;
use rs_curtains::services::{connect, run_server, MqttRuntimeConfig, WebServerConfig};
use rs_curtains::traits::RandomNonce;

#[derive(Debug, Parser)]
#[command(author, version, about = "HTTP command API for window coverings")]
struct Cli {
    /// Path to the configuration file
    #[arg(short = 'C', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the effective configuration (after env substitution) and exit
    #[arg(long = "print-config")]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let path = cli.config.unwrap_or_else(config::default_path);
    let config = Config::load(&path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;

    if cli.print_config {
        println!(
            "{}",
            toml::to_string_pretty(&config).context("failed to render config")?
        );
        return Ok(());
    }

    init_logging(Some(&config.log.level));
    info!(config = %path.display(), "rs-curtains starting");

    let (publisher, mqtt) = connect(&MqttRuntimeConfig::from_config(&config.mqtt));
    tokio::spawn(mqtt.run());

    let transport =
        ReqwestTransport::from_config(&config.http).context("failed to build HTTP client")?;

    let registry = DeviceRegistry::from_config(
        &config.devices,
        Arc::new(publisher),
        Arc::new(transport),
        Arc::new(RandomNonce),
    );
    if registry.is_empty() {
        tracing::warn!("no devices configured, every command will be answered with 404");
    }
    info!("{} device(s) registered", registry.len());

    let web = WebServerConfig::from_config(&config.api)
        .with_context(|| format!("invalid API bind address {}", config.api.socket_addr()))?;

    run_server(Arc::new(registry), web, shutdown_signal())
        .await
        .context("command API failed")?;

    info!("rs-curtains stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("unable to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
