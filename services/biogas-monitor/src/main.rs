//! Biogas Monitor CLI
//!
//! Command-line interface for the biogas facility monitoring client.

use std::path::PathBuf;

use biogas_monitor::{load_config, Config, MonitorServiceBuilder};
use clap::Parser;
use tracing::Level;

#[derive(Parser)]
#[command(name = "biogas-monitor")]
#[command(about = "Biogas facility monitoring client and operator dashboard")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend API base URL (overrides config file)
    #[arg(long)]
    api_url: Option<String>,

    /// Dashboard port (overrides config file)
    #[arg(long)]
    dashboard_port: Option<u16>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, api_url={:?}, dashboard_port={:?}, log_level={:?}",
        args.config,
        args.api_url,
        args.dashboard_port,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    if let Some(api_url) = args.api_url {
        config.api.base_url = api_url;
    }
    if let Some(dashboard_port) = args.dashboard_port {
        config.dashboard.port = dashboard_port;
    }

    tracing::info!("Starting biogas monitor");
    tracing::debug!(
        "Sensor every {}s, status every {}s, history {:?}",
        config.polling.sensor_interval_seconds,
        config.polling.status_interval_seconds,
        config.polling.history_cadence()
    );

    MonitorServiceBuilder::new(config).build()?.start().await?;

    Ok(())
}
