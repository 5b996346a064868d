//! grash: HTTP service with graceful shutdown.
//!
//! # Architecture Overview
//!
//! ```text
//!   CONFIG_PATH ──▶ config ──┐            LOG_PATH ──▶ observability
//!                            ▼
//!   SIGINT/SIGTERM ──▶ signals ──▶ ServiceRunner ──▶ http server (GET /)
//!                                        │
//!                                        ▼ on signal
//!                                  Closer.close(deadline)
//!                    ┌──────────────┬────┴─────────┬────────────────┐
//!                    ▼              ▼              ▼                ▼
//!               HTTP server    SQL connect    Redis connect   ...resources
//! ```
//!
//! Run with:
//! `LOG_PATH=./grash.log CONFIG_PATH=./config/config.yaml cargo run`

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use grash::config::load_config;
use grash::lifecycle::{signals, startup, ServiceRunner, TracingReporter};
use grash::observability::logging;
use grash::resources;

#[derive(Parser)]
#[command(name = "grash")]
#[command(about = "HTTP service with coordinated graceful shutdown", long_about = None)]
struct Cli {
    /// YAML configuration file.
    #[arg(long, env = "CONFIG_PATH", default_value = "config/config.yaml")]
    config: PathBuf,

    /// File that receives JSON log lines.
    #[arg(long, env = "LOG_PATH")]
    log_path: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    logging::init(&cli.log_path)?;

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Cannot load config");
            return Err(e.into());
        }
    };

    tracing::info!(
        env = %config.env,
        address = %config.http_server.address,
        shutdown_timeout_ms = config.shutdown_timeout.as_millis() as u64,
        resources = config.resources.len(),
        "Configuration loaded"
    );

    let shutdown = signals::install()?;
    startup::start_metrics(&config.observability)?;
    let listener = startup::bind_listener(&config.http_server).await?;

    let resources = config.resources.clone();
    let runner = ServiceRunner::new(config, Arc::new(TracingReporter))?;
    resources::register_all(runner.closer(), &resources)?;

    if let Err(e) = runner.run(listener, shutdown).await {
        tracing::error!(error = %e, "Shutdown failed");
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
