//! Kaudit - Kubernetes audit event reader
//!
//! # Usage
//!
//! ```bash
//! # Read an audit log file until EOF
//! kaudit /var/log/kube-apiserver/audit.log
//!
//! # Serve the audit webhook and print events as they arrive
//! kaudit http://0.0.0.0:9765/k8s-audit --config kaudit.toml
//! ```

mod output;
mod run;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use kaudit_config::{Config, LogConfig, LogFormat, LogOutput};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Kaudit - Kubernetes audit event reader
#[derive(Parser, Debug)]
#[command(name = "kaudit")]
#[command(version, about, long_about = None)]
struct Cli {
    /// File path, or http(s)://host:port/path to serve the audit webhook
    params: String,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter directive (e.g. debug); overrides the config
    #[arg(short, long)]
    log_level: Option<String>,

    /// Stop after printing this many events
    #[arg(long)]
    max_events: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => Config::default(),
    };

    let level = cli
        .log_level
        .as_deref()
        .unwrap_or(config.log.level.as_str());
    init_logging(level, &config.log)?;

    run::run(&cli.params, run::source_options(&config), cli.max_events).await
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str, log: &LogConfig) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let registry = tracing_subscriber::registry().with(filter);
    match (log.format, log.output) {
        (LogFormat::Console, LogOutput::Stderr) => registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init(),
        (LogFormat::Console, LogOutput::Stdout) => {
            registry.with(fmt::layer().with_target(true)).init()
        }
        (LogFormat::Json, LogOutput::Stderr) => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        (LogFormat::Json, LogOutput::Stdout) => registry.with(fmt::layer().json()).init(),
    }

    Ok(())
}
