//! weave-agent - logweave log enrichment agent
//!
//! Tails application log streams, reassembles multiline records, extracts
//! structured fields (including the request correlation id), and ships
//! enriched records to configured sinks.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use weave_agent::config::AgentConfig;
use weave_agent::runtime;

#[derive(Parser)]
#[command(name = "weave-agent")]
#[command(about = "logweave log enrichment agent")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the enrichment pipeline
    Run {
        /// Path to config file
        #[arg(short, long, default_value = "/etc/logweave/config.toml")]
        config: PathBuf,
    },

    /// Validate a config file and exit
    CheckConfig {
        /// Path to config file
        #[arg(short, long, default_value = "/etc/logweave/config.toml")]
        config: PathBuf,
    },

    /// Generate a sample config file
    InitConfig {
        /// Path to write config
        #[arg(short, long, default_value = "/etc/logweave/config.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("weave_agent=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => {
            run_pipeline(config).await?;
        }

        Commands::CheckConfig { config } => {
            let loaded = AgentConfig::from_file(&config)?;
            info!(
                config = %config.display(),
                sources = loaded.sources.len(),
                sinks = loaded.sinks.len(),
                parsers = loaded.pipeline.parsers.len(),
                "configuration is valid"
            );
        }

        Commands::InitConfig { output } => {
            init_config(&output)?;
        }
    }

    Ok(())
}

async fn run_pipeline(config_path: PathBuf) -> anyhow::Result<()> {
    info!(config = %config_path.display(), "starting weave-agent");
    let config = AgentConfig::from_file(&config_path)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received, flushing open records");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => warn!(error = %e, "failed to listen for shutdown signal"),
        }
    });

    let snapshot = runtime::run(config, shutdown_rx).await?;
    info!(
        delivered = snapshot.delivered,
        dead_lettered = snapshot.dead_lettered,
        "weave-agent exiting"
    );
    Ok(())
}

fn init_config(output: &std::path::Path) -> anyhow::Result<()> {
    if output.exists() {
        anyhow::bail!("refusing to overwrite existing config at '{}'", output.display());
    }
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let sample = AgentConfig::sample().to_toml()?;
    std::fs::write(output, sample)?;
    info!(output = %output.display(), "sample configuration written");
    Ok(())
}
