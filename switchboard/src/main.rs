use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod config;
mod logging;
mod metrics;

use config::{Config, ConfigError};

#[derive(Parser)]
#[command(name = "switchboard", version, about = "Back-office automation services")]
struct Cli {
    /// Path to the YAML config file
    #[arg(long, short, default_value = "switchboard.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Serve the catalog group cleanup endpoint
    CatalogCleanup,
    /// Serve the payments console endpoint
    PaymentsConsole,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("config has no `{0}` section")]
    MissingSection(&'static str),
    #[error("invalid `{section}` config: {message}")]
    InvalidConfig {
        section: &'static str,
        message: String,
    },
    #[error(transparent)]
    Metrics(#[from] metrics::MetricsError),
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    CatalogCleanup(#[from] catalog_cleanup::errors::CleanupError),
    #[error(transparent)]
    PaymentsConsole(#[from] payments_console::errors::ConsoleError),
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let config = Config::from_file(&cli.config)?;

    let _sentry = logging::init(config.common.logging.as_ref());
    if let Some(metrics_config) = &config.common.metrics {
        metrics::init(metrics_config)?;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    match cli.command {
        CliCommand::CatalogCleanup => {
            let section = "catalog_cleanup";
            let service_config = config
                .catalog_cleanup
                .ok_or(CliError::MissingSection(section))?;
            service_config
                .validate()
                .map_err(|e| CliError::InvalidConfig {
                    section,
                    message: e.to_string(),
                })?;

            tracing::info!("Starting catalog cleanup");
            runtime.block_on(catalog_cleanup::run(service_config))?;
        }
        CliCommand::PaymentsConsole => {
            let section = "payments_console";
            let service_config = config
                .payments_console
                .ok_or(CliError::MissingSection(section))?;
            service_config
                .validate()
                .map_err(|e| CliError::InvalidConfig {
                    section,
                    message: e.to_string(),
                })?;

            tracing::info!("Starting payments console");
            runtime.block_on(payments_console::run(service_config))?;
        }
    }

    Ok(())
}
