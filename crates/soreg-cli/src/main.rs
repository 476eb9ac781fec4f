//! soreg - administrative CLI for the Service Object registry
//!
//! Seeds and inspects a configured store through the same repository the
//! registry service uses.

mod commands;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use soreg_core::RegistryError;
use soreg_registry::{ConfigError, RegistryConfig, Repository, StorageConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::commands::{DataCommand, GatewayCommand, ServiceObjectCommand};
use crate::output::OutputContext;

const DEFAULT_FILTER: &str = "soreg=info,soreg_registry=info,soreg_store=info";

#[derive(Parser)]
#[command(name = "soreg")]
#[command(author, version, about = "Service Object registry CLI")]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "SOREG_CONFIG")]
    config: Option<PathBuf>,

    /// Caller identity stamped on new entities
    #[arg(long, env = "SOREG_OWNER", default_value = "anonymous")]
    owner: String,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Suppress success messages
    #[arg(short, long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage gateways
    Gateway {
        #[command(subcommand)]
        command: GatewayCommand,
    },

    /// Manage service objects
    So {
        #[command(subcommand)]
        command: ServiceObjectCommand,
    },

    /// Push and query sensor data
    Data {
        #[command(subcommand)]
        command: DataCommand,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into())
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    let ctx = OutputContext::new(cli.no_color, cli.quiet);

    match run(&cli, &ctx).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ctx.error(&format!("Error: {:#}", e));
            ExitCode::from(exit_code(&e))
        }
    }
}

async fn run(cli: &Cli, ctx: &OutputContext) -> Result<()> {
    let config = match &cli.config {
        Some(path) => RegistryConfig::load(path)?,
        None => RegistryConfig::default(),
    };
    if config.storage == StorageConfig::Memory {
        tracing::warn!("Using the in-memory store; nothing will be kept after exit");
    }

    let repo = Repository::from_config(&config).await?;

    match &cli.command {
        Commands::Gateway { command } => {
            commands::gateway::run(&repo, &cli.owner, command, ctx).await
        }
        Commands::So { command } => {
            commands::service_object::run(&repo, &cli.owner, command, ctx).await
        }
        Commands::Data { command } => {
            commands::sensor_data::run(&repo, &cli.owner, command, ctx).await
        }
    }
}

/// 1 for caller errors, 2 for storage and configuration faults
fn exit_code(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<ConfigError>().is_some() {
        return 2;
    }
    match err.downcast_ref::<RegistryError>() {
        Some(RegistryError::Storage(_)) => 2,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soreg_core::{EntityKind, StoreError};

    #[test]
    fn test_cli_parses_nested_commands() {
        let cli = Cli::try_parse_from([
            "soreg", "--owner", "u1", "data", "get", "so1", "s1", "--modifier", "lastUpdate",
        ])
        .unwrap();
        assert_eq!(cli.owner, "u1");
        assert!(matches!(
            cli.command,
            Commands::Data {
                command: DataCommand::Get { .. }
            }
        ));

        let cli = Cli::try_parse_from(["soreg", "so", "list-gateway", "g1"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::So {
                command: ServiceObjectCommand::ListGateway { .. }
            }
        ));
    }

    #[test]
    fn test_exit_codes() {
        let not_found = anyhow::Error::from(RegistryError::not_found(EntityKind::Gateway, "g1"));
        assert_eq!(exit_code(&not_found), 1);

        let no_data = anyhow::Error::from(RegistryError::NoDataFound("x".into()));
        assert_eq!(exit_code(&no_data.context("listing")), 1);

        let storage =
            anyhow::Error::from(RegistryError::Storage(StoreError::Corrupt("bad".into())));
        assert_eq!(exit_code(&storage), 2);

        let config = anyhow::Error::from(RegistryConfig::from_toml("[storage]\nbackend = 1").unwrap_err());
        assert_eq!(exit_code(&config), 2);
    }
}
