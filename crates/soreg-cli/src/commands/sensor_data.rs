//! Sensor data commands

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;
use soreg_registry::Repository;

use super::read_payload;
use crate::output::OutputContext;

#[derive(Subcommand)]
pub enum DataCommand {
    /// Check a reading without storing it
    Validate {
        /// Service object ID
        so_id: String,

        /// Stream name
        stream: String,

        /// Payload file, or `-` for stdin
        payload: PathBuf,
    },

    /// Push a reading to a stream
    Push {
        /// Service object ID
        so_id: String,

        /// Stream name
        stream: String,

        /// Payload file, or `-` for stdin
        payload: PathBuf,
    },

    /// Show readings of a stream
    Get {
        /// Service object ID
        so_id: String,

        /// Stream name
        stream: String,

        /// Query modifier: all, lastUpdate
        #[arg(long)]
        modifier: Option<String>,
    },

    /// Show readings pushed by the current owner
    Owner {
        /// Query modifier: all, lastUpdate
        #[arg(long)]
        modifier: Option<String>,
    },

    /// Remove every reading of a stream
    Remove {
        /// Service object ID
        so_id: String,

        /// Stream name
        stream: String,
    },
}

pub async fn run(
    repo: &Repository,
    owner: &str,
    command: &DataCommand,
    ctx: &OutputContext,
) -> Result<()> {
    match command {
        DataCommand::Validate {
            so_id,
            stream,
            payload,
        } => {
            repo.validate_sensor_data_syntax(owner, so_id, stream, &read_payload(payload)?)
                .await?;
            ctx.success("Sensor data payload is valid");
        }
        DataCommand::Push {
            so_id,
            stream,
            payload,
        } => {
            repo.add_sensor_data(owner, so_id, stream, &read_payload(payload)?)
                .await?;
            ctx.success(&format!("Stored reading for {}/{}", so_id, stream));
        }
        DataCommand::Get {
            so_id,
            stream,
            modifier,
        } => {
            let data = repo
                .get_sensor_data_for_stream(so_id, stream, modifier.as_deref())
                .await?;
            ctx.print(&data)?;
        }
        DataCommand::Owner { modifier } => {
            let data = repo
                .get_sensor_data_for_owner(owner, modifier.as_deref())
                .await?;
            ctx.print(&data)?;
        }
        DataCommand::Remove { so_id, stream } => {
            repo.remove_sensor_data(so_id, stream).await?;
            ctx.success(&format!("Removed readings of {}/{}", so_id, stream));
        }
    }
    Ok(())
}
