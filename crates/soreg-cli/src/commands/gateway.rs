//! Gateway commands

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;
use soreg_core::{EntityKind, RegistryError};
use soreg_registry::Repository;

use super::read_payload;
use crate::output::OutputContext;

#[derive(Subcommand)]
pub enum GatewayCommand {
    /// Register a gateway from a JSON payload
    Add {
        /// Payload file, or `-` for stdin
        payload: PathBuf,
    },

    /// Replace a gateway's description
    Update {
        /// Gateway ID
        id: String,

        /// Payload file, or `-` for stdin
        payload: PathBuf,
    },

    /// Show a gateway
    Get {
        /// Gateway ID
        id: String,
    },

    /// Remove a gateway and detach its service objects
    Remove {
        /// Gateway ID
        id: String,
    },

    /// List gateway IDs of the current owner
    List,
}

pub async fn run(
    repo: &Repository,
    owner: &str,
    command: &GatewayCommand,
    ctx: &OutputContext,
) -> Result<()> {
    match command {
        GatewayCommand::Add { payload } => {
            let id = repo.add_gateway(owner, &read_payload(payload)?).await?;
            ctx.print(&serde_json::json!({ "gatewayID": id }))?;
        }
        GatewayCommand::Update { id, payload } => {
            let id = repo.update_gateway(id, &read_payload(payload)?).await?;
            ctx.print(&serde_json::json!({ "gatewayID": id }))?;
        }
        GatewayCommand::Get { id } => {
            let gateway = repo
                .get_gateway(id)
                .await?
                .ok_or_else(|| RegistryError::not_found(EntityKind::Gateway, id.as_str()))?;
            ctx.print(&gateway)?;
        }
        GatewayCommand::Remove { id } => {
            repo.remove_gateway(id).await?;
            ctx.success(&format!("Removed gateway {}", id));
        }
        GatewayCommand::List => {
            ctx.print(&repo.get_all_gateways_for_owner(owner).await?)?;
        }
    }
    Ok(())
}
