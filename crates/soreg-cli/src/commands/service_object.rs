//! Service Object commands

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;
use soreg_core::{EntityKind, RegistryError};
use soreg_registry::Repository;

use super::read_payload;
use crate::output::OutputContext;

#[derive(Subcommand)]
pub enum ServiceObjectCommand {
    /// Check a payload against the schema without storing it
    Validate {
        /// Payload file, or `-` for stdin
        payload: PathBuf,
    },

    /// Register a service object
    Add {
        /// Payload file, or `-` for stdin
        payload: PathBuf,
    },

    /// Replace a service object's description
    Update {
        /// Service object ID
        id: String,

        /// Payload file, or `-` for stdin
        payload: PathBuf,
    },

    /// Show a service object
    Get {
        /// Service object ID
        id: String,
    },

    /// Remove a service object
    Remove {
        /// Service object ID
        id: String,
    },

    /// List service object IDs of the current owner
    List,

    /// List service object IDs hosted by a gateway
    ListGateway {
        /// Gateway ID
        gateway_id: String,
    },
}

pub async fn run(
    repo: &Repository,
    owner: &str,
    command: &ServiceObjectCommand,
    ctx: &OutputContext,
) -> Result<()> {
    match command {
        ServiceObjectCommand::Validate { payload } => {
            repo.validate_service_object_syntax(owner, &read_payload(payload)?)
                .await?;
            ctx.success("Service object payload is valid");
        }
        ServiceObjectCommand::Add { payload } => {
            let created = repo
                .add_service_object(owner, &read_payload(payload)?)
                .await?;
            ctx.print(&created)?;
        }
        ServiceObjectCommand::Update { id, payload } => {
            let updated = repo
                .update_service_object(id, &read_payload(payload)?)
                .await?;
            ctx.print(&updated)?;
        }
        ServiceObjectCommand::Get { id } => {
            let so = repo
                .get_service_object(id)
                .await?
                .ok_or_else(|| RegistryError::not_found(EntityKind::ServiceObject, id.as_str()))?;
            ctx.print(&so)?;
        }
        ServiceObjectCommand::Remove { id } => {
            repo.remove_service_object(id).await?;
            ctx.success(&format!("Removed service object {}", id));
        }
        ServiceObjectCommand::List => {
            ctx.print(&repo.get_all_so_for_owner(owner).await?)?;
        }
        ServiceObjectCommand::ListGateway { gateway_id } => {
            ctx.print(&repo.get_all_so_for_gateway(gateway_id).await?)?;
        }
    }
    Ok(())
}
