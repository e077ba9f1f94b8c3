use anyhow::{Context as _, Result};
use clap::Subcommand;
use serde_json::json;

use azdo::VariableGroupService;

use super::{track, Context};
use crate::output::{column, Column};

const GROUP_COLUMNS: [Column; 4] = [
    column("ID", "/id"),
    column("Name", "/name"),
    column("Type", "/type"),
    column("Description", "/description"),
];

#[derive(Subcommand)]
pub enum VariableGroupCommand {
    /// List the variable groups of the project
    List,
    /// Show the group named after a repository, from the listing
    Get { repository: String },
    /// Fetch the group named after a repository through its own endpoint
    Show { repository: String },
    /// Rename the group named after a repository
    Rename { repository: String, new_name: String },
    /// Delete the group named after a repository
    Remove { repository: String },
}

impl VariableGroupCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let service = VariableGroupService::new(ctx.client.clone());

        match self {
            Self::List => {
                let key = ctx.project_key()?;
                let groups = track("Fetching variable groups", service.list(&key)).await?;
                ctx.output.emit(&groups.value, &GROUP_COLUMNS)
            }
            Self::Get { repository } => {
                let key = ctx.repository_key(repository)?;
                let group = track("Looking up variable group", service.get_by_repo_name(&key))
                    .await?
                    .with_context(|| format!("No variable group named {repository}"))?;
                ctx.output.emit(&group, &GROUP_COLUMNS)
            }
            Self::Show { repository } => {
                let key = ctx.repository_key(repository)?;
                let group = track("Fetching variable group", service.distributed_task(&key))
                    .await?
                    .with_context(|| format!("No variable group named {repository}"))?;
                ctx.output.emit(&group, &GROUP_COLUMNS)
            }
            Self::Rename {
                repository,
                new_name,
            } => {
                let key = ctx.repository_key(repository)?;
                let group = track("Renaming variable group", service.rename(new_name, &key))
                    .await?
                    .with_context(|| format!("No variable group named {repository}"))?;
                ctx.output.emit(&group, &GROUP_COLUMNS)
            }
            Self::Remove { repository } => {
                let key = ctx.repository_key(repository)?;
                let status = track("Deleting variable group", service.remove(&key))
                    .await?
                    .with_context(|| format!("No variable group named {repository}"))?;
                ctx.output.emit(&json!({ "status": status.as_u16() }), &[])
            }
        }
    }
}
