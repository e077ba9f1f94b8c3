use anyhow::Result;
use clap::Subcommand;

use azdo::OrganizationService;

use super::{track, Context};
use crate::output::{column, Column};

const PROJECT_COLUMNS: [Column; 5] = [
    column("ID", "/id"),
    column("Name", "/name"),
    column("State", "/state"),
    column("Visibility", "/visibility"),
    column("Updated", "/lastUpdateTime"),
];

#[derive(Subcommand)]
pub enum ProjectCommand {
    /// List the projects of the organization
    List,
    /// Show one project by name or id
    Show { name: String },
}

impl ProjectCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let service = OrganizationService::new(ctx.client.clone(), ctx.organization()?);

        match self {
            Self::List => {
                let projects = track("Fetching projects", service.list()).await?;
                ctx.output.emit(&projects, &PROJECT_COLUMNS)
            }
            Self::Show { name } => {
                let project = track("Fetching project", service.project(name)).await?;
                ctx.output.emit(&project, &PROJECT_COLUMNS)
            }
        }
    }
}
