use anyhow::{Context as _, Result};
use clap::Subcommand;

use azdo::{ServiceConnectionQuery, ServiceConnectionService};

use super::{track, Context};
use crate::output::{column, Column};

const ENDPOINT_COLUMNS: [Column; 5] = [
    column("ID", "/id"),
    column("Name", "/name"),
    column("Type", "/type"),
    column("Ready", "/isReady"),
    column("URL", "/url"),
];

#[derive(Subcommand)]
pub enum ServiceConnectionCommand {
    /// List service connections of the project
    List {
        /// Endpoint type, e.g. kubernetes
        #[arg(long = "type")]
        endpoint_type: Option<String>,

        #[arg(long = "auth-scheme", value_delimiter = ',')]
        auth_schemes: Vec<String>,

        #[arg(long = "id", value_delimiter = ',')]
        endpoint_ids: Vec<String>,

        /// library or agentcloud
        #[arg(long)]
        owner: Option<String>,

        #[arg(long)]
        include_failed: Option<bool>,

        #[arg(long)]
        include_details: Option<bool>,
    },
    /// Show one service connection by name
    Get { name: String },
}

impl ServiceConnectionCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let service = ServiceConnectionService::new(ctx.client.clone());
        let key = ctx.project_key()?;

        match self {
            Self::List {
                endpoint_type,
                auth_schemes,
                endpoint_ids,
                owner,
                include_failed,
                include_details,
            } => {
                let query = ServiceConnectionQuery {
                    endpoint_type: endpoint_type.clone(),
                    auth_schemes: auth_schemes.clone(),
                    endpoint_ids: endpoint_ids.clone(),
                    endpoint_names: Vec::new(),
                    owner: owner.clone(),
                    include_failed: *include_failed,
                    include_details: *include_details,
                };
                let endpoints =
                    track("Fetching service connections", service.list(&key, &query)).await?;
                ctx.output.emit(&endpoints.value, &ENDPOINT_COLUMNS)
            }
            Self::Get { name } => {
                let endpoint = track("Looking up service connection", service.get_by_name(&key, name))
                    .await?
                    .with_context(|| format!("No service connection named {name}"))?;
                ctx.output.emit(&endpoint, &ENDPOINT_COLUMNS)
            }
        }
    }
}
