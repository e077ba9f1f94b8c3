use anyhow::Result;
use clap::Subcommand;

use azdo::{EntitlementQuery, EntitlementsService};

use super::{track, Context};
use crate::output::{column, Column};

const ENTITLEMENT_COLUMNS: [Column; 5] = [
    column("ID", "/id"),
    column("User", "/user/principalName"),
    column("Name", "/user/displayName"),
    column("License", "/accessLevel/licenseDisplayName"),
    column("Last access", "/lastAccessedDate"),
];

#[derive(Subcommand)]
pub enum EntitlementCommand {
    /// List user entitlements of the organization
    List {
        /// Sections to expand: Projects, Extensions, GroupRules
        #[arg(short, long)]
        select: Option<String>,

        /// Raw filter expression, e.g. "licenseId eq 'Account-Express'"
        #[arg(long, conflicts_with = "user")]
        filter: Option<String>,

        /// Only the user with this principal name
        #[arg(short, long)]
        user: Option<String>,

        #[arg(long)]
        order_by: Option<String>,

        #[arg(long)]
        continuation_token: Option<String>,
    },
    /// Show the entitlement of one user id
    Show { user_id: String },
}

impl EntitlementCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let service = EntitlementsService::new(ctx.client.clone());
        let organization = ctx.organization()?;

        match self {
            Self::List {
                select,
                filter,
                user,
                order_by,
                continuation_token,
            } => {
                let query = EntitlementQuery {
                    organization: organization.to_string(),
                    select: select.clone(),
                    filter: filter.clone(),
                    order_by: order_by.clone(),
                    continuation_token: continuation_token.clone(),
                };
                let query = match user {
                    Some(user) => query.filter_by_name(user),
                    None => query,
                };

                let page = track("Fetching user entitlements", service.user_entitlements(&query))
                    .await?;
                ctx.output.emit(&page.members, &ENTITLEMENT_COLUMNS)
            }
            Self::Show { user_id } => {
                let entitlement =
                    track("Fetching user entitlement", service.user(organization, user_id)).await?;
                ctx.output.emit(&entitlement, &ENTITLEMENT_COLUMNS)
            }
        }
    }
}
