use anyhow::{Context as _, Result};
use clap::Subcommand;
use log::info;
use serde_json::json;
use std::path::PathBuf;

use azdo::{GitPush, RepositoryService};

use super::{track, Context};
use crate::output::{column, Column};

const REPOSITORY_COLUMNS: [Column; 5] = [
    column("ID", "/id"),
    column("Name", "/name"),
    column("Default branch", "/defaultBranch"),
    column("Size", "/size"),
    column("URL", "/webUrl"),
];

const ITEM_COLUMNS: [Column; 3] = [
    column("Path", "/path"),
    column("Object", "/objectId"),
    column("Commit", "/commitId"),
];

const PUSH_COLUMNS: [Column; 2] = [column("Push", "/pushId"), column("Ref", "/refUpdates/0/name")];

#[derive(Subcommand)]
pub enum RepoCommand {
    /// List the repositories of the project
    List,
    /// Show one repository
    Info { repository: String },
    /// Fetch a file at the tip of a branch
    Item {
        repository: String,
        path: String,

        /// Branch name, e.g. master
        #[arg(short, long)]
        branch: String,
    },
    /// Replace a file's content with a single commit on a branch
    EditFile {
        repository: String,
        path: String,

        /// Local file holding the new content
        #[arg(long)]
        file: PathBuf,

        /// Branch name, e.g. master
        #[arg(short, long)]
        branch: String,

        #[arg(short, long, default_value = "Update file")]
        message: String,
    },
    /// Create an empty repository
    Create { repository: String },
    /// Rename a repository
    Rename { repository: String, new_name: String },
    /// Delete a repository
    Remove { repository: String },
}

impl RepoCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let service = RepositoryService::new(ctx.client.clone());

        match self {
            Self::List => {
                let key = ctx.project_key()?;
                let repositories = track("Fetching repositories", service.list(&key)).await?;
                ctx.output.emit(&repositories, &REPOSITORY_COLUMNS)
            }
            Self::Info { repository } => {
                let key = ctx.repository_key(repository)?;
                let repository = track("Fetching repository", service.info(&key)).await?;
                ctx.output.emit(&repository, &REPOSITORY_COLUMNS)
            }
            Self::Item {
                repository,
                path,
                branch,
            } => {
                let key = ctx.repository_key(repository)?;
                let item = track("Fetching item", service.item(path, branch, &key)).await?;
                ctx.output.emit(&item, &ITEM_COLUMNS)
            }
            Self::EditFile {
                repository,
                path,
                file,
                branch,
                message,
            } => {
                let key = ctx.repository_key(repository)?;
                let content = std::fs::read_to_string(file)
                    .with_context(|| format!("Failed to read {}", file.display()))?;

                let item = track("Fetching item", service.item(path, branch, &key)).await?;
                let head = item
                    .commit_id
                    .with_context(|| format!("No commit id returned for {path} on {branch}"))?;
                info!("Editing {path} on {branch} at {head}");

                let push = GitPush::edit_file(branch, &head, path, content, message.as_str());
                let pushed = track("Pushing commit", service.push(&push, &key)).await?;
                ctx.output.emit(&pushed, &PUSH_COLUMNS)
            }
            Self::Create { repository } => {
                let key = ctx.repository_key(repository)?;
                let created = track("Creating repository", service.create(&key)).await?;
                ctx.output.emit(&created, &REPOSITORY_COLUMNS)
            }
            Self::Rename {
                repository,
                new_name,
            } => {
                let key = ctx.repository_key(repository)?;
                let renamed = track("Renaming repository", service.rename(new_name, &key)).await?;
                ctx.output.emit(&renamed, &REPOSITORY_COLUMNS)
            }
            Self::Remove { repository } => {
                let key = ctx.repository_key(repository)?;
                let status = track("Deleting repository", service.remove(&key)).await?;
                ctx.output.emit(&json!({ "status": status.as_u16() }), &[])
            }
        }
    }
}
