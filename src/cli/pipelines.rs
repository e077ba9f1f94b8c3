use anyhow::{bail, Context as _, Result};
use chrono::{DateTime, Utc};
use clap::Subcommand;
use indexmap::IndexMap;
use serde_json::{json, Value};

use azdo::pipelines::{RunResources, DEFAULT_BRANCH, DEFAULT_QUEUE, DEFAULT_YAML_FILENAME};
use azdo::repositories::branch_ref;
use azdo::{BuildQuery, PipelineService, PipelineTemplate, RepositoryService, RunOptions};

use super::{parse_key_value, track, Context};
use crate::output::{column, Column};

const PIPELINE_COLUMNS: [Column; 4] = [
    column("ID", "/id"),
    column("Name", "/name"),
    column("Folder", "/folder"),
    column("Revision", "/revision"),
];

const DEFINITION_COLUMNS: [Column; 4] = [
    column("ID", "/id"),
    column("Name", "/name"),
    column("Path", "/path"),
    column("Revision", "/revision"),
];

const RUN_COLUMNS: [Column; 4] = [
    column("ID", "/id"),
    column("Name", "/name"),
    column("State", "/state"),
    column("Created", "/createdDate"),
];

const BUILD_COLUMNS: [Column; 7] = [
    column("ID", "/id"),
    column("Number", "/buildNumber"),
    column("Definition", "/definition/name"),
    column("Branch", "/sourceBranch"),
    column("Status", "/status"),
    column("Result", "/result"),
    column("Finished", "/finishTime"),
];

const RECORD_COLUMNS: [Column; 6] = [
    column("Type", "/type"),
    column("Name", "/name"),
    column("State", "/state"),
    column("Result", "/result"),
    column("Errors", "/errorCount"),
    column("Warnings", "/warningCount"),
];

#[derive(Subcommand)]
pub enum PipelineCommand {
    /// List the pipelines of the project
    List,
    /// Show the pipeline named after a repository
    Get { repository: String },
    /// Create a YAML build definition for a repository
    Create {
        repository: String,

        #[arg(long, default_value = DEFAULT_YAML_FILENAME)]
        yaml_filename: String,

        #[arg(long, default_value = DEFAULT_BRANCH)]
        default_branch: String,

        #[arg(long, default_value = DEFAULT_QUEUE)]
        queue: String,
    },
    /// Show the build definition of a repository's pipeline
    Definition { repository: String },
    /// Rename the pipeline of a repository
    Rename { repository: String, new_name: String },
    /// Delete the pipeline of a repository
    Remove {
        repository: String,

        /// Fail on non-2xx responses instead of reporting the status
        #[arg(long, default_value_t = false)]
        fail_on_error: bool,
    },
    /// Queue a run of the pipeline of a repository
    Run {
        repository: String,

        /// Branch (or full ref) to build
        #[arg(short, long)]
        branch: Option<String>,

        #[arg(long = "skip-stage")]
        stages_to_skip: Vec<String>,

        /// Pipeline variable, KEY=VALUE
        #[arg(long = "var", value_parser = parse_key_value)]
        variables: Vec<(String, String)>,

        /// Template parameter, KEY=VALUE
        #[arg(long = "param", value_parser = parse_key_value)]
        parameters: Vec<(String, String)>,
    },
    /// List builds
    Builds {
        /// Definition ids
        #[arg(short, long, value_delimiter = ',')]
        definitions: Vec<u32>,

        /// Build ids
        #[arg(long = "id", value_delimiter = ',')]
        build_ids: Vec<u64>,

        #[arg(short, long)]
        branch: Option<String>,

        #[arg(long)]
        status: Option<String>,

        #[arg(long)]
        result: Option<String>,

        #[arg(long)]
        requested_for: Option<String>,

        /// RFC 3339 lower bound of the build time
        #[arg(long)]
        since: Option<DateTime<Utc>>,

        #[arg(long)]
        until: Option<DateTime<Utc>>,

        #[arg(long)]
        top: Option<u32>,

        #[arg(long)]
        continuation_token: Option<String>,
    },
    /// Show the timeline records of a build
    Timeline {
        build_id: u64,

        /// Only records of this type (Stage, Job, Task...)
        #[arg(long = "type")]
        record_type: Option<String>,

        /// Only failed records
        #[arg(long, default_value_t = false)]
        failed: bool,
    },
}

impl PipelineCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let service = PipelineService::new(ctx.client.clone());

        match self {
            Self::List => {
                let key = ctx.project_key()?;
                let pipelines = track("Fetching pipelines", service.list(&key)).await?;
                ctx.output.emit(&pipelines.value, &PIPELINE_COLUMNS)
            }
            Self::Get { repository } => {
                let key = ctx.repository_key(repository)?;
                let pipeline = track("Looking up pipeline", service.get_by_repo_name(&key))
                    .await?
                    .with_context(|| format!("No pipeline named {repository}"))?;
                ctx.output.emit(&pipeline, &PIPELINE_COLUMNS)
            }
            Self::Create {
                repository,
                yaml_filename,
                default_branch,
                queue,
            } => {
                let key = ctx.repository_key(repository)?;
                let service = service
                    .with_repositories(RepositoryService::new(ctx.client.clone()))
                    .with_template(PipelineTemplate {
                        yaml_filename: yaml_filename.clone(),
                        default_branch: branch_ref(default_branch),
                        queue: queue.clone(),
                    });
                let definition = track("Creating build definition", service.create(&key))
                    .await?
                    .context("Build definition was not created")?;
                ctx.output.emit(&definition, &DEFINITION_COLUMNS)
            }
            Self::Definition { repository } => {
                let key = ctx.repository_key(repository)?;
                let definition = track("Fetching build definition", service.definition(&key))
                    .await?
                    .with_context(|| format!("No pipeline named {repository}"))?;
                ctx.output.emit(&definition, &DEFINITION_COLUMNS)
            }
            Self::Rename {
                repository,
                new_name,
            } => {
                let key = ctx.repository_key(repository)?;
                let definition = track("Renaming pipeline", service.rename(new_name, &key))
                    .await?
                    .with_context(|| format!("No pipeline named {repository}"))?;
                ctx.output.emit(&definition, &DEFINITION_COLUMNS)
            }
            Self::Remove {
                repository,
                fail_on_error,
            } => {
                let key = ctx.repository_key(repository)?;
                let status = track("Deleting pipeline", service.remove(&key, *fail_on_error))
                    .await?
                    .with_context(|| format!("No pipeline named {repository}"))?;
                ctx.output.emit(&json!({ "status": status.as_u16() }), &[])
            }
            Self::Run {
                repository,
                branch,
                stages_to_skip,
                variables,
                parameters,
            } => {
                let key = ctx.repository_key(repository)?;
                let options = run_options(branch.as_deref(), stages_to_skip, variables, parameters);
                let run = track("Queueing pipeline run", service.run(&key, &options))
                    .await?
                    .with_context(|| format!("No pipeline named {repository}"))?;
                ctx.output.emit(&run, &RUN_COLUMNS)
            }
            Self::Builds {
                definitions,
                build_ids,
                branch,
                status,
                result,
                requested_for,
                since,
                until,
                top,
                continuation_token,
            } => {
                let key = ctx.project_key()?;
                let query = BuildQuery {
                    definitions: non_empty(definitions),
                    build_ids: non_empty(build_ids),
                    branch_name: branch.as_deref().map(branch_ref),
                    status_filter: status.clone(),
                    result_filter: result.clone(),
                    requested_for: requested_for.clone(),
                    min_time: *since,
                    max_time: *until,
                    top: *top,
                    continuation_token: continuation_token.clone(),
                    ..BuildQuery::default()
                };
                let Some(builds) = service.builds(&key, &query).await else {
                    bail!("Failed to fetch builds, rerun with RUST_LOG=error for details");
                };
                ctx.output.emit(&builds.value, &BUILD_COLUMNS)
            }
            Self::Timeline {
                build_id,
                record_type,
                failed,
            } => {
                let key = ctx.project_key()?;
                let Some(timeline) = service.timeline(&key, *build_id).await else {
                    bail!("Failed to fetch the timeline of build {build_id}");
                };
                let mut records = match record_type {
                    Some(record_type) => timeline.records_of_type(record_type),
                    None if *failed => timeline.failed_records(),
                    None => timeline.records.iter().collect(),
                };
                if *failed {
                    records.retain(|r| r.result.as_deref() == Some("failed"));
                }
                ctx.output.emit(&records, &RECORD_COLUMNS)
            }
        }
    }
}

fn run_options(
    branch: Option<&str>,
    stages_to_skip: &[String],
    variables: &[(String, String)],
    parameters: &[(String, String)],
) -> RunOptions {
    RunOptions {
        stages_to_skip: stages_to_skip.to_vec(),
        resources: branch.map(|b| RunResources::for_ref(branch_ref(b))),
        variables: variables
            .iter()
            .map(|(name, value)| (name.clone(), json!({ "value": value })))
            .collect::<IndexMap<String, Value>>(),
        template_parameters: parameters
            .iter()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect(),
    }
}

fn non_empty<T: Clone>(items: &[T]) -> Option<Vec<T>> {
    (!items.is_empty()).then(|| items.to_vec())
}
