mod template;
mod types;

use log::{error, info, warn};
use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::{Method, StatusCode};

pub use template::{PipelineTemplate, DEFAULT_BRANCH, DEFAULT_QUEUE, DEFAULT_YAML_FILENAME};
pub use types::{
    Build, BuildDefinition, BuildQuery, DefinitionReference, LogReference, PipelineInfo,
    PipelineRun, RepositoryRefName, RunOptions, RunRepositories, RunResources, Timeline,
    TimelineRecord,
};

use crate::client::{json_body, AzureClient};
use crate::error::Result;
use crate::services::repositories::RepositoryService;
use crate::types::{ListResult, ProjectKey, RepositoryKey};

use types::RunRequest;

const PIPELINES_API_VERSION: &str = "7.0";
const CREATE_DEFINITION_API_VERSION: &str = "5.0";
const DEFINITION_API_VERSION: &str = "6.0-preview.7";
const BUILDS_API_VERSION: &str = "6.0-preview";

/// Pipelines, build definitions and builds.
///
/// Pipelines are looked up by the name of the repository they build, so
/// most operations take a [`RepositoryKey`] and first resolve the pipeline
/// with that name. When no pipeline matches, the operation yields `None`
/// without issuing the follow-up request.
#[derive(Clone, Debug)]
pub struct PipelineService {
    client: AzureClient,
    repositories: Option<RepositoryService>,
    template: PipelineTemplate,
}

impl PipelineService {
    pub fn new(client: AzureClient) -> Self {
        Self {
            client,
            repositories: None,
            template: PipelineTemplate::default(),
        }
    }

    /// Attaches the repository service needed by [`PipelineService::create`].
    pub fn with_repositories(mut self, repositories: RepositoryService) -> Self {
        self.repositories = Some(repositories);
        self
    }

    pub fn with_template(mut self, template: PipelineTemplate) -> Self {
        self.template = template;
        self
    }

    pub async fn list(&self, key: &ProjectKey) -> Result<ListResult<PipelineInfo>> {
        let url = self
            .client
            .project_url(&key.organization, &key.project, &["_apis", "pipelines"])?;

        self.client
            .send_json(self.client.request(Method::GET, url, PIPELINES_API_VERSION))
            .await
    }

    /// Finds the pipeline named exactly like the repository.
    pub async fn get_by_repo_name(&self, key: &RepositoryKey) -> Result<Option<PipelineInfo>> {
        let pipelines = self.list(&key.project_key()).await?;

        Ok(pipelines
            .value
            .into_iter()
            .find(|pipeline| pipeline.name == key.repository))
    }

    /// Creates a YAML build definition for the repository.
    ///
    /// Returns `None` when no repository service is attached.
    pub async fn create(&self, key: &RepositoryKey) -> Result<Option<BuildDefinition>> {
        let Some(repositories) = &self.repositories else {
            warn!(
                "Cannot create pipeline for {}: no repository service attached",
                key.repository
            );
            return Ok(None);
        };

        let repository = repositories.info(key).await?;
        let url = self.client.project_url(
            &key.organization,
            &repository.project.id,
            &["_apis", "build", "definitions"],
        )?;

        info!("Creating pipeline for repository {} ({})", repository.name, repository.id);

        let request = json_body(
            self.client
                .request(Method::POST, url, CREATE_DEFINITION_API_VERSION),
            &self.template.payload(&repository),
        )?;

        self.client.send_json(request).await.map(Some)
    }

    /// Fetches the full build definition at its latest revision.
    pub async fn definition(&self, key: &RepositoryKey) -> Result<Option<BuildDefinition>> {
        let Some(pipeline) = self.get_by_repo_name(key).await? else {
            info!("No pipeline named {} in {}", key.repository, key.project);
            return Ok(None);
        };

        let id = pipeline.id.to_string();
        let url = self.client.project_url(
            &key.organization,
            &key.project,
            &["_apis", "build", "definitions", &id],
        )?;

        let mut request = self
            .client
            .request(Method::GET, url, DEFINITION_API_VERSION);
        if let Some(revision) = pipeline.revision {
            request = request.query(&[("revision", revision)]);
        }

        self.client.send_json(request).await.map(Some)
    }

    /// Renames the build definition, sending the rest of it back unchanged.
    pub async fn rename(
        &self,
        new_name: &str,
        key: &RepositoryKey,
    ) -> Result<Option<BuildDefinition>> {
        let Some(mut definition) = self.definition(key).await? else {
            return Ok(None);
        };

        let url = self.definition_url(key, definition.id)?;
        info!("Renaming pipeline {} to {new_name}", definition.name);
        definition.name = new_name.to_string();

        let request = json_body(
            self.client.request(Method::PUT, url, DEFINITION_API_VERSION),
            &definition,
        )?;

        self.client.send_json(request).await.map(Some)
    }

    /// Deletes the build definition.
    ///
    /// With `fail_on_error` unset, error statuses are returned instead of
    /// raised.
    pub async fn remove(&self, key: &RepositoryKey, fail_on_error: bool) -> Result<Option<StatusCode>> {
        let Some(definition) = self.definition(key).await? else {
            return Ok(None);
        };

        let url = self.definition_url(key, definition.id)?;
        info!("Deleting pipeline {} ({})", definition.name, definition.id);

        self.client
            .send_status(
                self.client.request(Method::DELETE, url, DEFINITION_API_VERSION),
                fail_on_error,
            )
            .await
            .map(Some)
    }

    /// Queues a run of the pipeline.
    pub async fn run(&self, key: &RepositoryKey, options: &RunOptions) -> Result<Option<PipelineRun>> {
        let Some(definition) = self.definition(key).await? else {
            return Ok(None);
        };

        let id = definition.id.to_string();
        let url = self.client.project_url(
            &key.organization,
            &key.project,
            &["_apis", "pipelines", &id, "runs"],
        )?;

        info!("Queueing run of pipeline {} ({})", definition.name, definition.id);

        let request = json_body(
            self.client.request(Method::POST, url, PIPELINES_API_VERSION),
            &RunRequest::new(options),
        )?;

        self.client.send_json(request).await.map(Some)
    }

    /// Queries builds of the project. Failures are logged and yield `None`.
    pub async fn builds(&self, key: &ProjectKey, query: &BuildQuery) -> Option<ListResult<Build>> {
        let result: Result<ListResult<Build>> = async {
            let url = self.client.project_url(
                &key.organization,
                &key.project,
                &["_apis", "build", "builds"],
            )?;

            let request = self
                .client
                .request(Method::GET, url, BUILDS_API_VERSION)
                .query(&query.to_query())
                .header(ACCEPT, HeaderValue::from_static("application/json"));

            self.client.send_json(request).await
        }
        .await;

        result
            .map_err(|e| error!("Failed to query builds of {}/{}: {e}", key.organization, key.project))
            .ok()
    }

    /// Fetches the timeline of a build. Failures are logged and yield `None`.
    pub async fn timeline(&self, key: &ProjectKey, build_id: u64) -> Option<Timeline> {
        let result: Result<Timeline> = async {
            let id = build_id.to_string();
            let url = self.client.project_url(
                &key.organization,
                &key.project,
                &["_apis", "build", "builds", &id, "Timeline"],
            )?;

            let request = self
                .client
                .request(Method::GET, url, BUILDS_API_VERSION)
                .header(ACCEPT, HeaderValue::from_static("application/json"));

            self.client.send_json(request).await
        }
        .await;

        result
            .map_err(|e| error!("Failed to fetch timeline of build {build_id}: {e}"))
            .ok()
    }

    fn definition_url(&self, key: &RepositoryKey, definition_id: u32) -> Result<url::Url> {
        let id = definition_id.to_string();
        self.client.project_url(
            &key.organization,
            &key.project,
            &["_apis", "build", "definitions", &id],
        )
    }
}
