mod types;

use log::info;
use reqwest::{Method, StatusCode};
use serde_json::json;

pub use types::{
    branch_ref, ChangeType, ContentType, GitChange, GitChangeItem, GitCommit, GitItem, GitPush,
    GitRefUpdate, NewContent, Repository,
};

use crate::client::{json_body, AzureClient};
use crate::error::Result;
use crate::types::{ListResult, ProjectKey, RepositoryKey};

const API_VERSION: &str = "6.0";

/// Git repositories of a project.
#[derive(Clone, Debug)]
pub struct RepositoryService {
    client: AzureClient,
}

impl RepositoryService {
    pub fn new(client: AzureClient) -> Self {
        Self { client }
    }

    /// Fetches a repository by name or id.
    pub async fn info(&self, key: &RepositoryKey) -> Result<Repository> {
        let url = self.client.project_url(
            &key.organization,
            &key.project,
            &["_apis", "git", "repositories", &key.repository],
        )?;

        self.client
            .send_json(self.client.request(Method::GET, url, API_VERSION))
            .await
    }

    pub async fn list(&self, key: &ProjectKey) -> Result<Vec<Repository>> {
        let url = self.client.project_url(
            &key.organization,
            &key.project,
            &["_apis", "git", "repositories"],
        )?;

        let result: ListResult<Repository> = self
            .client
            .send_json(self.client.request(Method::GET, url, API_VERSION))
            .await?;

        Ok(result.into_vec())
    }

    /// Fetches a file with its content at the tip of `branch`.
    pub async fn item(&self, path: &str, branch: &str, key: &RepositoryKey) -> Result<GitItem> {
        let url = self.client.project_url(
            &key.organization,
            &key.project,
            &["_apis", "git", "repositories", &key.repository, "items"],
        )?;

        let request = self.client.request(Method::GET, url, API_VERSION).query(&[
            ("path", path),
            ("versionDescriptor.version", branch),
            ("versionDescriptor.versionType", "branch"),
            ("includeContent", "true"),
            ("$format", "json"),
        ]);

        self.client.send_json(request).await
    }

    pub async fn push(&self, push: &GitPush, key: &RepositoryKey) -> Result<GitPush> {
        let url = self.client.project_url(
            &key.organization,
            &key.project,
            &["_apis", "git", "repositories", &key.repository, "pushes"],
        )?;

        let request = json_body(self.client.request(Method::POST, url, API_VERSION), push)?;
        self.client.send_json(request).await
    }

    /// Creates an empty repository named after `key.repository`.
    pub async fn create(&self, key: &RepositoryKey) -> Result<Repository> {
        let url = self.client.project_url(
            &key.organization,
            &key.project,
            &["_apis", "git", "repositories"],
        )?;

        info!("Creating repository {}/{}", key.project, key.repository);

        let request = json_body(
            self.client.request(Method::POST, url, API_VERSION),
            &json!({ "name": key.repository }),
        )?;
        self.client.send_json(request).await
    }

    pub async fn rename(&self, new_name: &str, key: &RepositoryKey) -> Result<Repository> {
        let repository = self.info(key).await?;
        let url = self.client.project_url(
            &key.organization,
            &key.project,
            &["_apis", "git", "repositories", &repository.id],
        )?;

        info!("Renaming repository {} to {new_name}", repository.name);

        let request = json_body(
            self.client.request(Method::PATCH, url, API_VERSION),
            &json!({ "name": new_name }),
        )?;
        self.client.send_json(request).await
    }

    pub async fn remove(&self, key: &RepositoryKey) -> Result<StatusCode> {
        let repository = self.info(key).await?;
        let url = self.client.project_url(
            &key.organization,
            &key.project,
            &["_apis", "git", "repositories", &repository.id],
        )?;

        info!("Deleting repository {} ({})", repository.name, repository.id);

        self.client
            .send_status(self.client.request(Method::DELETE, url, API_VERSION), true)
            .await
    }
}
