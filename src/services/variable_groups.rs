use indexmap::IndexMap;
use log::info;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::{comma_join, json_body, AzureClient};
use crate::error::{AzdoError, Result};
use crate::types::{ListResult, ProjectKey, ProjectReference, RepositoryKey};

const API_VERSION: &str = "6.0-preview.2";

/// Library variable group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableGroup {
    pub id: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub group_type: Option<String>,
    #[serde(default)]
    pub variables: IndexMap<String, VariableValue>,
    #[serde(default)]
    pub variable_group_project_references: Vec<VariableGroupProjectReference>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VariableGroup {
    /// Ids of the projects the group is shared with.
    pub fn project_ids(&self) -> Vec<&str> {
        self.variable_group_project_references
            .iter()
            .filter_map(|r| r.project_reference.as_ref())
            .map(|p| p.id.as_str())
            .collect()
    }
}

/// Value of one variable. Secret values come back as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableValue {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_secret: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableGroupProjectReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_reference: Option<ProjectReference>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Variable groups of the pipelines library.
///
/// Like pipelines, groups are matched by the repository name they belong to.
#[derive(Clone, Debug)]
pub struct VariableGroupService {
    client: AzureClient,
}

impl VariableGroupService {
    pub fn new(client: AzureClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, key: &ProjectKey) -> Result<ListResult<VariableGroup>> {
        let url = self.client.project_url(
            &key.organization,
            &key.project,
            &["_apis", "distributedtask", "variablegroups"],
        )?;

        self.client
            .send_json(self.client.request(Method::GET, url, API_VERSION))
            .await
    }

    /// Finds the group named exactly like the repository.
    pub async fn get_by_repo_name(&self, key: &RepositoryKey) -> Result<Option<VariableGroup>> {
        let groups = self.list(&key.project_key()).await?;

        Ok(groups
            .value
            .into_iter()
            .find(|group| group.name == key.repository))
    }

    /// Fetches the group named like the repository through its own endpoint.
    pub async fn distributed_task(&self, key: &RepositoryKey) -> Result<Option<VariableGroup>> {
        let Some(group) = self.get_by_repo_name(key).await? else {
            info!("No variable group named {} in {}", key.repository, key.project);
            return Ok(None);
        };

        let id = group.id.to_string();
        let url = self.client.project_url(
            &key.organization,
            &key.project,
            &["_apis", "distributedtask", "variablegroups", &id],
        )?;

        self.client
            .send_json(self.client.request(Method::GET, url, API_VERSION))
            .await
            .map(Some)
    }

    /// Renames the group and the project references that carry its name.
    pub async fn rename(&self, new_name: &str, key: &RepositoryKey) -> Result<Option<VariableGroup>> {
        let Some(mut group) = self.get_by_repo_name(key).await? else {
            return Ok(None);
        };

        let id = group.id.to_string();
        let url = self.client.org_url(
            &key.organization,
            &["_apis", "distributedtask", "variablegroups", &id],
        )?;

        info!("Renaming variable group {} to {new_name}", group.name);

        for reference in &mut group.variable_group_project_references {
            if reference.name.as_deref() == Some(group.name.as_str()) {
                reference.name = Some(new_name.to_string());
            }
        }
        group.name = new_name.to_string();

        let request = json_body(self.client.request(Method::PUT, url, API_VERSION), &group)?;
        self.client.send_json(request).await.map(Some)
    }

    /// Deletes the group from every project it is shared with.
    pub async fn remove(&self, key: &RepositoryKey) -> Result<Option<StatusCode>> {
        let Some(group) = self.get_by_repo_name(key).await? else {
            return Ok(None);
        };

        let project_ids = group.project_ids();
        if project_ids.is_empty() {
            return Err(AzdoError::NotFound(format!(
                "project references of variable group {}",
                group.name
            )));
        }

        let id = group.id.to_string();
        let url = self.client.org_url(
            &key.organization,
            &["_apis", "distributedtask", "variablegroups", &id],
        )?;

        info!("Deleting variable group {} ({})", group.name, group.id);

        let request = self
            .client
            .request(Method::DELETE, url, API_VERSION)
            .query(&[("projectIds", comma_join(&project_ids))]);

        self.client.send_status(request, true).await.map(Some)
    }
}
