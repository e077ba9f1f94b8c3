use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::AzureClient;
use crate::error::Result;
use crate::types::ListResult;

const API_VERSION: &str = "6.0";

/// Team project of an organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamProject {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Projects of a single organization.
#[derive(Clone, Debug)]
pub struct OrganizationService {
    client: AzureClient,
    organization: String,
}

impl OrganizationService {
    pub fn new(client: AzureClient, organization: impl Into<String>) -> Self {
        Self {
            client,
            organization: organization.into(),
        }
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    pub async fn list(&self) -> Result<Vec<TeamProject>> {
        let url = self.client.org_url(&self.organization, &["_apis", "projects"])?;

        let projects: ListResult<TeamProject> = self
            .client
            .send_json(self.client.request(Method::GET, url, API_VERSION))
            .await?;

        Ok(projects.into_vec())
    }

    /// Fetches one project by name or id.
    pub async fn project(&self, project: &str) -> Result<TeamProject> {
        let url = self
            .client
            .org_url(&self.organization, &["_apis", "projects", project])?;

        self.client
            .send_json(self.client.request(Method::GET, url, API_VERSION))
            .await
    }
}
