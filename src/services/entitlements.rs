use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::AzureClient;
use crate::error::Result;

const API_VERSION: &str = "6.0-preview.3";

/// Filters for the user entitlements listing.
///
/// `select` picks the extra sections to expand (`Projects`, `Extensions`,
/// `GroupRules`), `filter` uses the OData-like syntax of the API, for example
/// `name eq 'someone@example.com'`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntitlementQuery {
    pub organization: String,
    pub select: Option<String>,
    pub filter: Option<String>,
    pub order_by: Option<String>,
    pub continuation_token: Option<String>,
}

impl EntitlementQuery {
    pub fn new(organization: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            ..Self::default()
        }
    }

    pub fn select(mut self, select: impl Into<String>) -> Self {
        self.select = Some(select.into());
        self
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Restricts the listing to the user with this principal name.
    pub fn filter_by_name(self, principal_name: &str) -> Self {
        self.filter(format!("name eq '{principal_name}'"))
    }

    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    pub fn continuation_token(mut self, token: impl Into<String>) -> Self {
        self.continuation_token = Some(token.into());
        self
    }

    fn to_query(&self) -> Vec<(&'static str, &str)> {
        [
            ("select", &self.select),
            ("$filter", &self.filter),
            ("$orderBy", &self.order_by),
            ("continuationToken", &self.continuation_token),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedUserEntitlements {
    #[serde(default, alias = "value")]
    pub members: Vec<UserEntitlement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEntitlement {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<GraphUser>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_level: Option<AccessLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_accessed_date: Option<String>,
    #[serde(default)]
    pub project_entitlements: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserEntitlement {
    pub fn principal_name(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.principal_name.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessLevel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_license_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// User entitlements, served from the `vsaex` host rather than the main API.
#[derive(Clone, Debug)]
pub struct EntitlementsService {
    client: AzureClient,
}

impl EntitlementsService {
    pub fn new(client: AzureClient) -> Self {
        Self { client }
    }

    pub async fn user_entitlements(&self, query: &EntitlementQuery) -> Result<PagedUserEntitlements> {
        let url = self
            .client
            .entitlements_url(&query.organization, &["_apis", "userentitlements"])?;

        let request = self
            .client
            .request(Method::GET, url, API_VERSION)
            .query(&query.to_query());

        self.client.send_json(request).await
    }

    pub async fn user(&self, organization: &str, user_id: &str) -> Result<UserEntitlement> {
        let url = self
            .client
            .entitlements_url(organization, &["_apis", "userentitlements", user_id])?;

        self.client
            .send_json(self.client.request(Method::GET, url, API_VERSION))
            .await
    }
}
