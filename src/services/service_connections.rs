use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::{comma_join, AzureClient};
use crate::error::Result;
use crate::types::{ListResult, ProjectKey};

const API_VERSION: &str = "6.0-preview.4";

/// Optional filters of the service endpoint listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceConnectionQuery {
    /// Endpoint type, e.g. `kubernetes` or `azurerm`.
    pub endpoint_type: Option<String>,
    pub auth_schemes: Vec<String>,
    pub endpoint_ids: Vec<String>,
    pub endpoint_names: Vec<String>,
    /// `library` or `agentcloud`.
    pub owner: Option<String>,
    pub include_failed: Option<bool>,
    pub include_details: Option<bool>,
}

impl ServiceConnectionQuery {
    pub fn of_type(endpoint_type: impl Into<String>) -> Self {
        Self {
            endpoint_type: Some(endpoint_type.into()),
            ..Self::default()
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            endpoint_names: vec![name.into()],
            ..Self::default()
        }
    }

    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();

        if let Some(endpoint_type) = &self.endpoint_type {
            query.push(("type", endpoint_type.clone()));
        }
        if !self.auth_schemes.is_empty() {
            query.push(("authSchemes", comma_join(&self.auth_schemes)));
        }
        if !self.endpoint_ids.is_empty() {
            query.push(("endpointIds", comma_join(&self.endpoint_ids)));
        }
        if !self.endpoint_names.is_empty() {
            query.push(("endpointNames", comma_join(&self.endpoint_names)));
        }
        if let Some(owner) = &self.owner {
            query.push(("owner", owner.clone()));
        }
        if let Some(include_failed) = self.include_failed {
            query.push(("includeFailed", include_failed.to_string()));
        }
        if let Some(include_details) = self.include_details {
            query.push(("includeDetails", include_details.to_string()));
        }

        query
    }
}

/// Service connection as returned by the endpoints API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEndpoint {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub endpoint_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_ready: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_shared: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug)]
pub struct ServiceConnectionService {
    client: AzureClient,
}

impl ServiceConnectionService {
    pub fn new(client: AzureClient) -> Self {
        Self { client }
    }

    pub async fn list(
        &self,
        key: &ProjectKey,
        query: &ServiceConnectionQuery,
    ) -> Result<ListResult<ServiceEndpoint>> {
        let url = self.client.project_url(
            &key.organization,
            &key.project,
            &["_apis", "serviceendpoint", "endpoints"],
        )?;

        let request = self
            .client
            .request(Method::GET, url, API_VERSION)
            .query(&query.to_query());

        self.client.send_json(request).await
    }

    /// Looks an endpoint up by its exact name.
    pub async fn get_by_name(&self, key: &ProjectKey, name: &str) -> Result<Option<ServiceEndpoint>> {
        let endpoints = self.list(key, &ServiceConnectionQuery::named(name)).await?;
        Ok(endpoints.value.into_iter().find(|e| e.name == name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock_client;
    use mockito::Matcher;
    use serde_json::json;

    fn endpoint_json(name: &str) -> Value {
        json!({
            "id": "f0b2c1d4-0000-4c2b-a3a8-8d2f4c0e1a11",
            "name": name,
            "type": "kubernetes",
            "url": "https://aks.alelltech.com",
            "owner": "library",
            "isReady": true,
            "isShared": false,
            "authorization": {"scheme": "Kubernetes", "parameters": {}},
            "serviceEndpointProjectReferences": [{"name": name}]
        })
    }

    #[test]
    fn test_query_parameters() {
        let query = ServiceConnectionQuery {
            endpoint_type: Some("kubernetes".to_string()),
            auth_schemes: vec!["Kubernetes".to_string(), "Token".to_string()],
            owner: Some("library".to_string()),
            include_failed: Some(false),
            include_details: Some(true),
            ..ServiceConnectionQuery::default()
        };

        assert_eq!(
            query.to_query(),
            vec![
                ("type", "kubernetes".to_string()),
                ("authSchemes", "Kubernetes,Token".to_string()),
                ("owner", "library".to_string()),
                ("includeFailed", "false".to_string()),
                ("includeDetails", "true".to_string()),
            ]
        );
        assert!(ServiceConnectionQuery::default().to_query().is_empty());
    }

    #[tokio::test]
    async fn test_list_by_type() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/alelltech/labs/_apis/serviceendpoint/endpoints")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("api-version".into(), "6.0-preview.4".into()),
                Matcher::UrlEncoded("type".into(), "kubernetes".into()),
            ]))
            .with_status(200)
            .with_body(
                json!({"count": 1, "value": [endpoint_json("aks-qa")]}).to_string(),
            )
            .create_async()
            .await;

        let service = ServiceConnectionService::new(mock_client(&server.url()));
        let endpoints = service
            .list(
                &ProjectKey::new("alelltech", "labs"),
                &ServiceConnectionQuery::of_type("kubernetes"),
            )
            .await
            .unwrap();

        assert_eq!(endpoints.count, 1);
        let endpoint = &endpoints.value[0];
        assert_eq!(endpoint.endpoint_type.as_deref(), Some("kubernetes"));
        assert_eq!(endpoint.is_ready, Some(true));
        assert!(endpoint.extra.contains_key("serviceEndpointProjectReferences"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_by_name() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/alelltech/labs/_apis/serviceendpoint/endpoints")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("api-version".into(), "6.0-preview.4".into()),
                Matcher::UrlEncoded("endpointNames".into(), "aks-qa".into()),
            ]))
            .with_status(200)
            .with_body(json!({"count": 1, "value": [endpoint_json("aks-qa")]}).to_string())
            .create_async()
            .await;

        let service = ServiceConnectionService::new(mock_client(&server.url()));
        let key = ProjectKey::new("alelltech", "labs");

        let endpoint = service.get_by_name(&key, "aks-qa").await.unwrap();
        assert_eq!(endpoint.map(|e| e.name), Some("aks-qa".to_string()));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_by_name_without_match() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/alelltech/labs/_apis/serviceendpoint/endpoints")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({"count": 0, "value": []}).to_string())
            .create_async()
            .await;

        let service = ServiceConnectionService::new(mock_client(&server.url()));
        let key = ProjectKey::new("alelltech", "labs");

        assert!(service.get_by_name(&key, "missing").await.unwrap().is_none());
    }
}
