use std::fmt::Display;
use std::time::Duration;

use log::debug;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::auth::Token;
use crate::error::{AzdoError, Result};

pub const DEFAULT_BASE_URL: &str = "https://dev.azure.com/";
pub const DEFAULT_ENTITLEMENTS_URL: &str = "https://vsaex.dev.azure.com/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const JSON_UTF8: &str = "application/json; charset=utf-8";

/// Configured HTTP client shared by every service.
///
/// Holds the Azure DevOps base URL, the user entitlements base URL (served
/// from a different host) and the optional PAT. Cloning is cheap: the
/// underlying `reqwest::Client` is reference counted.
#[derive(Clone, Debug)]
pub struct AzureClient {
    client: Client,
    base_url: Url,
    entitlements_url: Url,
    token: Option<Token>,
}

impl AzureClient {
    /// Creates a client against the public `dev.azure.com` endpoints.
    pub fn new(token: Option<Token>) -> Result<Self> {
        Self::with_base_urls(
            DEFAULT_BASE_URL,
            DEFAULT_ENTITLEMENTS_URL,
            token,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Creates a client against custom endpoints.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base for organization/project APIs (e.g., <https://dev.azure.com>)
    /// * `entitlements_url` - Base for the user entitlements API (e.g., <https://vsaex.dev.azure.com>)
    /// * `token` - Optional Personal Access Token
    /// * `timeout` - Per-request timeout
    ///
    /// # Errors
    ///
    /// Returns an error if either URL is invalid or the HTTP client cannot be built.
    pub fn with_base_urls(
        base_url: &str,
        entitlements_url: &str,
        token: Option<Token>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("azdo/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| AzdoError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: parse_base(base_url)?,
            entitlements_url: parse_base(entitlements_url)?,
            token,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Attaches the PAT as a Basic credential with an empty user name.
    pub fn auth_request(&self, request: RequestBuilder) -> RequestBuilder {
        if let Some(token) = &self.token {
            request.basic_auth("", Some(token.as_str()))
        } else {
            request
        }
    }

    /// `{base}/{organization}/{segments...}`
    pub fn org_url(&self, organization: &str, segments: &[&str]) -> Result<Url> {
        join_segments(&self.base_url, std::iter::once(organization).chain(segments.iter().copied()))
    }

    /// `{base}/{organization}/{project}/{segments...}`
    pub fn project_url(&self, organization: &str, project: &str, segments: &[&str]) -> Result<Url> {
        join_segments(
            &self.base_url,
            [organization, project].into_iter().chain(segments.iter().copied()),
        )
    }

    /// `{entitlements base}/{organization}/{segments...}`
    pub fn entitlements_url(&self, organization: &str, segments: &[&str]) -> Result<Url> {
        join_segments(
            &self.entitlements_url,
            std::iter::once(organization).chain(segments.iter().copied()),
        )
    }

    /// Starts an authenticated request pinned to an API version.
    pub fn request(&self, method: Method, url: Url, api_version: &str) -> RequestBuilder {
        debug!("{method} {url} (api-version {api_version})");
        self.auth_request(self.client.request(method, url))
            .query(&[("api-version", api_version)])
    }

    /// Sends the request and deserializes a successful JSON response.
    pub async fn send_json<T>(&self, request: RequestBuilder) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = error_for_status(request.send().await?).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Sends the request and discards a successful response body.
    pub async fn send_unit(&self, request: RequestBuilder) -> Result<()> {
        error_for_status(request.send().await?).await?;
        Ok(())
    }

    /// Sends the request and returns its status.
    ///
    /// With `fail_on_error` unset every status is returned as-is, including
    /// 4xx and 5xx.
    pub async fn send_status(
        &self,
        request: RequestBuilder,
        fail_on_error: bool,
    ) -> Result<StatusCode> {
        let response = request.send().await?;
        if fail_on_error {
            Ok(error_for_status(response).await?.status())
        } else {
            Ok(response.status())
        }
    }
}

/// Serializes `body` as the request payload with an explicit UTF-8 content type.
pub fn json_body(request: RequestBuilder, body: &impl Serialize) -> Result<RequestBuilder> {
    Ok(request
        .header(CONTENT_TYPE, HeaderValue::from_static(JSON_UTF8))
        .body(serde_json::to_vec(body)?))
}

/// Renders a list query parameter as comma-separated values.
pub fn comma_join<T: Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn parse_base(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| AzdoError::Config(format!("Invalid base URL {raw}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(AzdoError::Config(format!("Base URL cannot hold paths: {raw}")));
    }
    Ok(url)
}

fn join_segments<'a>(base: &Url, segments: impl IntoIterator<Item = &'a str>) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| AzdoError::Config(format!("Base URL cannot hold paths: {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn error_for_status(response: Response) -> Result<Response> {
    let status = response.status();

    // A rejected PAT yields 203 with the HTML sign-in page instead of 401
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::NON_AUTHORITATIVE_INFORMATION {
        return Err(AzdoError::Unauthorized);
    }

    if status == StatusCode::NOT_FOUND {
        return Err(AzdoError::NotFound(response.url().path().to_string()));
    }

    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        return Err(AzdoError::Api {
            status: status.as_u16(),
            message,
        });
    }

    Ok(response)
}

#[cfg(test)]
pub(crate) fn mock_client(server_url: &str) -> AzureClient {
    AzureClient::with_base_urls(
        server_url,
        server_url,
        Some(Token::from("test-pat")),
        Duration::from_secs(5),
    )
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::{json, Value};

    #[test]
    fn test_default_urls() {
        let client = AzureClient::new(None).unwrap();
        let url = client.project_url("alelltech", "labs", &["_apis", "pipelines"]).unwrap();
        assert_eq!(url.as_str(), "https://dev.azure.com/alelltech/labs/_apis/pipelines");

        let url = client.entitlements_url("alelltech", &["_apis", "userentitlements"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://vsaex.dev.azure.com/alelltech/_apis/userentitlements"
        );
    }

    #[test]
    fn test_base_url_without_trailing_slash() {
        let client = AzureClient::with_base_urls(
            "http://localhost:8080/tfs",
            "http://localhost:8080",
            None,
            Duration::from_secs(1),
        )
        .unwrap();

        let url = client.org_url("org", &["_apis", "projects"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/tfs/org/_apis/projects");
    }

    #[test]
    fn test_segments_are_percent_encoded() {
        let client = AzureClient::new(None).unwrap();
        let url = client
            .project_url("org", "My Project", &["_apis", "git", "repositories", "a/b"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://dev.azure.com/org/My%20Project/_apis/git/repositories/a%2Fb"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result = AzureClient::with_base_urls("not a url", DEFAULT_ENTITLEMENTS_URL, None, Duration::from_secs(1));
        assert!(matches!(result, Err(AzdoError::Config(_))));

        let result = AzureClient::with_base_urls("mailto:me@example.com", DEFAULT_ENTITLEMENTS_URL, None, Duration::from_secs(1));
        assert!(matches!(result, Err(AzdoError::Config(_))));
    }

    #[test]
    fn test_comma_join() {
        assert_eq!(comma_join(&[1, 2, 3]), "1,2,3");
        assert_eq!(comma_join(&["a"]), "a");
        assert_eq!(comma_join::<u32>(&[]), "");
    }

    #[tokio::test]
    async fn test_send_json_with_basic_auth_and_api_version() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/org/_apis/projects")
            .match_query(Matcher::UrlEncoded("api-version".into(), "6.0".into()))
            .match_header("authorization", "Basic OnRlc3QtcGF0")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"count":0,"value":[]}"#)
            .create_async()
            .await;

        let client = mock_client(&server.url());
        let url = client.org_url("org", &["_apis", "projects"]).unwrap();
        let body: Value = client
            .send_json(client.request(Method::GET, url, "6.0"))
            .await
            .unwrap();

        assert_eq!(body["count"], 0);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_json_body_sets_utf8_content_type() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/org/_apis/echo")
            .match_query(Matcher::Any)
            .match_header("content-type", "application/json; charset=utf-8")
            .match_body(Matcher::Json(json!({"name": "x"})))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = mock_client(&server.url());
        let url = client.org_url("org", &["_apis", "echo"]).unwrap();
        let request = json_body(client.request(Method::POST, url, "7.0"), &json!({"name": "x"})).unwrap();
        client.send_unit(request).await.unwrap();

        mock.assert_async().await;
    }

    async fn fetch(client: &AzureClient, path: &str) -> Result<Value> {
        let url = client.org_url("org", &[path]).unwrap();
        client.send_json(client.request(Method::GET, url, "6.0")).await
    }

    #[tokio::test]
    async fn test_error_status_mapping() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/org/missing")
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;
        server
            .mock("GET", "/org/denied")
            .match_query(Matcher::Any)
            .with_status(401)
            .create_async()
            .await;
        server
            .mock("GET", "/org/signin")
            .match_query(Matcher::Any)
            .with_status(203)
            .with_body("<html>Sign In</html>")
            .create_async()
            .await;
        server
            .mock("GET", "/org/broken")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("server exploded")
            .create_async()
            .await;

        let client = mock_client(&server.url());
        let get = |path: &'static str| fetch(&client, path);

        assert!(matches!(get("missing").await, Err(AzdoError::NotFound(p)) if p == "/org/missing"));
        assert!(matches!(get("denied").await, Err(AzdoError::Unauthorized)));
        assert!(matches!(get("signin").await, Err(AzdoError::Unauthorized)));
        match get("broken").await {
            Err(AzdoError::Api { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "server exploded");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_status_without_failing() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/org/thing")
            .match_query(Matcher::Any)
            .with_status(409)
            .create_async()
            .await;

        let client = mock_client(&server.url());
        let url = client.org_url("org", &["thing"]).unwrap();

        let status = client
            .send_status(client.request(Method::DELETE, url.clone(), "6.0"), false)
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CONFLICT);

        let result = client
            .send_status(client.request(Method::DELETE, url, "6.0"), true)
            .await;
        tokio_test::assert_err!(result);
    }
}
