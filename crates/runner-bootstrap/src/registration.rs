// Exchanges the personal access token for a short-lived runner registration token.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use runner_common::HttpClientFactory;
use runner_sdk::UrlUtil;
use serde::Deserialize;

use crate::error::BootstrapError;

/// Media type GitHub expects for the REST v3 API.
pub const GITHUB_V3_MEDIA_TYPE: &str = "application/vnd.github.v3+json";

/// Status and body of a token request, as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

/// Source of registration tokens.
///
/// Exactly one request per call and no retries: a bad PAT does not get
/// better by asking again, and the hosting job retries the whole container.
#[async_trait]
pub trait RegistrationTokenClient: Send + Sync {
    async fn request_registration_token(
        &self,
        endpoint: &str,
        pat: &str,
    ) -> Result<ApiResponse, BootstrapError>;
}

/// `reqwest`-backed client for github.com and GitHub Enterprise.
pub struct GitHubClient {
    http: reqwest::Client,
}

impl GitHubClient {
    pub fn new() -> Result<Self, BootstrapError> {
        Ok(Self {
            http: HttpClientFactory::create_client()?,
        })
    }

    pub fn with_http_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl RegistrationTokenClient for GitHubClient {
    async fn request_registration_token(
        &self,
        endpoint: &str,
        pat: &str,
    ) -> Result<ApiResponse, BootstrapError> {
        let response = self
            .http
            .post(endpoint)
            .header(AUTHORIZATION, format!("token {pat}"))
            .header(ACCEPT, GITHUB_V3_MEDIA_TYPE)
            .send()
            .await
            .map_err(|source| BootstrapError::Http {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let status = response.status().as_u16();
        if let Some(request_id) = UrlUtil::get_github_request_id(response.headers()) {
            tracing::debug!(request_id = %request_id, status, "registration token response");
        }

        let body = response
            .text()
            .await
            .map_err(|source| BootstrapError::Http {
                endpoint: endpoint.to_string(),
                source,
            })?;

        Ok(ApiResponse { status, body })
    }
}

#[derive(Debug, Deserialize)]
struct RegistrationTokenResponse {
    #[serde(default)]
    token: Option<String>,
}

/// Pull the `token` field out of a registration-token response body.
///
/// A body that is not JSON, lacks the field, or carries `null`, `""` or the
/// string `"null"` yields `None`.
pub fn parse_registration_token(body: &str) -> Option<String> {
    let parsed: RegistrationTokenResponse = serde_json::from_str(body).ok()?;
    parsed
        .token
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty() && t != "null")
}
