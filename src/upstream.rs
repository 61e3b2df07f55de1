//! HTTP client for the logistics API
//!
//! Three kinds of call go out: the refresh-token exchange, bearer-authenticated
//! GraphQL requests, and plain GETs of pre-signed snapshot URLs. Token caching
//! and retry live in `sync::token`; this module only speaks HTTP.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SyncError;

/// Successful response from the token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: Option<String>,
    /// Lifetime in seconds
    #[serde(default)]
    pub expires_in: i64,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: &'a Value,
}

/// A structured error entry in a GraphQL response
#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlError {
    pub message: String,
}

/// GraphQL response envelope; callers decide how to treat missing data
#[derive(Debug, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
pub struct GraphqlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphqlError>,
}

impl<T> GraphqlResponse<T> {
    /// Joined error messages, if the response carried any
    pub fn error_summary(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        Some(
            self.errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}

/// Connection edge wrapper used by paginated GraphQL fields
#[derive(Debug, Clone, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
pub struct Edge<T> {
    pub node: Option<T>,
}

#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    api_url: String,
    refresh_url: String,
}

impl UpstreamClient {
    pub fn new(api_url: impl Into<String>, refresh_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
            refresh_url: refresh_url.into(),
        }
    }

    /// Exchange a refresh token for a short-lived access token
    pub async fn exchange_refresh_token(&self, refresh_token: &str) -> Result<TokenGrant, SyncError> {
        let response = self
            .http
            .post(&self.refresh_url)
            .json(&RefreshRequest { refresh_token })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Failed to refresh access token: {} - {}", status, body);
            return Err(SyncError::UpstreamAuth {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<TokenGrant>().await?)
    }

    /// POST a GraphQL document with a bearer token
    ///
    /// A 401 surfaces as `UpstreamAuth` so the caller can refresh and retry.
    pub async fn graphql<T: DeserializeOwned>(
        &self,
        access_token: &str,
        query: &str,
        variables: &Value,
    ) -> Result<GraphqlResponse<T>, SyncError> {
        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(access_token)
            .json(&GraphqlRequest { query, variables })
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::UpstreamAuth {
                status: status.as_u16(),
                body,
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Upstream(format!(
                "GraphQL request failed: {} - {}",
                status, body
            )));
        }

        let body = response.bytes().await?;
        serde_json::from_slice::<GraphqlResponse<T>>(&body).map_err(|e| {
            tracing::error!("Unexpected GraphQL response shape: {}", e);
            SyncError::Upstream(format!("Invalid response structure: {}", e))
        })
    }

    /// GET an arbitrary JSON document (pre-signed snapshot URLs need no token)
    ///
    /// A body that is not JSON at all is a `Format` error, not a transport one.
    pub async fn download_json(&self, url: &str) -> Result<Value, SyncError> {
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Upstream(format!(
                "Snapshot download failed: {}",
                status
            )));
        }

        let body = response.bytes().await?;
        serde_json::from_slice::<Value>(&body)
            .map_err(|e| SyncError::Format(format!("payload is not JSON ({})", e)))
    }
}
