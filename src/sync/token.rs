use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::constants::TOKEN_REFRESH_BUFFER_SECS;
use crate::db::CredentialStore;
use crate::error::SyncError;
use crate::upstream::{GraphqlResponse, UpstreamClient};

/// Access token held in process memory only
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    /// Refresh token this access token was exchanged from
    pub issued_for: String,
}

impl AccessToken {
    /// Usable while outside the refresh buffer and still tied to the stored refresh token
    pub fn is_usable(&self, refresh_token: &str, now: DateTime<Utc>) -> bool {
        self.issued_for == refresh_token
            && now < self.expires_at - Duration::seconds(TOKEN_REFRESH_BUFFER_SECS)
    }
}

/// Exchanges the stored refresh token for access tokens and caches the result
///
/// One instance lives for the whole process and is shared by every pipeline
/// run. The lock is never held across an await, so two runs racing on an
/// expired token may both refresh; the later one wins.
pub struct TokenManager {
    client: UpstreamClient,
    credentials: CredentialStore,
    cache: Mutex<Option<AccessToken>>,
}

impl TokenManager {
    pub fn new(client: UpstreamClient, credentials: CredentialStore) -> Self {
        Self {
            client,
            credentials,
            cache: Mutex::new(None),
        }
    }

    /// A valid access token, refreshing it when needed
    pub async fn access_token(&self) -> Result<String, SyncError> {
        let refresh_token = self.current_refresh_token().await?;

        let cached = self.cache.lock().clone();
        if let Some(cached) = cached
            && cached.is_usable(&refresh_token, Utc::now())
        {
            return Ok(cached.token);
        }

        self.refresh(refresh_token).await
    }

    /// Drop the cached token and exchange a fresh one
    pub async fn force_refresh(&self) -> Result<String, SyncError> {
        self.clear_cache();
        let refresh_token = self.current_refresh_token().await?;
        self.refresh(refresh_token).await
    }

    /// Forget the cached token; the next call performs an exchange
    pub fn clear_cache(&self) {
        if self.cache.lock().take().is_some() {
            tracing::debug!("Access token cache cleared");
        }
    }

    /// Run an authorized GraphQL call, refreshing the token and retrying once on 401
    pub async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: &Value,
    ) -> Result<GraphqlResponse<T>, SyncError> {
        let token = self.access_token().await?;

        match self.client.graphql(&token, query, variables).await {
            Err(SyncError::UpstreamAuth { status: 401, .. }) => {
                tracing::warn!("Access token rejected by upstream, refreshing and retrying once");
                let token = self.force_refresh().await?;
                self.client.graphql(&token, query, variables).await
            }
            other => other,
        }
    }

    async fn current_refresh_token(&self) -> Result<String, SyncError> {
        self.credentials
            .get()
            .await?
            .map(|creds| creds.refresh_token)
            .ok_or(SyncError::Configuration)
    }

    async fn refresh(&self, refresh_token: String) -> Result<String, SyncError> {
        tracing::info!("Refreshing upstream access token...");

        let grant = self.client.exchange_refresh_token(&refresh_token).await?;
        let token = grant
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SyncError::UpstreamAuth {
                status: 200,
                body: "No access_token received from auth endpoint".to_string(),
            })?;

        let expires_at = Utc::now() + Duration::seconds(grant.expires_in);
        *self.cache.lock() = Some(AccessToken {
            token: token.clone(),
            expires_at,
            issued_for: refresh_token,
        });

        tracing::info!(
            "Access token refreshed successfully. Expires in {} days",
            grant.expires_in / 86400
        );

        Ok(token)
    }
}
