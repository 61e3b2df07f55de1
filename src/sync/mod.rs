//! Inventory ingestion
//!
//! Both pipelines end the same way: an empty result leaves the cache alone,
//! anything else replaces the method's table wholesale.

pub mod query;
pub mod snapshot;
pub mod token;

use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

use crate::config::SyncSettings;
use crate::db::{CredentialStore, InventoryCache};
use crate::error::SyncError;
use crate::models::{IngestMethod, InventoryItem};
use crate::upstream::UpstreamClient;

pub use query::QueryPipeline;
pub use snapshot::SnapshotPipeline;
pub use token::TokenManager;

/// Uniform result of a pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub success: bool,
    pub record_count: usize,
    pub error: Option<String>,
}

impl SyncOutcome {
    pub fn succeeded(record_count: usize) -> Self {
        Self {
            success: true,
            record_count,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            record_count: 0,
            error: Some(error.into()),
        }
    }
}

/// Identifier text from a loosely typed field
///
/// Non-empty strings pass through and numbers use their decimal form. Null,
/// empty strings and anything else count as missing.
pub fn identifier(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Entry point shared by the scheduler and the trigger routes
pub struct InventorySync {
    credentials: CredentialStore,
    cache: InventoryCache,
    client: UpstreamClient,
    tokens: Arc<TokenManager>,
    settings: SyncSettings,
}

impl InventorySync {
    pub fn new(
        credentials: CredentialStore,
        cache: InventoryCache,
        client: UpstreamClient,
        tokens: Arc<TokenManager>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            credentials,
            cache,
            client,
            tokens,
            settings,
        }
    }

    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    /// Run one ingestion; failures come back as a failed outcome, never as an error
    pub async fn run(&self, method: IngestMethod) -> SyncOutcome {
        let started = Instant::now();
        tracing::info!("Starting {} inventory fetch...", method);

        match self.try_run(method).await {
            Ok(count) => {
                tracing::info!(
                    "{} inventory fetch completed. Records: {}, Duration: {:.2}s",
                    method,
                    count,
                    started.elapsed().as_secs_f64()
                );
                SyncOutcome::succeeded(count)
            }
            Err(e) => {
                tracing::error!("{} inventory fetch failed: {}", method, e);
                SyncOutcome::failed(e.to_string())
            }
        }
    }

    async fn try_run(&self, method: IngestMethod) -> Result<usize, SyncError> {
        let credentials = self
            .credentials
            .get()
            .await?
            .ok_or(SyncError::Configuration)?;

        let items = match method {
            IngestMethod::Query => {
                let fetch = QueryPipeline::new(&self.tokens, &self.settings)
                    .fetch_all(&credentials.warehouse_id)
                    .await?;
                if fetch.truncated {
                    tracing::info!("Fetched {} pages (page cap reached)", fetch.pages);
                } else {
                    tracing::info!("Fetched {} pages", fetch.pages);
                }
                fetch.items
            }
            IngestMethod::Snapshot => {
                SnapshotPipeline::new(&self.tokens, &self.client, &self.settings)
                    .fetch_all(&credentials.warehouse_id)
                    .await?
            }
        };

        self.store(method, items).await
    }

    async fn store(&self, method: IngestMethod, items: Vec<InventoryItem>) -> Result<usize, SyncError> {
        if items.is_empty() {
            tracing::info!("No inventory data to insert, keeping existing {} cache", method);
            return Ok(0);
        }

        Ok(self.cache.replace_all(method, items).await?)
    }
}
