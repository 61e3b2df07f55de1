//! Inventory Sync Server Library
//!
//! Pulls warehouse inventory from the logistics API into local cache tables
//! and serves prefix lookups over them.

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod scheduler;
pub mod sync;
pub mod upstream;

pub use config::{Config, SyncSettings};
pub use db::{CredentialStore, Db, InventoryCache, open_database};
pub use error::{AppError, Result, StoreError, SyncError};

use std::sync::Arc;

use sync::{InventorySync, TokenManager};
use upstream::UpstreamClient;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub config: Config,
    pub credentials: CredentialStore,
    pub cache: InventoryCache,
    pub sync: Arc<InventorySync>,
}

impl AppState {
    /// Wire stores, token manager and pipelines around one database handle
    pub fn new(db: Db, config: Config) -> Self {
        let credentials = CredentialStore::new(db.clone());
        let cache = InventoryCache::new(db.clone());
        let client = UpstreamClient::new(config.api_url.clone(), config.refresh_url.clone());
        let tokens = Arc::new(TokenManager::new(client.clone(), credentials.clone()));
        let sync = Arc::new(InventorySync::new(
            credentials.clone(),
            cache.clone(),
            client,
            tokens,
            config.sync.clone(),
        ));

        Self {
            db,
            config,
            credentials,
            cache,
            sync,
        }
    }
}
