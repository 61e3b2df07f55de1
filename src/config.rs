use std::env;
use std::time::Duration;

use crate::constants::{
    DEFAULT_API_URL, DEFAULT_TRIGGER_TIMEOUT_SECS, LOCATIONS_PAGE_SIZE, MAX_PAGES,
    MAX_POLL_ATTEMPTS, PAGE_DELAY, PAGE_SIZE, POLL_INTERVAL,
};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_path: String,
    pub allowed_origins: Vec<String>,
    pub environment: String,
    /// Bearer secret expected on scheduled trigger calls
    pub cron_secret: Option<String>,
    /// Token endpoint that exchanges a refresh token for an access token
    pub refresh_url: String,
    pub api_url: String,
    /// Periodic run interval for the query pipeline (None = disabled)
    pub query_sync_interval: Option<Duration>,
    /// Periodic run interval for the snapshot pipeline (None = disabled)
    pub snapshot_sync_interval: Option<Duration>,
    pub trigger_timeout: Duration,
    pub sync: SyncSettings,
}

/// Tuning knobs for the ingestion pipelines
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub page_size: u32,
    pub locations_page_size: u32,
    pub max_pages: u32,
    pub page_delay: Duration,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            locations_page_size: LOCATIONS_PAGE_SIZE,
            max_pages: MAX_PAGES,
            page_delay: PAGE_DELAY,
            poll_interval: POLL_INTERVAL,
            max_poll_attempts: MAX_POLL_ATTEMPTS,
        }
    }
}

impl SyncSettings {
    /// Worst-case time the snapshot pipeline spends polling
    pub fn max_poll_duration(&self) -> Duration {
        self.poll_interval * self.max_poll_attempts
    }
}

fn optional_secs(name: &str) -> Result<Option<Duration>, String> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|_| format!("Invalid {}", name)),
        _ => Ok(None),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| "Invalid SERVER_PORT")?;

        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/inventory.db".to_string());

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let cron_secret = env::var("CRON_SECRET").ok().filter(|s| !s.is_empty());

        let refresh_url = env::var("SHIPHERO_REFRESH_URL")
            .map_err(|_| "SHIPHERO_REFRESH_URL must be set for token refresh")?;

        let api_url = env::var("SHIPHERO_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let query_sync_interval = optional_secs("QUERY_SYNC_INTERVAL_SECS")?;
        let snapshot_sync_interval = optional_secs("SNAPSHOT_SYNC_INTERVAL_SECS")?;

        let trigger_timeout = optional_secs("TRIGGER_TIMEOUT_SECS")?
            .unwrap_or(Duration::from_secs(DEFAULT_TRIGGER_TIMEOUT_SECS));

        Ok(Config {
            server_host,
            server_port,
            database_path,
            allowed_origins,
            environment,
            cron_secret,
            refresh_url,
            api_url,
            query_sync_interval,
            snapshot_sync_interval,
            trigger_timeout,
            sync: SyncSettings::default(),
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}
