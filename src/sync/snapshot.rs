use serde::Deserialize;
use serde_json::{Value, json};

use super::identifier;
use super::token::TokenManager;
use crate::config::SyncSettings;
use crate::error::SyncError;
use crate::models::InventoryItem;
use crate::upstream::UpstreamClient;

const GENERATE_SNAPSHOT_MUTATION: &str = r#"
mutation GenerateSnapshot($warehouse_id: String!) {
  inventory_generate_snapshot(data: { warehouse_id: $warehouse_id }) {
    request_id
    complexity
    snapshot {
      snapshot_id
      status
    }
  }
}
"#;

const SNAPSHOT_STATUS_QUERY: &str = r#"
query SnapshotStatus($snapshot_id: String!) {
  inventory_snapshot(snapshot_id: $snapshot_id) {
    request_id
    complexity
    snapshot {
      snapshot_id
      status
      snapshot_url
      error
    }
  }
}
"#;

#[derive(Debug, Deserialize)]
struct GenerateSnapshotData {
    inventory_generate_snapshot: Option<SnapshotPayload>,
}

#[derive(Debug, Deserialize)]
struct SnapshotStatusData {
    inventory_snapshot: Option<SnapshotPayload>,
}

#[derive(Debug, Deserialize)]
struct SnapshotPayload {
    snapshot: Option<SnapshotInfo>,
}

/// Job state as reported by the status query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnapshotInfo {
    pub snapshot_id: Option<String>,
    pub status: Option<String>,
    pub snapshot_url: Option<String>,
    pub error: Option<String>,
}

/// What a single status check means for the poll loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Pending,
    Ready(String),
    Failed(String),
}

impl SnapshotInfo {
    pub fn poll_state(&self) -> PollState {
        let error = self.error.as_deref().filter(|e| !e.is_empty());
        if self.status.as_deref() == Some("error") || error.is_some() {
            return PollState::Failed(error.unwrap_or("Unknown error").to_string());
        }

        match (self.status.as_deref(), self.snapshot_url.as_deref()) {
            (Some("success"), Some(url)) if !url.is_empty() => PollState::Ready(url.to_string()),
            _ => PollState::Pending,
        }
    }
}

/// Generate -> poll -> download flow over an asynchronous snapshot job
pub struct SnapshotPipeline<'a> {
    tokens: &'a TokenManager,
    client: &'a UpstreamClient,
    settings: &'a SyncSettings,
}

impl<'a> SnapshotPipeline<'a> {
    pub fn new(
        tokens: &'a TokenManager,
        client: &'a UpstreamClient,
        settings: &'a SyncSettings,
    ) -> Self {
        Self {
            tokens,
            client,
            settings,
        }
    }

    /// Run the whole job for a warehouse and return the transformed items
    pub async fn fetch_all(&self, warehouse_id: &str) -> Result<Vec<InventoryItem>, SyncError> {
        let snapshot_id = self.generate(warehouse_id).await?;
        let url = self.wait_for_snapshot(&snapshot_id).await?;
        let raw = self.download(&url).await?;
        Ok(transform_snapshot(&raw))
    }

    /// Request a new snapshot and return its job id
    pub async fn generate(&self, warehouse_id: &str) -> Result<String, SyncError> {
        tracing::info!("Generating inventory snapshot for warehouse: {}", warehouse_id);

        let response = self
            .tokens
            .graphql::<GenerateSnapshotData>(
                GENERATE_SNAPSHOT_MUTATION,
                &json!({ "warehouse_id": warehouse_id }),
            )
            .await?;

        if let Some(errors) = response.error_summary() {
            tracing::error!("Snapshot generation returned errors: {}", errors);
        }

        let snapshot_id = response
            .data
            .and_then(|d| d.inventory_generate_snapshot)
            .and_then(|p| p.snapshot)
            .and_then(|s| s.snapshot_id)
            .filter(|id| !id.is_empty())
            .ok_or(SyncError::Generation)?;

        tracing::info!("Snapshot generation initiated. ID: {}", snapshot_id);
        Ok(snapshot_id)
    }

    /// Current state of a snapshot job
    pub async fn check_status(&self, snapshot_id: &str) -> Result<SnapshotInfo, SyncError> {
        let response = self
            .tokens
            .graphql::<SnapshotStatusData>(
                SNAPSHOT_STATUS_QUERY,
                &json!({ "snapshot_id": snapshot_id }),
            )
            .await?;

        Ok(response
            .data
            .and_then(|d| d.inventory_snapshot)
            .and_then(|p| p.snapshot)
            .unwrap_or_default())
    }

    /// Poll until the job is ready, failed, or the attempt budget runs out
    pub async fn wait_for_snapshot(&self, snapshot_id: &str) -> Result<String, SyncError> {
        let max_attempts = self.settings.max_poll_attempts;
        tracing::info!("Waiting for snapshot {} to complete...", snapshot_id);

        for attempt in 1..=max_attempts {
            let info = self.check_status(snapshot_id).await?;

            tracing::info!(
                "Snapshot status check {}/{}: {}",
                attempt,
                max_attempts,
                info.status.as_deref().unwrap_or("unknown")
            );

            match info.poll_state() {
                PollState::Ready(url) => {
                    tracing::info!("Snapshot ready");
                    return Ok(url);
                }
                PollState::Failed(message) => return Err(SyncError::Snapshot(message)),
                PollState::Pending => {}
            }

            if attempt < max_attempts {
                tokio::time::sleep(self.settings.poll_interval).await;
            }
        }

        Err(SyncError::Timeout {
            attempts: max_attempts,
        })
    }

    /// Fetch the finished dataset; anything other than a JSON array is rejected
    pub async fn download(&self, url: &str) -> Result<Vec<Value>, SyncError> {
        tracing::info!("Downloading snapshot data...");

        match self.client.download_json(url).await? {
            Value::Array(items) => {
                tracing::info!("Downloaded {} inventory records", items.len());
                Ok(items)
            }
            other => Err(SyncError::Format(format!(
                "expected array, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Map raw snapshot entries to items, dropping those without a bin or sku
pub fn transform_snapshot(raw: &[Value]) -> Vec<InventoryItem> {
    raw.iter()
        .filter_map(|entry| {
            let bin = entry.get("inventory_bin").and_then(identifier)?;
            let sku = entry.get("sku").and_then(identifier)?;
            Some(InventoryItem {
                sku,
                bin,
                quantity: entry.get("quantity").map(coerce_quantity).unwrap_or(0),
            })
        })
        .collect()
}

/// Lenient integer coercion: numbers are truncated, strings are read up to
/// the first non-digit, anything unparseable becomes 0
pub fn coerce_quantity(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => parse_leading_int(s).unwrap_or(0),
        _ => 0,
    }
}

fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}
