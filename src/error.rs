use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::constants::ERR_NOT_CONFIGURED;

/// Storage layer error type
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] redb::Error),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::error::EncodeError),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] bincode::error::DecodeError),

    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// Failures raised inside an ingestion run
///
/// These never cross the pipeline boundary: `InventorySync::run` turns them
/// into a failed `SyncOutcome` carrying the display message.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("{}", ERR_NOT_CONFIGURED)]
    Configuration,

    #[error("ShipHero auth failed: {status} - {body}")]
    UpstreamAuth { status: u16, body: String },

    #[error("{0}")]
    Upstream(String),

    #[error("Failed to generate snapshot: No snapshot_id returned")]
    Generation,

    #[error("Snapshot failed: {0}")]
    Snapshot(String),

    #[error("Snapshot timed out after {attempts} attempts")]
    Timeout { attempts: u32 },

    #[error("Invalid snapshot data format: {0}")]
    Format(String),

    #[error("{0}")]
    Persistence(#[from] StoreError),

    #[error("Upstream request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// HTTP-facing error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown ingestion method: {0}")]
    InvalidMethod(String),

    #[error("Unauthorized")]
    Unauthorized,
}

/// Implement IntoResponse to convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Store(ref e) => {
                tracing::error!("Store error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error", "details": e.to_string() }),
                )
            }
            AppError::InvalidInput(ref msg) => {
                (StatusCode::BAD_REQUEST, json!({ "error": msg }))
            }
            AppError::InvalidMethod(_) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": self.to_string() }),
            ),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, json!({ "error": "Unauthorized" })),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;
