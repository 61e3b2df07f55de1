use axum::{Json, extract::State};
use redb::ReadableDatabase;
use serde_json::{Value, json};

use crate::AppState;
use crate::models::IngestMethod;

/// Health check endpoint
///
/// Returns the health status of the server and database, plus the row count
/// of each inventory cache.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    // Check database connectivity by attempting a read transaction
    let db = state.db.clone();
    let db_status = tokio::task::spawn_blocking(move || match db.begin_read() {
        Ok(_) => "connected",
        Err(e) => {
            tracing::error!("Database health check failed: {:?}", e);
            "disconnected"
        }
    })
    .await
    .unwrap_or("error");

    let mut records = serde_json::Map::new();
    for method in IngestMethod::ALL {
        let count = state.cache.count(method).await.ok();
        records.insert(method.to_string(), json!(count));
    }

    Json(json!({
        "status": if db_status == "connected" { "healthy" } else { "unhealthy" },
        "database": db_status,
        "records": records,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
