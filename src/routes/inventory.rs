use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderName, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::AppState;
use crate::constants::ERR_MISSING_PREFIX;
use crate::error::{AppError, Result};
use crate::models::IngestMethod;

#[derive(Debug, Deserialize)]
pub struct PrefixParams {
    pub prefix: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InventoryRow {
    pub location: String,
    pub sku: String,
    pub quantity: i64,
}

/// Look up cached rows whose bin starts with a prefix
///
/// GET /api/inventory/{method}?prefix=PS01
///
/// The prefix is trimmed and upper-cased; rows come from the named method's
/// table only.
pub async fn inventory_by_prefix(
    State(state): State<AppState>,
    Path(method): Path<String>,
    Query(params): Query<PrefixParams>,
) -> Result<Response> {
    let method: IngestMethod = method.parse()?;
    let started = Instant::now();

    let prefix = params
        .prefix
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::InvalidInput(ERR_MISSING_PREFIX.to_string()))?
        .to_uppercase();

    let rows: Vec<InventoryRow> = state
        .cache
        .find_by_prefix(method, &prefix)
        .await?
        .into_iter()
        .map(|r| InventoryRow {
            location: r.bin,
            sku: r.sku,
            quantity: r.quantity,
        })
        .collect();

    let elapsed = started.elapsed().as_millis();
    tracing::info!(
        "API /inventory/{} - Found {} records in {}ms",
        method,
        rows.len(),
        elapsed
    );

    Ok((
        [
            (header::CACHE_CONTROL, "no-store, max-age=0".to_string()),
            (
                HeaderName::from_static("x-response-time"),
                format!("{}ms", elapsed),
            ),
        ],
        Json(rows),
    )
        .into_response())
}
