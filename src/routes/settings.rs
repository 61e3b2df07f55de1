use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::AppState;
use crate::error::{AppError, Result};

/// Non-string fields read as missing
#[derive(Debug, Deserialize)]
pub struct SaveSettingsRequest {
    pub refresh_token: Option<Value>,
    pub warehouse_id: Option<Value>,
}

impl SaveSettingsRequest {
    fn text(field: &Option<Value>) -> &str {
        field.as_ref().and_then(Value::as_str).unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SettingsResponse {
    Configured {
        configured: bool,
        warehouse_id: String,
        /// Last four characters of the refresh token only
        token_hint: String,
        updated_at: String,
    },
    NotConfigured {
        configured: bool,
        message: String,
    },
}

#[derive(Debug, Serialize)]
pub struct SettingsChangeResponse {
    pub success: bool,
    pub message: String,
}

/// Current credentials with the refresh token masked
///
/// GET /api/settings
pub async fn get_settings(State(state): State<AppState>) -> Result<Json<SettingsResponse>> {
    let response = match state.credentials.get().await? {
        Some(creds) => SettingsResponse::Configured {
            configured: true,
            token_hint: creds.token_hint(),
            warehouse_id: creds.warehouse_id,
            updated_at: creds.updated_at.to_rfc3339(),
        },
        None => SettingsResponse::NotConfigured {
            configured: false,
            message: "No settings configured".to_string(),
        },
    };

    Ok(Json(response))
}

/// Replace the stored credentials
///
/// POST /api/settings
///
/// Blank or non-string fields are rejected before storage is touched. A
/// successful save drops the cached access token so the next run exchanges
/// the new one.
pub async fn save_settings(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SaveSettingsRequest>, JsonRejection>,
) -> Result<Json<SettingsChangeResponse>> {
    let Json(payload) = payload.map_err(|e| AppError::InvalidInput(e.body_text()))?;

    state
        .credentials
        .save(
            SaveSettingsRequest::text(&payload.refresh_token),
            SaveSettingsRequest::text(&payload.warehouse_id),
        )
        .await?;
    state.sync.tokens().clear_cache();

    Ok(Json(SettingsChangeResponse {
        success: true,
        message: "Settings saved successfully".to_string(),
    }))
}

/// Remove all stored credentials
///
/// DELETE /api/settings
pub async fn clear_settings(State(state): State<AppState>) -> Result<Json<SettingsChangeResponse>> {
    state.credentials.clear().await?;
    state.sync.tokens().clear_cache();

    Ok(Json(SettingsChangeResponse {
        success: true,
        message: "Settings cleared successfully".to_string(),
    }))
}
