//! Shared helpers: a mock logistics API served by axum on a random local port,
//! plus application state wired against it.

#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use inventory_sync_server::{AppState, Config, SyncSettings, open_database};

// =============================================================================
// Mock Upstream
// =============================================================================

/// One page of the product listing
#[derive(Debug, Clone)]
pub struct MockPage {
    pub products: Vec<Value>,
    pub has_next_page: bool,
}

/// One answer to a snapshot status check
#[derive(Debug, Clone)]
pub enum MockStatus {
    Pending,
    Success,
    Error(String),
}

#[derive(Debug, Default)]
pub struct MockState {
    pub base_url: String,

    // Token endpoint
    pub refresh_requests: Vec<String>,
    pub refresh_failure: Option<u16>,
    pub expires_in: i64,

    // GraphQL endpoint
    pub bearers: Vec<String>,
    /// Answer this many GraphQL calls with 401 before serving normally
    pub reject_graphql: u32,

    pub pages: Vec<MockPage>,
    /// Keep serving the last page forever
    pub endless_pages: bool,
    pub page_errors: Option<Value>,
    pub page_cursors: Vec<Option<String>>,

    pub generate_response: Value,
    pub generate_requests: u32,
    pub statuses: Vec<MockStatus>,
    pub status_checks: u32,

    pub download: Value,
    /// Served verbatim instead of `download` when set
    pub download_raw: Option<String>,
    pub downloads: u32,
}

#[derive(Clone, Default)]
pub struct MockUpstream {
    pub state: Arc<Mutex<MockState>>,
}

impl MockUpstream {
    pub fn new() -> Self {
        let mock = Self::default();
        {
            let mut s = mock.state.lock();
            s.expires_in = 2_419_200;
            s.generate_response = json!({
                "data": { "inventory_generate_snapshot": {
                    "request_id": "req-1",
                    "complexity": 1,
                    "snapshot": { "snapshot_id": "snap-1", "status": "enqueued" }
                }}
            });
            s.download = json!([]);
        }
        mock
    }

    /// Start serving on 127.0.0.1 and return the base URL
    pub async fn spawn(&self) -> String {
        let app = Router::new()
            .route("/auth/refresh", post(refresh))
            .route("/graphql", post(graphql))
            .route("/download", get(download))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        self.state.lock().base_url = base_url.clone();
        base_url
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        f(&mut self.state.lock())
    }
}

async fn refresh(State(mock): State<MockUpstream>, Json(body): Json<Value>) -> Response {
    mock.with(|s| {
        let refresh_token = body["refresh_token"].as_str().unwrap_or_default().to_string();
        s.refresh_requests.push(refresh_token);

        if let Some(status) = s.refresh_failure {
            return (
                StatusCode::from_u16(status).unwrap(),
                Json(json!({ "error": "invalid_grant" })),
            )
                .into_response();
        }

        Json(json!({
            "access_token": format!("access-{}", s.refresh_requests.len()),
            "expires_in": s.expires_in,
        }))
        .into_response()
    })
}

async fn graphql(
    State(mock): State<MockUpstream>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let query = body["query"].as_str().unwrap_or_default().to_string();
    let variables = body["variables"].clone();

    mock.with(|s| {
        s.bearers.push(bearer);

        if s.reject_graphql > 0 {
            s.reject_graphql -= 1;
            return (StatusCode::UNAUTHORIZED, "token expired").into_response();
        }

        if query.contains("inventory_generate_snapshot") {
            s.generate_requests += 1;
            return Json(s.generate_response.clone()).into_response();
        }

        if query.contains("inventory_snapshot") {
            let index = s.status_checks as usize;
            s.status_checks += 1;
            let status = s
                .statuses
                .get(index)
                .or(s.statuses.last())
                .cloned()
                .unwrap_or(MockStatus::Pending);
            let snapshot = match status {
                MockStatus::Pending => json!({
                    "snapshot_id": "snap-1", "status": "pending",
                    "snapshot_url": null, "error": null
                }),
                MockStatus::Success => json!({
                    "snapshot_id": "snap-1", "status": "success",
                    "snapshot_url": format!("{}/download", s.base_url), "error": null
                }),
                MockStatus::Error(message) => json!({
                    "snapshot_id": "snap-1", "status": "error",
                    "snapshot_url": null, "error": message
                }),
            };
            return Json(json!({
                "data": { "inventory_snapshot": {
                    "request_id": "req-2", "complexity": 1, "snapshot": snapshot
                }}
            }))
            .into_response();
        }

        if query.contains("warehouse_products") {
            s.page_cursors
                .push(variables["after"].as_str().map(String::from));
            if let Some(errors) = &s.page_errors {
                return Json(json!({ "data": null, "errors": errors })).into_response();
            }

            let number = s.page_cursors.len();
            let page = match s.pages.get(number - 1) {
                Some(page) => page.clone(),
                None if s.endless_pages => s.pages.last().cloned().unwrap(),
                None => MockPage {
                    products: vec![],
                    has_next_page: false,
                },
            };
            let edges: Vec<Value> = page
                .products
                .into_iter()
                .map(|node| json!({ "node": node }))
                .collect();

            return Json(json!({
                "data": { "warehouse_products": {
                    "request_id": "req-3",
                    "complexity": 101,
                    "data": {
                        "edges": edges,
                        "pageInfo": {
                            "hasNextPage": page.has_next_page,
                            "endCursor": format!("cursor-{}", number)
                        }
                    }
                }}
            }))
            .into_response();
        }

        (StatusCode::BAD_REQUEST, "unknown operation").into_response()
    })
}

async fn download(State(mock): State<MockUpstream>) -> Response {
    mock.with(|s| {
        s.downloads += 1;
        match &s.download_raw {
            Some(raw) => raw.clone().into_response(),
            None => Json(s.download.clone()).into_response(),
        }
    })
}

// =============================================================================
// Fixtures
// =============================================================================

/// Product node with one location per (bin, quantity) pair
pub fn product(sku: &str, locations: &[(&str, i64)]) -> Value {
    let edges: Vec<Value> = locations
        .iter()
        .map(|(bin, quantity)| {
            json!({ "node": { "location": { "name": bin }, "quantity": quantity } })
        })
        .collect();
    json!({ "product": { "sku": sku }, "locations": { "edges": edges } })
}

pub fn page(products: Vec<Value>, has_next_page: bool) -> MockPage {
    MockPage {
        products,
        has_next_page,
    }
}

/// Configuration pointed at the mock, with all waits removed
pub fn test_config(base_url: &str) -> Config {
    Config {
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        database_path: "".to_string(),
        allowed_origins: vec!["http://localhost:3000".to_string()],
        environment: "test".to_string(),
        cron_secret: Some("cron-secret".to_string()),
        refresh_url: format!("{}/auth/refresh", base_url),
        api_url: format!("{}/graphql", base_url),
        query_sync_interval: None,
        snapshot_sync_interval: None,
        trigger_timeout: Duration::from_secs(30),
        sync: SyncSettings {
            page_delay: Duration::ZERO,
            poll_interval: Duration::ZERO,
            ..SyncSettings::default()
        },
    }
}

/// Application state backed by a temp database and the given config
pub fn test_state(temp_dir: &TempDir, config: Config) -> AppState {
    let db = open_database(temp_dir.path().join("test.db")).expect("Failed to create test database");
    AppState::new(db, config)
}

/// Spawn a mock upstream and build state against it
pub async fn setup() -> (TempDir, MockUpstream, AppState) {
    let temp_dir = TempDir::new().unwrap();
    let mock = MockUpstream::new();
    let base_url = mock.spawn().await;
    let state = test_state(&temp_dir, test_config(&base_url));
    (temp_dir, mock, state)
}

/// Same as `setup`, with credentials already saved
pub async fn setup_configured() -> (TempDir, MockUpstream, AppState) {
    let (temp_dir, mock, state) = setup().await;
    state
        .credentials
        .save("refresh-T1", "V2FyZWhvdXNlOjEyMw==")
        .await
        .unwrap();
    (temp_dir, mock, state)
}
