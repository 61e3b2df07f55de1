use axum::http::HeaderValue;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use inventory_sync_server::{
    AppState, Config, open_database, routes, scheduler::spawn_scheduled_syncs,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inventory_sync_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Inventory Sync Server...");

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "Environment: {}, Server: {}",
        config.environment,
        config.server_address()
    );

    // Snapshot poll budget vs trigger ceiling
    let poll_budget = config.sync.max_poll_duration();
    if poll_budget > config.trigger_timeout {
        tracing::warn!(
            "Snapshot polling may take up to {}s but triggered runs are cut off after {}s",
            poll_budget.as_secs(),
            config.trigger_timeout.as_secs()
        );
    }

    let db = open_database(&config.database_path)?;

    let origins = config
        .allowed_origins
        .iter()
        .map(|s| s.parse())
        .collect::<Result<Vec<HeaderValue>, _>>()?;
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::DELETE,
        ])
        .allow_headers(Any);

    let state = AppState::new(db, config.clone());

    let _schedules = spawn_scheduled_syncs(state.sync.clone(), &config);

    let app = routes::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = config.server_address().parse()?;
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
