pub mod health;
pub mod inventory;
pub mod settings;
pub mod trigger;

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

pub use health::health_check;
pub use inventory::inventory_by_prefix;
pub use settings::{clear_settings, get_settings, save_settings};
pub use trigger::{cron_trigger, manual_trigger};

/// Build the application router (without CORS/trace layers)
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/cron/{method}", get(cron_trigger))
        .route("/api/trigger/{method}", post(manual_trigger))
        .route("/api/inventory/{method}", get(inventory_by_prefix))
        .route(
            "/api/settings",
            get(get_settings).post(save_settings).delete(clear_settings),
        )
        .with_state(state)
}
