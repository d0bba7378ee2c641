//! Dashboard aggregates and the realtime hub.

use crate::handlers::{dashboard, hub};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn dashboard_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/dashboard/summary", get(dashboard::summary))
        .route("/api/dashboard/stats", get(dashboard::stats))
        .route("/api/dashboard/recent-activity", get(dashboard::recent_activity))
        .route("/api/dashboard/hub", get(hub::connect))
        .with_state(state)
}
