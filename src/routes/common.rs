//! Common routes: health, readiness, version, API information.

use crate::config::format_timestamp;
use crate::handlers::info::{documentation, services, API_TITLE};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    service: Option<&'static str>,
}

/// 200 Healthy when storage answers, 503 Unhealthy otherwise.
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthBody>) {
    match state.probe.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthBody {
                status: "Healthy",
                timestamp: Some(format_timestamp(Utc::now())),
                service: Some(API_TITLE),
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthBody {
                    status: "Unhealthy",
                    timestamp: None,
                    service: None,
                }),
            )
        }
    }
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /health, GET /ready, GET /api/version, GET /api/documentation, GET /api/services.
pub fn common_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(health))
        .route("/api/version", get(version))
        .route("/api/documentation", get(documentation))
        .route("/api/services", get(services))
        .with_state(state)
}
