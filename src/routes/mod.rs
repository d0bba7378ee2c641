//! Route tables and the assembled application router.

mod common;
mod dashboard;
mod entity;
mod soap;

pub use common::common_routes;
pub use dashboard::dashboard_routes;
pub use entity::entity_routes;
pub use soap::soap_routes;

use crate::config::Settings;
use crate::middleware::fault_boundary;
use crate::state::AppState;
use axum::{http::HeaderValue, middleware, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

/// Every route plus CORS, request tracing, the body size limit and the fault boundary.
pub fn app(state: AppState, settings: &Settings) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(dashboard_routes(state.clone()))
        .merge(entity_routes(state.clone()))
        .merge(soap_routes(state))
        .layer(RequestBodyLimitLayer::new(settings.body_limit))
        .layer(middleware::from_fn(fault_boundary))
        .layer(cors_layer(&settings.cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}
