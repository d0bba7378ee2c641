//! SOAP endpoints: one per entity contract plus the generic table contract.

use crate::handlers::soap::{entity_endpoint, generic_endpoint};
use crate::state::AppState;
use axum::{routing::post, Router};

pub fn soap_routes(state: AppState) -> Router {
    Router::new()
        .route("/soap", post(generic_endpoint))
        .route("/soap/:entity", post(entity_endpoint))
        .with_state(state)
}
