//! Entity CRUD routes. Paths are parameterized; handlers resolve the entity through the registry.

use crate::handlers::entity::{create, delete as delete_handler, list, read, update};
use crate::handlers::meta::{entities, form};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn entity_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/meta/entities", get(entities))
        .route("/api/meta/:entity/form", get(form))
        .route("/api/:entity", get(list).post(create))
        .route(
            "/api/:entity/:id",
            get(read).put(update).delete(delete_handler),
        )
        .with_state(state)
}
