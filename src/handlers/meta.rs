//! Form and list configuration for UI clients.

use crate::error::AppError;
use crate::forms::FormSchema;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct EntitySummary {
    pub name: &'static str,
    pub label: &'static str,
    pub id_field: &'static str,
}

/// GET /api/meta/entities
pub async fn entities(State(state): State<AppState>) -> Json<Vec<EntitySummary>> {
    Json(
        state
            .registry
            .catalog()
            .entities
            .iter()
            .map(|e| EntitySummary {
                name: e.name,
                label: e.label,
                id_field: e.id_name(),
            })
            .collect(),
    )
}

/// GET /api/meta/:entity/form
pub async fn form(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
) -> Result<Json<FormSchema>, AppError> {
    let svc = state.registry.resolve(&path_segment)?;
    Ok(Json(FormSchema::for_entity(svc.entity())))
}
