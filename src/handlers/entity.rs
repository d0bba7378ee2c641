//! REST handlers for entity CRUD: list, read, create, update, delete.

use crate::config::Record;
use crate::error::AppError;
use crate::repository::clamp_page;
use crate::response::{created, one, page};
use crate::service::EntityService;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn parse_id(id_str: &str) -> Result<i64, AppError> {
    id_str
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid id: {}", id_str)))
}

fn body_to_record(body: Result<Json<Value>, JsonRejection>) -> Result<Record, AppError> {
    match body {
        Ok(Json(Value::Object(m))) => Ok(m),
        Ok(_) => Err(AppError::BadRequest("body must be a JSON object".into())),
        Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
    }
}

fn not_found(svc: &EntityService, id: i64) -> AppError {
    AppError::NotFound(format!("{} with ID {} not found", svc.entity().label, id))
}

fn service<'a>(state: &'a AppState, path_segment: &str) -> Result<&'a Arc<EntityService>, AppError> {
    state.registry.resolve(path_segment)
}

pub async fn list(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let svc = service(&state, &path_segment)?;
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let (limit, offset) = clamp_page(params.limit, params.offset);
    let rows = svc.list(Some(limit), Some(offset)).await?;
    Ok(page(rows, limit, offset))
}

pub async fn read(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let svc = service(&state, &path_segment)?;
    let id = parse_id(&id_str)?;
    let row = svc.get(id).await?.ok_or_else(|| not_found(svc, id))?;
    Ok(one(row))
}

pub async fn create(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let svc = service(&state, &path_segment)?;
    let record = body_to_record(body)?;
    let row = svc.create(record).await?;
    Ok(created(row))
}

pub async fn update(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let svc = service(&state, &path_segment)?;
    let id = parse_id(&id_str)?;
    let record = body_to_record(body)?;
    let row = svc.update(id, record).await?.ok_or_else(|| not_found(svc, id))?;
    Ok(one(row))
}

/// Responds with the removed record.
pub async fn delete(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let svc = service(&state, &path_segment)?;
    let id = parse_id(&id_str)?;
    let row = svc.remove(id).await?.ok_or_else(|| not_found(svc, id))?;
    Ok(one(row))
}
