//! Dashboard aggregates: entity counts, recent records, recent activity.

use crate::config::{format_timestamp, Record};
use crate::error::AppError;
use crate::service::EntityService;
use crate::state::AppState;
use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

const RECENT: i64 = 5;
const ACTIVITY_PER_ENTITY: i64 = 3;
const ACTIVITY_LIMIT: usize = 10;
/// Students scanned when counting per department.
const DEPARTMENT_SCAN: i64 = 1000;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_students: u64,
    pub total_courses: u64,
    pub total_departments: u64,
    pub total_users: u64,
    pub last_updated: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentStat {
    pub department_id: Value,
    pub department_name: Value,
    pub student_count: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub recent_students: Vec<Record>,
    pub recent_courses: Vec<Record>,
    pub department_stats: Vec<DepartmentStat>,
    pub last_updated: String,
}

#[derive(Serialize)]
pub struct ActivityItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub action: String,
    pub description: String,
    pub timestamp: String,
}

/// The `n` highest identifiers, newest first.
async fn newest(svc: &EntityService, n: i64) -> Result<Vec<Record>, AppError> {
    let total = svc.count().await? as i64;
    let mut rows = svc.list(Some(n), Some((total - n).max(0))).await?;
    rows.reverse();
    Ok(rows)
}

fn text(r: &Record, field: &str) -> String {
    match r.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn activity(svc: &EntityService, r: &Record, description: String) -> ActivityItem {
    let entity = svc.entity();
    ActivityItem {
        id: text(r, entity.id_name()),
        kind: entity.label.to_string(),
        action: "Created".to_string(),
        description,
        timestamp: r
            .get("created_at")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format_timestamp(Utc::now())),
    }
}

/// GET /api/dashboard/summary
pub async fn summary(State(state): State<AppState>) -> Result<Json<DashboardSummary>, AppError> {
    let r = &state.registry;
    Ok(Json(DashboardSummary {
        total_students: r.resolve("student")?.count().await?,
        total_courses: r.resolve("course")?.count().await?,
        total_departments: r.resolve("department")?.count().await?,
        total_users: r.resolve("user")?.count().await?,
        last_updated: format_timestamp(Utc::now()),
    }))
}

/// GET /api/dashboard/stats
pub async fn stats(State(state): State<AppState>) -> Result<Json<DashboardStats>, AppError> {
    let students = state.registry.resolve("student")?;
    let departments = state.registry.resolve("department")?;
    let recent_students = newest(students, RECENT).await?;
    let recent_courses = newest(state.registry.resolve("course")?, RECENT).await?;

    let mut per_department: HashMap<i64, u64> = HashMap::new();
    for s in students.list(Some(DEPARTMENT_SCAN), Some(0)).await? {
        if let Some(d) = s.get("department_id").and_then(Value::as_i64) {
            *per_department.entry(d).or_default() += 1;
        }
    }
    let dept_id = departments.entity().id_name();
    let department_stats = departments
        .list(None, None)
        .await?
        .into_iter()
        .map(|d| DepartmentStat {
            student_count: d
                .get(dept_id)
                .and_then(Value::as_i64)
                .and_then(|id| per_department.get(&id).copied())
                .unwrap_or(0),
            department_id: d.get(dept_id).cloned().unwrap_or(Value::Null),
            department_name: d.get("dept_name").cloned().unwrap_or(Value::Null),
        })
        .collect();

    Ok(Json(DashboardStats {
        recent_students,
        recent_courses,
        department_stats,
        last_updated: format_timestamp(Utc::now()),
    }))
}

/// GET /api/dashboard/recent-activity
pub async fn recent_activity(State(state): State<AppState>) -> Result<Json<Vec<ActivityItem>>, AppError> {
    let students = state.registry.resolve("student")?;
    let courses = state.registry.resolve("course")?;
    let mut items: Vec<ActivityItem> = Vec::new();
    for s in newest(students, ACTIVITY_PER_ENTITY).await? {
        let description = format!("New student {} {} added", text(&s, "first_name"), text(&s, "last_name"));
        items.push(activity(students, &s, description));
    }
    for c in newest(courses, ACTIVITY_PER_ENTITY).await? {
        let description = format!("New course {} added", text(&c, "course_name"));
        items.push(activity(courses, &c, description));
    }
    items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    items.truncate(ACTIVITY_LIMIT);
    Ok(Json(items))
}
