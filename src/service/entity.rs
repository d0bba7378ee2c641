//! Per-entity service: coerces and validates input, delegates to the repository, notifies the hub.

use crate::config::{EntityDef, Record};
use crate::error::AppError;
use crate::hub::{Hub, DASHBOARD_EVENT};
use crate::repository::{clamp_page, EntityRepository};
use crate::service::RequestValidator;
use serde_json::Value;
use std::sync::Arc;

/// Mutation kinds as they appear in dashboard hub updates (`student_created`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mutation {
    Created,
    Updated,
    Deleted,
}

impl Mutation {
    pub fn as_str(self) -> &'static str {
        match self {
            Mutation::Created => "created",
            Mutation::Updated => "updated",
            Mutation::Deleted => "deleted",
        }
    }
}

pub struct EntityService {
    repo: Arc<dyn EntityRepository>,
    hub: Hub,
}

impl EntityService {
    pub fn new(repo: Arc<dyn EntityRepository>, hub: Hub) -> Self {
        EntityService { repo, hub }
    }

    pub fn entity(&self) -> &Arc<EntityDef> {
        self.repo.entity()
    }

    /// limit defaults to 100 and is capped at 1000; offset defaults to 0.
    pub async fn list(&self, limit: Option<i64>, offset: Option<i64>) -> Result<Vec<Record>, AppError> {
        let (limit, offset) = clamp_page(limit, offset);
        let rows = self.repo.list(limit, offset).await?;
        Ok(rows.into_iter().map(|r| self.entity().redact(r)).collect())
    }

    pub async fn get(&self, id: i64) -> Result<Option<Record>, AppError> {
        Ok(self.repo.get(id).await?.map(|r| self.entity().redact(r)))
    }

    pub async fn create(&self, input: Record) -> Result<Record, AppError> {
        let record = self.prepare(input)?;
        let created = self.entity().redact(self.repo.create(record).await?);
        let id = created.get(self.entity().id_name()).cloned().unwrap_or(Value::Null);
        tracing::info!(entity = %self.entity().name, id = %id, "created");
        self.notify(Mutation::Created, &created);
        Ok(created)
    }

    pub async fn update(&self, id: i64, input: Record) -> Result<Option<Record>, AppError> {
        let record = self.prepare(input)?;
        let updated = self.repo.update(id, record).await?.map(|r| self.entity().redact(r));
        if let Some(r) = &updated {
            tracing::info!(entity = %self.entity().name, id, "updated");
            self.notify(Mutation::Updated, r);
        }
        Ok(updated)
    }

    pub async fn remove(&self, id: i64) -> Result<Option<Record>, AppError> {
        let removed = self.repo.remove(id).await?.map(|r| self.entity().redact(r));
        if let Some(r) = &removed {
            tracing::info!(entity = %self.entity().name, id, "deleted");
            self.notify(Mutation::Deleted, r);
        }
        Ok(removed)
    }

    pub async fn count(&self) -> Result<u64, AppError> {
        Ok(self.repo.count().await?)
    }

    /// Keep only writable columns, coerce each to its column type, then apply the field rules.
    /// Unknown fields are dropped; the identifier and storage-managed columns are never taken from input.
    fn prepare(&self, input: Record) -> Result<Record, AppError> {
        let entity = self.entity();
        let mut record = Record::new();
        for (name, value) in input {
            let Some(col) = entity.column_def(&name) else {
                tracing::debug!(entity = %entity.name, field = %name, "ignoring unknown field");
                continue;
            };
            if !col.is_writable() {
                continue;
            }
            let v = col
                .ty
                .coerce(&value)
                .map_err(|e| AppError::Validation(format!("{}: {}", name, e)))?;
            record.insert(name, v);
        }
        RequestValidator::validate(&record, &entity.validation)?;
        Ok(record)
    }

    fn notify(&self, mutation: Mutation, record: &Record) {
        let entity = self.entity();
        let data = Value::Object(record.clone());
        if let Some(event) = entity.hub_event {
            self.hub.publish(event, vec![data.clone()]);
        }
        let kind = format!("{}_{}", entity.name, mutation.as_str());
        self.hub.publish(DASHBOARD_EVENT, vec![Value::String(kind), data]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Catalog;
    use crate::repository::MemoryStore;
    use serde_json::json;

    fn service(name: &str, hub: Hub) -> EntityService {
        let catalog = Catalog::standard().unwrap();
        let store = MemoryStore::new(&catalog);
        let repo = store.repository(catalog.entity_by_path(name).unwrap().clone());
        EntityService::new(Arc::new(repo), hub)
    }

    fn record(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn create_ignores_client_identifier_and_unknown_fields() {
        let svc = service("department", Hub::default());
        let created = svc
            .create(record(json!({ "dept_id": 50, "dept_name": "Physics", "colour": "blue" })))
            .await
            .unwrap();
        assert_eq!(created["dept_id"], json!(1));
        assert!(!created.contains_key("colour"));
    }

    #[tokio::test]
    async fn validation_runs_before_storage() {
        let svc = service("student", Hub::default());
        let err = svc
            .create(record(json!({ "first_name": "Asha", "last_name": "Rao", "email": "nope" })))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m == "email format is invalid"));
        assert_eq!(svc.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn entity_field_rules_reject_bad_input() {
        let fees = service("fees", Hub::default());
        let err = fees
            .create(record(json!({ "fee_type": "Tuition", "amount": -50, "due_date": "2024-07-01" })))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m == "amount must be greater than 0"));

        let library = service("library", Hub::default());
        let err = library.create(Record::new()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m == "title is required"));

        let results = service("result", Hub::default());
        let err = results
            .create(record(json!({ "student_id": 1, "exam_id": 1, "marks": -1 })))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m == "marks must be at least 0"));
    }

    #[tokio::test]
    async fn uncoercible_values_are_validation_errors() {
        let svc = service("student", Hub::default());
        let err = svc
            .create(record(json!({ "first_name": "A", "last_name": "B", "email": "a@b.co", "dob": "yesterday" })))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m.starts_with("dob:")));
    }

    #[tokio::test]
    async fn sensitive_columns_never_leave_the_service() {
        let svc = service("user", Hub::default());
        let created = svc
            .create(record(json!({ "full_name": "Admin", "email": "admin@x.edu", "password_hash": "secret" })))
            .await
            .unwrap();
        assert!(!created.contains_key("password_hash"));
        let listed = svc.list(None, None).await.unwrap();
        assert!(!listed[0].contains_key("password_hash"));
    }

    #[tokio::test]
    async fn mutations_are_published_to_the_hub() {
        let hub = Hub::default();
        let mut rx = hub.subscribe();
        let svc = service("course", hub);
        svc.create(record(json!({ "course_name": "Physics 101", "course_code": "PHY101" }))).await.unwrap();

        let specific = rx.recv().await.unwrap();
        assert_eq!(specific.target, "ReceiveCourseUpdate");
        let dashboard = rx.recv().await.unwrap();
        assert_eq!(dashboard.target, DASHBOARD_EVENT);
        assert_eq!(dashboard.arguments[0], json!("course_created"));

        svc.remove(1).await.unwrap();
        rx.recv().await.unwrap();
        assert_eq!(rx.recv().await.unwrap().arguments[0], json!("course_deleted"));
    }

    #[tokio::test]
    async fn absent_ids_are_none() {
        let svc = service("room", Hub::default());
        assert!(svc.get(9).await.unwrap().is_none());
        let room = record(json!({ "hostel_id": 1, "room_no": "A-12" }));
        assert!(svc.update(9, room).await.unwrap().is_none());
        assert!(svc.remove(9).await.unwrap().is_none());
    }
}
