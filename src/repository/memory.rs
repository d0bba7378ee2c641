//! In-process storage with the same constraint semantics as the PostgreSQL schema.
//! Used by tests and by `ERP_STORAGE=memory` runs.

use super::{noun, EntityRepository, StorageProbe};
use crate::config::{format_timestamp, Auto, Catalog, EntityDef, Record};
use crate::error::{RepositoryError, FOREIGN_KEY_VIOLATION, NOT_NULL_VIOLATION, UNIQUE_VIOLATION};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Default)]
struct Table {
    last_id: i64,
    rows: BTreeMap<i64, Record>,
}

/// Every table of the catalog behind one lock, so foreign keys can be checked across tables.
pub struct MemoryStore {
    entities: HashMap<&'static str, Arc<EntityDef>>,
    tables: RwLock<HashMap<&'static str, Table>>,
}

impl MemoryStore {
    pub fn new(catalog: &Catalog) -> Arc<Self> {
        let entities: HashMap<_, _> = catalog.entities.iter().map(|e| (e.name, e.clone())).collect();
        let tables = entities.keys().map(|name| (*name, Table::default())).collect();
        Arc::new(MemoryStore {
            entities,
            tables: RwLock::new(tables),
        })
    }

    /// Repository for one entity of this store.
    pub fn repository(self: &Arc<Self>, entity: Arc<EntityDef>) -> MemoryRepository {
        MemoryRepository {
            entity,
            store: self.clone(),
        }
    }

    fn list(&self, entity: &EntityDef, limit: i64, offset: i64) -> Vec<Record> {
        let tables = self.tables.read();
        tables
            .get(entity.name)
            .map(|t| {
                t.rows
                    .values()
                    .skip(offset.max(0) as usize)
                    .take(limit.max(0) as usize)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn get(&self, entity: &EntityDef, id: i64) -> Option<Record> {
        self.tables.read().get(entity.name).and_then(|t| t.rows.get(&id).cloned())
    }

    fn count(&self, entity: &EntityDef) -> u64 {
        self.tables.read().get(entity.name).map(|t| t.rows.len() as u64).unwrap_or(0)
    }

    fn insert(&self, entity: &EntityDef, input: &Record) -> Result<Record, RepositoryError> {
        let context = format!("Failed to create {}", noun(entity));
        let mut tables = self.tables.write();
        let now = Value::String(format_timestamp(Utc::now()));
        let next_id = tables.get(entity.name).map(|t| t.last_id + 1).unwrap_or(1);

        let mut row = Record::new();
        for c in &entity.columns {
            let v = match c.auto {
                Auto::Identity => Value::Number(next_id.into()),
                Auto::CreatedAt | Auto::UpdatedAt => now.clone(),
                Auto::None => match input.get(c.name).filter(|v| !v.is_null()) {
                    Some(v) => c
                        .ty
                        .coerce(v)
                        .map_err(|e| RepositoryError::constraint(format!("{}: {}: {}", context, c.name, e)))?,
                    None => c.default.clone().unwrap_or(Value::Null),
                },
            };
            row.insert(c.name.to_string(), v);
        }

        self.check_row(&tables, entity, &row, None, &context)?;
        let table = tables.entry(entity.name).or_default();
        table.last_id = next_id;
        table.rows.insert(next_id, row.clone());
        Ok(row)
    }

    fn update(&self, entity: &EntityDef, id: i64, input: &Record) -> Result<Option<Record>, RepositoryError> {
        let context = format!("Failed to update {} with ID {}", noun(entity), id);
        let mut tables = self.tables.write();
        let existing = match tables.get(entity.name).and_then(|t| t.rows.get(&id)) {
            Some(r) => r.clone(),
            None => return Ok(None),
        };

        let mut row = Record::new();
        for c in &entity.columns {
            let v = match c.auto {
                Auto::Identity | Auto::CreatedAt => existing.get(c.name).cloned().unwrap_or(Value::Null),
                Auto::UpdatedAt => Value::String(format_timestamp(Utc::now())),
                Auto::None => match input.get(c.name) {
                    Some(v) => c
                        .ty
                        .coerce(v)
                        .map_err(|e| RepositoryError::constraint(format!("{}: {}: {}", context, c.name, e)))?,
                    None if c.sensitive => existing.get(c.name).cloned().unwrap_or(Value::Null),
                    None => Value::Null,
                },
            };
            row.insert(c.name.to_string(), v);
        }

        self.check_row(&tables, entity, &row, Some(id), &context)?;
        if let Some(t) = tables.get_mut(entity.name) {
            t.rows.insert(id, row.clone());
        }
        Ok(Some(row))
    }

    fn remove(&self, entity: &EntityDef, id: i64) -> Result<Option<Record>, RepositoryError> {
        let context = format!("Failed to delete {} with ID {}", noun(entity), id);
        let mut tables = self.tables.write();
        if !tables.get(entity.name).map(|t| t.rows.contains_key(&id)).unwrap_or(false) {
            return Ok(None);
        }
        if self.is_referenced(&tables, entity, id) {
            return Err(RepositoryError::violated(&context, FOREIGN_KEY_VIOLATION));
        }
        Ok(tables.get_mut(entity.name).and_then(|t| t.rows.remove(&id)))
    }

    /// NOT NULL, UNIQUE and FOREIGN KEY, in that order. `own_id` excludes the row being updated.
    fn check_row(
        &self,
        tables: &HashMap<&'static str, Table>,
        entity: &EntityDef,
        row: &Record,
        own_id: Option<i64>,
        context: &str,
    ) -> Result<(), RepositoryError> {
        for c in &entity.columns {
            let v = row.get(c.name).unwrap_or(&Value::Null);
            if v.is_null() {
                if !c.nullable {
                    return Err(RepositoryError::violated(context, NOT_NULL_VIOLATION));
                }
                continue;
            }
            if c.unique {
                let taken = tables.get(entity.name).map_or(false, |t| {
                    t.rows
                        .iter()
                        .any(|(rid, other)| Some(*rid) != own_id && other.get(c.name) == Some(v))
                });
                if taken {
                    return Err(RepositoryError::violated(context, UNIQUE_VIOLATION));
                }
            }
            if let Some(target) = c.references {
                let exists = v
                    .as_i64()
                    .and_then(|fk| tables.get(target).map(|t| t.rows.contains_key(&fk)))
                    .unwrap_or(false);
                if !exists {
                    return Err(RepositoryError::violated(context, FOREIGN_KEY_VIOLATION));
                }
            }
        }
        Ok(())
    }

    fn is_referenced(&self, tables: &HashMap<&'static str, Table>, entity: &EntityDef, id: i64) -> bool {
        self.entities.values().any(|other| {
            other
                .columns
                .iter()
                .filter(|c| c.references == Some(entity.name))
                .any(|c| {
                    tables.get(other.name).map_or(false, |t| {
                        t.rows.values().any(|r| r.get(c.name).and_then(Value::as_i64) == Some(id))
                    })
                })
        })
    }
}

#[async_trait]
impl StorageProbe for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

pub struct MemoryRepository {
    entity: Arc<EntityDef>,
    store: Arc<MemoryStore>,
}

#[async_trait]
impl EntityRepository for MemoryRepository {
    fn entity(&self) -> &Arc<EntityDef> {
        &self.entity
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Record>, RepositoryError> {
        Ok(self.store.list(&self.entity, limit, offset))
    }

    async fn get(&self, id: i64) -> Result<Option<Record>, RepositoryError> {
        Ok(self.store.get(&self.entity, id))
    }

    async fn create(&self, record: Record) -> Result<Record, RepositoryError> {
        self.store.insert(&self.entity, &record)
    }

    async fn update(&self, id: i64, record: Record) -> Result<Option<Record>, RepositoryError> {
        self.store.update(&self.entity, id, &record)
    }

    async fn remove(&self, id: i64) -> Result<Option<Record>, RepositoryError> {
        self.store.remove(&self.entity, id)
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.store.count(&self.entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RepositoryErrorKind;
    use serde_json::json;

    fn setup(name: &str) -> (Arc<MemoryStore>, Catalog, MemoryRepository) {
        let catalog = Catalog::standard().unwrap();
        let store = MemoryStore::new(&catalog);
        let repo = store.repository(catalog.entity_by_path(name).unwrap().clone());
        (store, catalog, repo)
    }

    fn record(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    fn student(email: &str) -> Record {
        record(json!({ "first_name": "Asha", "last_name": "Rao", "email": email }))
    }

    #[tokio::test]
    async fn identifiers_are_assigned_in_sequence() {
        let (_, _, repo) = setup("student");
        let a = repo.create(student("a@x.edu")).await.unwrap();
        let b = repo.create(student("b@x.edu")).await.unwrap();
        assert_eq!(a["student_id"], json!(1));
        assert_eq!(b["student_id"], json!(2));
        let page = repo.list(1, 1).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0]["email"], json!("b@x.edu"));
    }

    #[tokio::test]
    async fn missing_required_field_is_a_constraint_error() {
        let (_, _, repo) = setup("student");
        let err = repo
            .create(record(json!({ "first_name": "Asha", "email": "a@x.edu" })))
            .await
            .unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::Constraint);
        assert_eq!(err.message, "Failed to create student: a required field is missing");
    }

    #[tokio::test]
    async fn unique_and_foreign_keys_are_enforced() {
        let (_, _, repo) = setup("student");
        repo.create(student("a@x.edu")).await.unwrap();
        let dup = repo.create(student("a@x.edu")).await.unwrap_err();
        assert!(dup.message.ends_with(UNIQUE_VIOLATION));

        let mut orphan = student("c@x.edu");
        orphan.insert("department_id".into(), json!(42));
        let fk = repo.create(orphan).await.unwrap_err();
        assert!(fk.message.ends_with(FOREIGN_KEY_VIOLATION));
    }

    #[tokio::test]
    async fn update_replaces_fields_and_keeps_identity() {
        let (_, _, repo) = setup("student");
        let created = repo.create(student("a@x.edu")).await.unwrap();
        let mut changed = student("new@x.edu");
        changed.insert("student_id".into(), json!(99));
        let updated = repo.update(1, changed).await.unwrap().unwrap();
        assert_eq!(updated["student_id"], created["student_id"]);
        assert_eq!(updated["email"], json!("new@x.edu"));
        assert!(repo.update(7, student("z@x.edu")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn defaults_and_timestamps_are_filled() {
        let (_, _, repo) = setup("user");
        let u = repo
            .create(record(json!({ "full_name": "Admin", "email": "admin@x.edu", "password_hash": "h" })))
            .await
            .unwrap();
        assert_eq!(u["is_active"], json!(true));
        assert!(u["created_at"].as_str().unwrap().ends_with('Z'));

        let updated = repo
            .update(1, record(json!({ "full_name": "Root", "email": "admin@x.edu" })))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["password_hash"], json!("h"));
        assert_eq!(updated["created_at"], u["created_at"]);
    }

    #[tokio::test]
    async fn referenced_rows_cannot_be_removed() {
        let (store, catalog, departments) = setup("department");
        departments.create(record(json!({ "dept_name": "Physics" }))).await.unwrap();
        let students = store.repository(catalog.entity_by_path("student").unwrap().clone());
        let mut s = student("a@x.edu");
        s.insert("department_id".into(), json!(1));
        students.create(s).await.unwrap();

        let err = departments.remove(1).await.unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::Constraint);

        let removed = students.remove(1).await.unwrap().unwrap();
        assert_eq!(removed["email"], json!("a@x.edu"));
        assert!(students.get(1).await.unwrap().is_none());
        assert!(departments.remove(1).await.unwrap().is_some());
        assert_eq!(departments.count().await.unwrap(), 0);
    }
}
