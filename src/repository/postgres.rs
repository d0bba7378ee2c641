//! PostgreSQL repository: builds SQL from the entity definition and decodes rows by column type.

use super::{noun, EntityRepository, StorageProbe};
use crate::config::{format_timestamp, ColumnType, EntityDef, Record};
use crate::error::RepositoryError;
use crate::sql::{self, QueryBuf};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::sync::Arc;

pub struct PgRepository {
    entity: Arc<EntityDef>,
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool, entity: Arc<EntityDef>) -> Self {
        PgRepository { entity, pool }
    }

    async fn fetch_optional(&self, q: QueryBuf, context: impl Fn() -> String) -> Result<Option<Record>, RepositoryError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in q.params {
            query = p.bind_to(query);
        }
        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::from_sqlx(context(), e))?;
        row.map(|r| row_to_record(&self.entity, &r))
            .transpose()
            .map_err(|e| RepositoryError::from_sqlx(context(), e))
    }
}

#[async_trait]
impl EntityRepository for PgRepository {
    fn entity(&self) -> &Arc<EntityDef> {
        &self.entity
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Record>, RepositoryError> {
        let context = || format!("Failed to list {} records", noun(&self.entity));
        let q = sql::select_list(&self.entity, limit, offset);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in q.params {
            query = p.bind_to(query);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::from_sqlx(context(), e))?;
        rows.iter()
            .map(|r| row_to_record(&self.entity, r))
            .collect::<Result<_, _>>()
            .map_err(|e| RepositoryError::from_sqlx(context(), e))
    }

    async fn get(&self, id: i64) -> Result<Option<Record>, RepositoryError> {
        let q = sql::select_by_id(&self.entity, id);
        self.fetch_optional(q, || format!("Failed to get {} with ID {}", noun(&self.entity), id))
            .await
    }

    async fn create(&self, record: Record) -> Result<Record, RepositoryError> {
        let context = || format!("Failed to create {}", noun(&self.entity));
        let q = sql::insert(&self.entity, &record)
            .map_err(|e| RepositoryError::constraint(format!("{}: {}", context(), e)))?;
        self.fetch_optional(q, context)
            .await?
            .ok_or_else(|| RepositoryError::storage(context()))
    }

    async fn update(&self, id: i64, record: Record) -> Result<Option<Record>, RepositoryError> {
        let context = || format!("Failed to update {} with ID {}", noun(&self.entity), id);
        let q = sql::update(&self.entity, id, &record)
            .map_err(|e| RepositoryError::constraint(format!("{}: {}", context(), e)))?;
        self.fetch_optional(q, context).await
    }

    async fn remove(&self, id: i64) -> Result<Option<Record>, RepositoryError> {
        let q = sql::delete(&self.entity, id);
        self.fetch_optional(q, || format!("Failed to delete {} with ID {}", noun(&self.entity), id))
            .await
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let q = sql::count(&self.entity);
        tracing::debug!(sql = %q.sql, "query");
        let n: i64 = sqlx::query_scalar(&q.sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepositoryError::from_sqlx(format!("Failed to count {} records", noun(&self.entity)), e))?;
        Ok(n.max(0) as u64)
    }
}

/// Health probe over the shared pool.
pub struct PgProbe {
    pool: PgPool,
}

impl PgProbe {
    pub fn new(pool: PgPool) -> Self {
        PgProbe { pool }
    }
}

#[async_trait]
impl StorageProbe for PgProbe {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| RepositoryError::from_sqlx("Database is not reachable", e))
    }
}

fn row_to_record(entity: &EntityDef, row: &PgRow) -> Result<Record, sqlx::Error> {
    let mut map = Record::new();
    for c in &entity.columns {
        map.insert(c.name.to_string(), cell_to_value(row, c.name, c.ty)?);
    }
    Ok(map)
}

fn cell_to_value(row: &PgRow, name: &str, ty: ColumnType) -> Result<Value, sqlx::Error> {
    Ok(match ty {
        ColumnType::Int => row.try_get::<Option<i32>, _>(name)?.map(|n| Value::Number(n.into())),
        ColumnType::BigInt => row.try_get::<Option<i64>, _>(name)?.map(|n| Value::Number(n.into())),
        ColumnType::Text => row.try_get::<Option<String>, _>(name)?.map(Value::String),
        ColumnType::Date => row
            .try_get::<Option<NaiveDate>, _>(name)?
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string())),
        ColumnType::Timestamp => row
            .try_get::<Option<DateTime<Utc>>, _>(name)?
            .map(|t| Value::String(format_timestamp(t))),
        ColumnType::Decimal => row.try_get::<Option<String>, _>(name)?.map(Value::String),
        ColumnType::Bool => row.try_get::<Option<bool>, _>(name)?.map(Value::Bool),
    }
    .unwrap_or(Value::Null))
}
