//! Storage for entity records: one repository per entity, five operations plus count and ping.

mod memory;
mod postgres;

pub use memory::{MemoryRepository, MemoryStore};
pub use postgres::{PgProbe, PgRepository};

use crate::config::{EntityDef, Record};
use crate::error::RepositoryError;
use async_trait::async_trait;
use std::sync::Arc;

/// Page size used when a caller gives none.
pub const DEFAULT_LIMIT: i64 = 100;
/// Upper bound on any page.
pub const MAX_LIMIT: i64 = 1000;

/// Clamp caller-supplied paging: limit defaults to 100 and is capped at 1000, offset is never negative.
pub fn clamp_page(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(0, MAX_LIMIT);
    let offset = offset.unwrap_or(0).max(0);
    (limit, offset)
}

/// The per-entity storage contract. Absence is `None`, never an error.
#[async_trait]
pub trait EntityRepository: Send + Sync {
    fn entity(&self) -> &Arc<EntityDef>;

    /// Rows ordered by identifier ascending.
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Record>, RepositoryError>;

    async fn get(&self, id: i64) -> Result<Option<Record>, RepositoryError>;

    /// Insert; storage assigns the identifier. Returns the stored record.
    async fn create(&self, record: Record) -> Result<Record, RepositoryError>;

    /// Replace every writable field. `None` when no row has this identifier.
    async fn update(&self, id: i64, record: Record) -> Result<Option<Record>, RepositoryError>;

    /// Hard delete. Returns the row as it was.
    async fn remove(&self, id: i64) -> Result<Option<Record>, RepositoryError>;

    async fn count(&self) -> Result<u64, RepositoryError>;
}

/// Liveness check against the backing store (`SELECT 1` for PostgreSQL).
#[async_trait]
pub trait StorageProbe: Send + Sync {
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Human name used in repository error messages: "Failed to create student".
pub(crate) fn noun(entity: &EntityDef) -> String {
    entity.label.to_ascii_lowercase()
}
