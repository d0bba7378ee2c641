//! Explicit entity → service table, built once at startup from the catalog.

use crate::config::{Catalog, EntityDef};
use crate::error::AppError;
use crate::hub::Hub;
use crate::repository::{EntityRepository, MemoryStore, PgRepository};
use crate::service::EntityService;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;

pub struct Registry {
    catalog: Catalog,
    services: HashMap<&'static str, Arc<EntityService>>,
}

impl Registry {
    /// One service per catalog entity, each over the repository `make_repo` builds for it.
    pub fn new<F>(catalog: Catalog, hub: Hub, mut make_repo: F) -> Self
    where
        F: FnMut(Arc<EntityDef>) -> Arc<dyn EntityRepository>,
    {
        let services = catalog
            .entities
            .iter()
            .map(|e| (e.name, Arc::new(EntityService::new(make_repo(e.clone()), hub.clone()))))
            .collect();
        Registry { catalog, services }
    }

    pub fn postgres(catalog: Catalog, pool: PgPool, hub: Hub) -> Self {
        Self::new(catalog, hub, |e| {
            Arc::new(PgRepository::new(pool.clone(), e)) as Arc<dyn EntityRepository>
        })
    }

    pub fn memory(catalog: Catalog, store: &Arc<MemoryStore>, hub: Hub) -> Self {
        Self::new(catalog, hub, |e| {
            Arc::new(store.repository(e)) as Arc<dyn EntityRepository>
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Service for a REST/SOAP path segment (case-insensitive).
    pub fn resolve(&self, path: &str) -> Result<&Arc<EntityService>, AppError> {
        self.catalog
            .entity_by_path(path)
            .and_then(|e| self.services.get(e.name))
            .ok_or_else(|| AppError::NotFound(format!("unknown entity: {}", path)))
    }

    /// Service for an entity or table name; the allowlist of the generic contract.
    pub fn resolve_table(&self, name: &str) -> Result<&Arc<EntityService>, AppError> {
        self.catalog
            .entity_by_name_or_table(name)
            .and_then(|e| self.services.get(e.name))
            .ok_or_else(|| AppError::BadRequest(format!("table '{}' is not allowed", name)))
    }

    /// Services in catalog order.
    pub fn services(&self) -> impl Iterator<Item = &Arc<EntityService>> {
        self.catalog.entities.iter().filter_map(|e| self.services.get(e.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Registry {
        let catalog = Catalog::standard().unwrap();
        let store = MemoryStore::new(&catalog);
        Registry::memory(catalog, &store, Hub::default())
    }

    #[test]
    fn every_entity_has_a_service() {
        let r = registry();
        assert_eq!(r.services().count(), 22);
        assert_eq!(r.resolve("BookIssue").unwrap().entity().table, "book_issue");
    }

    #[test]
    fn unknown_paths_and_tables() {
        let r = registry();
        assert!(matches!(r.resolve("spaceships"), Err(AppError::NotFound(_))));
        assert!(matches!(r.resolve_table("pg_catalog.pg_user"), Err(AppError::BadRequest(_))));
        assert_eq!(r.resolve_table("usr").unwrap().entity().name, "user");
    }
}
