//! Resolved catalog: entity definitions validated and indexed for runtime lookup.

use crate::config::catalog::standard_entities;
use crate::config::types::EntityDef;
use crate::config::validate;
use crate::error::ConfigError;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct Catalog {
    pub entities: Vec<Arc<EntityDef>>,
    pub entity_by_path: HashMap<String, Arc<EntityDef>>,
    pub entity_by_table: HashMap<String, Arc<EntityDef>>,
}

impl Catalog {
    /// Validate and index a list of entity definitions.
    pub fn new(defs: Vec<EntityDef>) -> Result<Self, ConfigError> {
        validate(&defs)?;
        let entities: Vec<Arc<EntityDef>> = defs.into_iter().map(Arc::new).collect();
        let entity_by_path = entities
            .iter()
            .map(|e| (e.name.to_string(), e.clone()))
            .collect();
        let entity_by_table = entities
            .iter()
            .map(|e| (e.table.to_string(), e.clone()))
            .collect();
        Ok(Catalog {
            entities,
            entity_by_path,
            entity_by_table,
        })
    }

    /// The full ERP catalog.
    pub fn standard() -> Result<Self, ConfigError> {
        Self::new(standard_entities())
    }

    /// Lookup by path segment, case-insensitive (`/soap/HostelAllocation` works too).
    pub fn entity_by_path(&self, path: &str) -> Option<&Arc<EntityDef>> {
        self.entity_by_path
            .get(path)
            .or_else(|| self.entity_by_path.get(&path.to_ascii_lowercase()))
    }

    /// Lookup by path segment or table name; used by the generic SOAP contract.
    pub fn entity_by_name_or_table(&self, name: &str) -> Option<&Arc<EntityDef>> {
        let lower = name.to_ascii_lowercase();
        self.entity_by_path(&lower)
            .or_else(|| self.entity_by_table.get(&lower))
            .or_else(|| self.entity_by_path.get(&lower.replace('_', "")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_resolves() {
        let catalog = Catalog::standard().unwrap();
        assert_eq!(catalog.entities.len(), 22);
        assert_eq!(catalog.entity_by_path("student").unwrap().id_name(), "student_id");
        assert_eq!(catalog.entity_by_path("Student").unwrap().table, "student");
        assert!(catalog.entity_by_path("students").is_none());
    }

    #[test]
    fn lookup_by_table_name() {
        let catalog = Catalog::standard().unwrap();
        assert_eq!(catalog.entity_by_name_or_table("usr").unwrap().name, "user");
        assert_eq!(catalog.entity_by_name_or_table("hostel_allocation").unwrap().name, "hostelallocation");
        assert_eq!(catalog.entity_by_name_or_table("bookissue").unwrap().table, "book_issue");
        assert!(catalog.entity_by_name_or_table("pg_user").is_none());
    }

    #[test]
    fn contract_names_follow_labels() {
        let catalog = Catalog::standard().unwrap();
        assert_eq!(catalog.entity_by_path("contactdetails").unwrap().contract(), "IContactDetailsService");
    }
}
