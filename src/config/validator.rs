//! Catalog validation: identifiers, duplicate names and foreign-key targets.

use crate::config::{Auto, EntityDef};
use crate::error::ConfigError;
use std::collections::HashSet;

pub fn validate(defs: &[EntityDef]) -> Result<(), ConfigError> {
    let names: HashSet<&str> = defs.iter().map(|e| e.name).collect();
    let mut seen_paths = HashSet::new();
    let mut seen_tables = HashSet::new();

    for e in defs {
        if !seen_paths.insert(e.name) {
            return Err(ConfigError::DuplicatePathSegment(e.name.to_string()));
        }
        if !seen_tables.insert(e.table) {
            return Err(ConfigError::Validation(format!("table '{}' registered twice", e.table)));
        }

        let ids = e.columns.iter().filter(|c| c.auto == Auto::Identity).count();
        if ids != 1 {
            return Err(ConfigError::InvalidPrimaryKey {
                table_id: e.table.to_string(),
                column: format!("{} identity columns", ids),
            });
        }

        let mut column_names = HashSet::new();
        for c in &e.columns {
            if !column_names.insert(c.name) {
                return Err(ConfigError::Validation(format!(
                    "column '{}' declared twice on '{}'",
                    c.name, e.name
                )));
            }
            if let Some(target) = c.references {
                if !names.contains(target) {
                    return Err(ConfigError::MissingReference {
                        kind: "entity",
                        id: target.to_string(),
                    });
                }
            }
        }

        for (field, _) in &e.validation {
            if !column_names.contains(field) {
                return Err(ConfigError::MissingReference {
                    kind: "column",
                    id: format!("{}.{}", e.name, field),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ColumnDef, ColumnType, ValidationRule};

    fn student() -> EntityDef {
        EntityDef::new("student", "Student", "student")
            .column(ColumnDef::id("student_id"))
            .column(ColumnDef::new("first_name", ColumnType::Text))
    }

    #[test]
    fn accepts_standard_catalog() {
        assert!(validate(&crate::config::catalog::standard_entities()).is_ok());
    }

    #[test]
    fn rejects_duplicate_path() {
        let err = validate(&[student(), student()]).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicatePathSegment(p) if p == "student"));
    }

    #[test]
    fn rejects_missing_identity() {
        let def = EntityDef::new("room", "Room", "room").column(ColumnDef::new("room_no", ColumnType::Text));
        assert!(matches!(validate(&[def]), Err(ConfigError::InvalidPrimaryKey { .. })));
    }

    #[test]
    fn rejects_dangling_reference() {
        let def = student().column(ColumnDef::new("course_id", ColumnType::Int).references("course"));
        assert!(matches!(
            validate(&[def]),
            Err(ConfigError::MissingReference { kind: "entity", .. })
        ));
    }

    #[test]
    fn rejects_rule_for_unknown_column() {
        let def = student().rule("email", ValidationRule::required());
        assert!(matches!(
            validate(&[def]),
            Err(ConfigError::MissingReference { kind: "column", .. })
        ));
    }
}
