//! Create entity tables from the catalog: one CREATE TABLE per entity, then foreign keys.
//! Tables are created first so references may point in any direction; both steps are idempotent.

use crate::config::{Auto, Catalog, ColumnDef, EntityDef};
use crate::error::{AppError, RepositoryError};
use crate::sql::quoted;
use serde_json::Value;
use sqlx::PgPool;

/// Create missing tables and foreign keys for every catalog entity.
pub async fn apply_migrations(pool: &PgPool, catalog: &Catalog) -> Result<(), AppError> {
    for entity in &catalog.entities {
        let ddl = create_table_sql(entity);
        tracing::debug!(table = entity.table, "ensuring table");
        sqlx::query(&ddl).execute(pool).await.map_err(|e| {
            RepositoryError::from_sqlx(format!("Failed to create table {}", entity.table), e)
        })?;
    }

    for entity in &catalog.entities {
        for (name, sql) in foreign_key_sql(entity, catalog)? {
            let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_constraint WHERE conname = $1)")
                .bind(&name)
                .fetch_one(pool)
                .await
                .map_err(|e| RepositoryError::from_sqlx("Failed to inspect constraints", e))?;
            if exists.0 {
                continue;
            }
            sqlx::query(&sql)
                .execute(pool)
                .await
                .map_err(|e| RepositoryError::from_sqlx(format!("Failed to add foreign key {}", name), e))?;
        }
    }
    tracing::info!(tables = catalog.entities.len(), "migrations applied");
    Ok(())
}

fn column_ddl(c: &ColumnDef) -> String {
    let mut ddl = format!("{} {}", quoted(c.name), c.ty.pg_type());
    match c.auto {
        Auto::Identity => {
            ddl.push_str(" GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY");
            return ddl;
        }
        Auto::CreatedAt | Auto::UpdatedAt => ddl.push_str(" DEFAULT NOW()"),
        Auto::None => {
            if let Some(lit) = c.default.as_ref().and_then(literal) {
                ddl.push_str(" DEFAULT ");
                ddl.push_str(&lit);
            }
        }
    }
    if !c.nullable {
        ddl.push_str(" NOT NULL");
    }
    if c.unique {
        ddl.push_str(" UNIQUE");
    }
    ddl
}

/// SQL literal for a column default. Arrays and objects have none.
fn literal(v: &Value) -> Option<String> {
    match v {
        Value::Null => Some("NULL".into()),
        Value::Bool(b) => Some(if *b { "TRUE".into() } else { "FALSE".into() }),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(format!("'{}'", s.replace('\'', "''"))),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// `CREATE TABLE IF NOT EXISTS` for one entity.
pub fn create_table_sql(entity: &EntityDef) -> String {
    let cols: Vec<String> = entity.columns.iter().map(column_ddl).collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quoted(entity.table),
        cols.join(", ")
    )
}

/// `(constraint name, ALTER TABLE ... ADD CONSTRAINT ...)` for each reference column.
pub fn foreign_key_sql(entity: &EntityDef, catalog: &Catalog) -> Result<Vec<(String, String)>, AppError> {
    let mut out = Vec::new();
    for c in &entity.columns {
        let Some(target) = c.references else { continue };
        let to = catalog.entity_by_path(target).ok_or_else(|| {
            AppError::Config(crate::error::ConfigError::MissingReference {
                kind: "entity",
                id: target.to_string(),
            })
        })?;
        let name = format!("fk_{}_{}", entity.table, c.name);
        let sql = format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            quoted(entity.table),
            quoted(&name),
            quoted(c.name),
            quoted(to.table),
            quoted(to.id_name())
        );
        out.push((name, sql));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColumnType;
    use serde_json::json;

    #[test]
    fn student_table_ddl() {
        let catalog = Catalog::standard().unwrap();
        let student = catalog.entity_by_path("student").unwrap();
        let ddl = create_table_sql(student);
        assert!(ddl.starts_with("CREATE TABLE IF NOT EXISTS \"student\" ("));
        assert!(ddl.contains("\"student_id\" int4 GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY"));
        assert!(ddl.contains("\"email\" text NOT NULL UNIQUE"));
        assert!(ddl.contains("\"dob\" date,") || ddl.contains("\"dob\" date)"));
    }

    #[test]
    fn defaults_and_timestamps() {
        let def = EntityDef::new("book", "Book", "library")
            .column(ColumnDef::id("book_id"))
            .column(ColumnDef::new("status", ColumnType::Text).default_value(json!("Avail'able")))
            .column(ColumnDef::new("copies", ColumnType::Int).required().default_value(json!(1)))
            .column(ColumnDef::created_at());
        let ddl = create_table_sql(&def);
        assert!(ddl.contains("\"status\" text DEFAULT 'Avail''able'"));
        assert!(ddl.contains("\"copies\" int4 DEFAULT 1 NOT NULL"));
        assert!(ddl.contains("\"created_at\" timestamptz DEFAULT NOW() NOT NULL"));
    }

    #[test]
    fn foreign_keys_point_at_target_identifier() {
        let catalog = Catalog::standard().unwrap();
        let student = catalog.entity_by_path("student").unwrap();
        let fks = foreign_key_sql(student, &catalog).unwrap();
        let (name, sql) = fks.iter().find(|(n, _)| n == "fk_student_department_id").unwrap();
        assert_eq!(name, "fk_student_department_id");
        assert!(sql.ends_with("REFERENCES \"department\" (\"dept_id\")"));
    }
}
