//! Builds parameterized INSERT, SELECT, UPDATE, DELETE from an entity definition.

use crate::config::{Auto, ColumnType, EntityDef, Record};
use crate::sql::PgBindValue;
use serde_json::Value;

/// Quote identifier for PostgreSQL (safe: only from the catalog).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<PgBindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: PgBindValue) -> u32 {
        self.params.push(v);
        self.params.len() as u32
    }

    /// Push a column value and return its placeholder with the column's cast (e.g. `$3::date`).
    fn push_column_value(&mut self, ty: ColumnType, v: &Value) -> Result<String, String> {
        let n = self.push_param(PgBindValue::from_json(v, ty)?);
        Ok(format!("${}::{}", n, ty.pg_type()))
    }
}

/// SELECT list: each column as-is, except numeric as text so no digits are lost in decoding.
fn select_column_list(entity: &EntityDef) -> String {
    entity
        .columns
        .iter()
        .map(|c| {
            let q = quoted(c.name);
            if c.ty == ColumnType::Decimal {
                format!("{}::text AS {}", q, q)
            } else {
                q
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// SELECT page ordered by identifier: LIMIT $1 OFFSET $2.
pub fn select_list(entity: &EntityDef, limit: i64, offset: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let l = q.push_param(PgBindValue::BigInt(limit));
    let o = q.push_param(PgBindValue::BigInt(offset));
    q.sql = format!(
        "SELECT {} FROM {} ORDER BY {} LIMIT ${} OFFSET ${}",
        select_column_list(entity),
        quoted(entity.table),
        quoted(entity.id_name()),
        l,
        o
    );
    q
}

/// SELECT by identifier.
pub fn select_by_id(entity: &EntityDef, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(PgBindValue::BigInt(id));
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = ${}",
        select_column_list(entity),
        quoted(entity.table),
        quoted(entity.id_name()),
        n
    );
    q
}

pub fn count(entity: &EntityDef) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!("SELECT COUNT(*) FROM {}", quoted(entity.table));
    q
}

/// INSERT: every writable column, NULL when absent. The identifier is never inserted.
/// Columns with a storage default are omitted when the record does not provide them.
pub fn insert(entity: &EntityDef, record: &Record) -> Result<QueryBuf, String> {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in &entity.columns {
        if c.auto == Auto::Identity {
            continue;
        }
        let val = record.get(c.name).filter(|v| !v.is_null() || !c.has_default());
        let val = match val {
            Some(v) if c.is_writable() => v.clone(),
            _ if c.has_default() => continue,
            _ => Value::Null,
        };
        placeholders.push(q.push_column_value(c.ty, &val)?);
        cols.push(quoted(c.name));
    }
    q.sql = if cols.is_empty() {
        format!(
            "INSERT INTO {} DEFAULT VALUES RETURNING {}",
            quoted(entity.table),
            select_column_list(entity)
        )
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            quoted(entity.table),
            cols.join(", "),
            placeholders.join(", "),
            select_column_list(entity)
        )
    };
    Ok(q)
}

/// UPDATE by identifier: replaces every writable column (NULL when absent).
/// Sensitive columns absent from the record keep their stored value; `updated_at` is set to NOW().
pub fn update(entity: &EntityDef, id: i64, record: &Record) -> Result<QueryBuf, String> {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for c in &entity.columns {
        match c.auto {
            Auto::Identity | Auto::CreatedAt => continue,
            Auto::UpdatedAt => {
                sets.push(format!("{} = NOW()", quoted(c.name)));
                continue;
            }
            Auto::None => {}
        }
        let val = match record.get(c.name) {
            Some(v) => v.clone(),
            None if c.sensitive => continue,
            None => Value::Null,
        };
        let rhs = q.push_column_value(c.ty, &val)?;
        sets.push(format!("{} = {}", quoted(c.name), rhs));
    }
    if sets.is_empty() {
        let n = q.push_param(PgBindValue::BigInt(id));
        q.sql = format!(
            "SELECT {} FROM {} WHERE {} = ${}",
            select_column_list(entity),
            quoted(entity.table),
            quoted(entity.id_name()),
            n
        );
        return Ok(q);
    }
    let n = q.push_param(PgBindValue::BigInt(id));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = ${} RETURNING {}",
        quoted(entity.table),
        sets.join(", "),
        quoted(entity.id_name()),
        n,
        select_column_list(entity)
    );
    Ok(q)
}

/// DELETE by identifier, returning the removed row.
pub fn delete(entity: &EntityDef, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(PgBindValue::BigInt(id));
    q.sql = format!(
        "DELETE FROM {} WHERE {} = ${} RETURNING {}",
        quoted(entity.table),
        quoted(entity.id_name()),
        n,
        select_column_list(entity)
    );
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColumnDef;
    use serde_json::json;

    fn fees() -> EntityDef {
        EntityDef::new("fees", "Fees", "fees")
            .column(ColumnDef::id("fee_id"))
            .column(ColumnDef::new("student_id", ColumnType::Int))
            .column(ColumnDef::new("amount", ColumnType::Decimal))
            .column(ColumnDef::new("status", ColumnType::Text).default_value(json!("pending")))
            .column(ColumnDef::created_at())
            .column(ColumnDef::updated_at())
    }

    fn record(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn list_orders_by_identifier_and_binds_paging() {
        let q = select_list(&fees(), 10, 20);
        assert_eq!(
            q.sql,
            "SELECT \"fee_id\", \"student_id\", \"amount\"::text AS \"amount\", \"status\", \"created_at\", \"updated_at\" \
             FROM \"fees\" ORDER BY \"fee_id\" LIMIT $1 OFFSET $2"
        );
        assert_eq!(q.params, vec![PgBindValue::BigInt(10), PgBindValue::BigInt(20)]);
    }

    #[test]
    fn insert_skips_identity_and_defaults() {
        let q = insert(&fees(), &record(json!({ "fee_id": 99, "student_id": 1, "amount": "250.00" }))).unwrap();
        assert!(q.sql.starts_with("INSERT INTO \"fees\" (\"student_id\", \"amount\") VALUES ($1::int4, $2::numeric) RETURNING"));
        assert_eq!(q.params, vec![PgBindValue::Int(1), PgBindValue::Decimal("250.00".into())]);
    }

    #[test]
    fn insert_uses_provided_value_over_default() {
        let q = insert(&fees(), &record(json!({ "status": "paid" }))).unwrap();
        assert!(q.sql.contains("\"status\""));
        assert!(q.params.contains(&PgBindValue::Text("paid".into())));
    }

    #[test]
    fn update_replaces_all_writable_columns() {
        let q = update(&fees(), 5, &record(json!({ "amount": 10 }))).unwrap();
        assert_eq!(
            q.sql,
            "UPDATE \"fees\" SET \"student_id\" = $1::int4, \"amount\" = $2::numeric, \"status\" = $3::text, \
             \"updated_at\" = NOW() WHERE \"fee_id\" = $4 RETURNING \"fee_id\", \"student_id\", \"amount\"::text AS \"amount\", \
             \"status\", \"created_at\", \"updated_at\""
        );
        assert_eq!(q.params[0], PgBindValue::Null(ColumnType::Int));
        assert_eq!(q.params[3], PgBindValue::BigInt(5));
    }

    #[test]
    fn update_keeps_absent_sensitive_columns() {
        let user = EntityDef::new("user", "User", "usr")
            .column(ColumnDef::id("user_id"))
            .column(ColumnDef::new("full_name", ColumnType::Text))
            .column(ColumnDef::new("password_hash", ColumnType::Text).sensitive());
        let q = update(&user, 1, &record(json!({ "full_name": "A" }))).unwrap();
        assert!(!q.sql.contains("password_hash\" ="));
    }

    #[test]
    fn delete_returns_row() {
        let q = delete(&fees(), 3);
        assert!(q.sql.starts_with("DELETE FROM \"fees\" WHERE \"fee_id\" = $1 RETURNING \"fee_id\""));
    }

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(quoted("usr"), "\"usr\"");
        assert_eq!(quoted("we\"ird"), "\"we\"\"ird\"");
    }
}
