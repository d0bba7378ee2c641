//! Typed bind values: JSON record fields converted by column type so sqlx sends the right OIDs.

use crate::config::{is_decimal_text, parse_date, parse_timestamp, ColumnType};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;

/// A value that can be bound to a PostgreSQL query.
#[derive(Clone, Debug, PartialEq)]
pub enum PgBindValue {
    /// Typed NULL so the parameter still carries the column's type.
    Null(ColumnType),
    Int(i32),
    BigInt(i64),
    Text(String),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    /// Exact decimal text, bound as text and cast to numeric in SQL.
    Decimal(String),
    Bool(bool),
}

impl PgBindValue {
    /// Convert an already-coerced JSON value for a column of type `ty`.
    pub fn from_json(v: &Value, ty: ColumnType) -> Result<Self, String> {
        if v.is_null() {
            return Ok(PgBindValue::Null(ty));
        }
        let mismatch = || format!("value {} does not fit a {} column", v, ty.pg_type());
        Ok(match ty {
            ColumnType::Int => PgBindValue::Int(
                v.as_i64().and_then(|n| i32::try_from(n).ok()).ok_or_else(mismatch)?,
            ),
            ColumnType::BigInt => PgBindValue::BigInt(v.as_i64().ok_or_else(mismatch)?),
            ColumnType::Text => PgBindValue::Text(v.as_str().ok_or_else(mismatch)?.to_string()),
            ColumnType::Date => PgBindValue::Date(v.as_str().and_then(parse_date).ok_or_else(mismatch)?),
            ColumnType::Timestamp => {
                PgBindValue::Timestamp(v.as_str().and_then(parse_timestamp).ok_or_else(mismatch)?)
            }
            ColumnType::Decimal => PgBindValue::Decimal(match v {
                Value::String(s) if is_decimal_text(s.trim()) => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                _ => return Err(mismatch()),
            }),
            ColumnType::Bool => PgBindValue::Bool(v.as_bool().ok_or_else(mismatch)?),
        })
    }

    /// Attach this value as the next positional parameter.
    pub fn bind_to<'q>(self, query: Query<'q, Postgres, PgArguments>) -> Query<'q, Postgres, PgArguments> {
        match self {
            PgBindValue::Null(ty) => match ty {
                ColumnType::Int => query.bind(None::<i32>),
                ColumnType::BigInt => query.bind(None::<i64>),
                ColumnType::Text => query.bind(None::<String>),
                ColumnType::Date => query.bind(None::<NaiveDate>),
                ColumnType::Timestamp => query.bind(None::<DateTime<Utc>>),
                ColumnType::Decimal => query.bind(None::<String>),
                ColumnType::Bool => query.bind(None::<bool>),
            },
            PgBindValue::Int(n) => query.bind(n),
            PgBindValue::BigInt(n) => query.bind(n),
            PgBindValue::Text(s) => query.bind(s),
            PgBindValue::Date(d) => query.bind(d),
            PgBindValue::Timestamp(t) => query.bind(t),
            PgBindValue::Decimal(s) => query.bind(s),
            PgBindValue::Bool(b) => query.bind(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nulls_keep_their_type() {
        assert_eq!(
            PgBindValue::from_json(&Value::Null, ColumnType::Date).unwrap(),
            PgBindValue::Null(ColumnType::Date)
        );
    }

    #[test]
    fn converts_by_column_type() {
        assert_eq!(PgBindValue::from_json(&json!(3), ColumnType::Int).unwrap(), PgBindValue::Int(3));
        assert_eq!(
            PgBindValue::from_json(&json!("2000-01-01"), ColumnType::Date).unwrap(),
            PgBindValue::Date(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap())
        );
        assert_eq!(
            PgBindValue::from_json(&json!("12345678901234567.89"), ColumnType::Decimal).unwrap(),
            PgBindValue::Decimal("12345678901234567.89".into())
        );
    }

    #[test]
    fn rejects_mismatched_values() {
        assert!(PgBindValue::from_json(&json!("x"), ColumnType::Int).is_err());
        assert!(PgBindValue::from_json(&json!(1), ColumnType::Text).is_err());
        assert!(PgBindValue::from_json(&json!(5_000_000_000i64), ColumnType::Int).is_err());
        assert!(PgBindValue::from_json(&json!("ten"), ColumnType::Decimal).is_err());
    }
}
