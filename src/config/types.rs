//! Entity and column definitions: the record shape of every ERP entity, one line per field.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// A row as it travels between transports, services and storage.
pub type Record = Map<String, Value>;

/// Storage type of a column. Drives coercion, SQL casts, parameter binding and row decoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Int,
    BigInt,
    Text,
    Date,
    Timestamp,
    Decimal,
    Bool,
}

impl ColumnType {
    /// PostgreSQL type name used in DDL and parameter casts.
    pub fn pg_type(self) -> &'static str {
        match self {
            ColumnType::Int => "int4",
            ColumnType::BigInt => "int8",
            ColumnType::Text => "text",
            ColumnType::Date => "date",
            ColumnType::Timestamp => "timestamptz",
            ColumnType::Decimal => "numeric",
            ColumnType::Bool => "bool",
        }
    }

    /// Normalize a JSON value to this column's canonical JSON form.
    /// Integers stay numbers, dates become `YYYY-MM-DD`, timestamps RFC 3339 UTC.
    /// Decimals are carried as their exact text so `numeric` values keep every digit.
    pub fn coerce(self, v: &Value) -> Result<Value, String> {
        match v {
            Value::Null => Ok(Value::Null),
            Value::String(s) => self.parse_text(s),
            Value::Number(n) => match self {
                ColumnType::Int => {
                    let i = n.as_i64().ok_or("expected an integer")?;
                    i32::try_from(i).map_err(|_| "integer out of range".to_string())?;
                    Ok(Value::Number(i.into()))
                }
                ColumnType::BigInt => Ok(Value::Number(n.as_i64().ok_or("expected an integer")?.into())),
                ColumnType::Decimal => Ok(Value::String(n.to_string())),
                ColumnType::Bool => match n.as_i64() {
                    Some(0) => Ok(Value::Bool(false)),
                    Some(1) => Ok(Value::Bool(true)),
                    _ => Err("expected a boolean".into()),
                },
                _ => Err(format!("expected {}", self.describe())),
            },
            Value::Bool(b) => match self {
                ColumnType::Bool => Ok(Value::Bool(*b)),
                _ => Err(format!("expected {}", self.describe())),
            },
            Value::Array(_) | Value::Object(_) => Err(format!("expected {}", self.describe())),
        }
    }

    /// Parse text (SOAP element content, query strings, JSON strings) into this column's JSON form.
    pub fn parse_text(self, s: &str) -> Result<Value, String> {
        let t = s.trim();
        match self {
            ColumnType::Text => Ok(Value::String(s.to_string())),
            _ if t.is_empty() => Ok(Value::Null),
            ColumnType::Int => t
                .parse::<i32>()
                .map(|n| Value::Number(n.into()))
                .map_err(|_| "expected an integer".into()),
            ColumnType::BigInt => t
                .parse::<i64>()
                .map(|n| Value::Number(n.into()))
                .map_err(|_| "expected an integer".into()),
            ColumnType::Decimal if is_decimal_text(t) => Ok(Value::String(t.to_string())),
            ColumnType::Decimal => Err("expected a decimal number".into()),
            ColumnType::Bool => match t.to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(Value::Bool(true)),
                "false" | "0" => Ok(Value::Bool(false)),
                _ => Err("expected a boolean".into()),
            },
            ColumnType::Date => parse_date(t)
                .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
                .ok_or_else(|| "expected a date (YYYY-MM-DD)".into()),
            ColumnType::Timestamp => parse_timestamp(t)
                .map(|ts| Value::String(format_timestamp(ts)))
                .ok_or_else(|| "expected a timestamp (RFC 3339)".into()),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            ColumnType::Int | ColumnType::BigInt => "an integer",
            ColumnType::Text => "a string",
            ColumnType::Date => "a date",
            ColumnType::Timestamp => "a timestamp",
            ColumnType::Decimal => "a decimal number",
            ColumnType::Bool => "a boolean",
        }
    }
}

/// Plain or exponent notation as PostgreSQL `numeric` accepts it: `12`, `-0.50`, `.5`, `1e3`.
pub fn is_decimal_text(s: &str) -> bool {
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(i) => (&unsigned[..i], Some(&unsigned[i + 1..])),
        None => (unsigned, None),
    };
    let (int, frac) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let digits = |p: &str| p.chars().all(|c| c.is_ascii_digit());
    let mantissa_ok = !(int.is_empty() && frac.is_empty()) && digits(int) && digits(frac);
    let exponent_ok = exponent.map_or(true, |e| {
        let e = e.strip_prefix(['+', '-']).unwrap_or(e);
        !e.is_empty() && digits(e)
    });
    mantissa_ok && exponent_ok
}

/// Accepts `2000-01-01`, `2000-01-01T00:00:00[.fff]` and full RFC 3339.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_naive_datetime(s).map(|dt| dt.date()))
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

/// Timestamps without an offset are taken as UTC; a bare date is midnight UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| parse_naive_datetime(s).map(|dt| dt.and_utc()))
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        })
}

fn parse_naive_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
}

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Values the storage layer fills in itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Auto {
    None,
    /// Identifier assigned on insert; immutable afterwards.
    Identity,
    /// Set to now on insert.
    CreatedAt,
    /// Set to now on insert and on every update.
    UpdatedAt,
}

#[derive(Clone, Debug, Serialize)]
pub struct ColumnDef {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub ty: ColumnType,
    pub nullable: bool,
    pub unique: bool,
    /// Entity name this column points at (foreign key to its identifier).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub references: Option<&'static str>,
    pub auto: Auto,
    /// Literal default applied when an insert omits the column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Never returned to clients; kept as-is on update when the client omits it.
    #[serde(skip)]
    pub sensitive: bool,
}

impl ColumnDef {
    pub fn new(name: &'static str, ty: ColumnType) -> Self {
        ColumnDef {
            name,
            ty,
            nullable: true,
            unique: false,
            references: None,
            auto: Auto::None,
            default: None,
            sensitive: false,
        }
    }

    pub fn id(name: &'static str) -> Self {
        ColumnDef {
            nullable: false,
            auto: Auto::Identity,
            ..ColumnDef::new(name, ColumnType::Int)
        }
    }

    pub fn created_at() -> Self {
        ColumnDef {
            nullable: false,
            auto: Auto::CreatedAt,
            ..ColumnDef::new("created_at", ColumnType::Timestamp)
        }
    }

    pub fn updated_at() -> Self {
        ColumnDef {
            nullable: false,
            auto: Auto::UpdatedAt,
            ..ColumnDef::new("updated_at", ColumnType::Timestamp)
        }
    }

    pub fn required(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn references(mut self, entity: &'static str) -> Self {
        self.references = Some(entity);
        self
    }

    pub fn default_value(mut self, v: Value) -> Self {
        self.default = Some(v);
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Whether an insert may omit this column and let storage fill it.
    pub fn has_default(&self) -> bool {
        self.default.is_some() || self.auto != Auto::None
    }

    /// Client-writable columns: everything except storage-managed ones.
    pub fn is_writable(&self) -> bool {
        self.auto == Auto::None
    }
}

/// Request validation for one field, checked by the service before storage sees the record.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ValidationRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<Value>>,
    /// Value must be strictly greater than this.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
}

impl ValidationRule {
    pub fn required() -> Self {
        ValidationRule {
            required: Some(true),
            ..Default::default()
        }
    }

    pub fn email(mut self) -> Self {
        self.format = Some("email".into());
        self
    }

    pub fn max_length(mut self, n: u32) -> Self {
        self.max_length = Some(n);
        self
    }

    pub fn greater_than(mut self, n: f64) -> Self {
        self.exclusive_minimum = Some(n);
        self
    }

    pub fn at_least(mut self, n: f64) -> Self {
        self.minimum = Some(n);
        self
    }

    pub fn one_of(mut self, values: &[&str]) -> Self {
        self.allowed = Some(values.iter().map(|v| Value::String((*v).to_string())).collect());
        self
    }
}

/// One ERP entity: its table, identifier and columns.
#[derive(Clone, Debug, Serialize)]
pub struct EntityDef {
    /// Lowercase path segment used by REST (`/api/{name}`) and SOAP (`/soap/{name}`).
    pub name: &'static str,
    /// PascalCase name: SOAP contract `I{label}Service` and record element name.
    pub label: &'static str,
    pub table: &'static str,
    pub columns: Vec<ColumnDef>,
    /// Hub event published after each successful mutation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hub_event: Option<&'static str>,
    /// Field rules in evaluation order; the first failure is reported.
    #[serde(skip)]
    pub validation: Vec<(&'static str, ValidationRule)>,
}

impl EntityDef {
    pub fn new(name: &'static str, label: &'static str, table: &'static str) -> Self {
        EntityDef {
            name,
            label,
            table,
            columns: Vec::new(),
            hub_event: None,
            validation: Vec::new(),
        }
    }

    pub fn column(mut self, c: ColumnDef) -> Self {
        self.columns.push(c);
        self
    }

    pub fn rule(mut self, field: &'static str, rule: ValidationRule) -> Self {
        self.validation.push((field, rule));
        self
    }

    pub fn hub_event(mut self, event: &'static str) -> Self {
        self.hub_event = Some(event);
        self
    }

    /// The identifier column, if the definition declares one.
    pub fn identity(&self) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.auto == Auto::Identity)
    }

    /// The identifier column. `Catalog::new` rejects definitions without one, so every
    /// entity reachable from a catalog has it.
    pub fn id_column(&self) -> &ColumnDef {
        self.identity()
            .expect("catalog validation guarantees an identity column")
    }

    pub fn id_name(&self) -> &'static str {
        self.id_column().name
    }

    pub fn column_def(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// SOAP service contract name, e.g. `IStudentService`.
    pub fn contract(&self) -> String {
        format!("I{}Service", self.label)
    }

    /// Drop sensitive columns before a record leaves the process.
    pub fn redact(&self, mut record: Record) -> Record {
        for c in self.columns.iter().filter(|c| c.sensitive) {
            record.remove(c.name);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dates_accept_datetime_forms() {
        assert_eq!(ColumnType::Date.parse_text("2000-01-01").unwrap(), json!("2000-01-01"));
        assert_eq!(ColumnType::Date.parse_text("2000-01-01T00:00:00").unwrap(), json!("2000-01-01"));
        assert_eq!(ColumnType::Date.parse_text("2000-01-01T10:00:00+02:00").unwrap(), json!("2000-01-01"));
        assert!(ColumnType::Date.parse_text("01/01/2000").is_err());
    }

    #[test]
    fn timestamps_normalize_to_utc() {
        assert_eq!(
            ColumnType::Timestamp.parse_text("2024-03-01T12:00:00+01:00").unwrap(),
            json!("2024-03-01T11:00:00Z")
        );
        assert_eq!(ColumnType::Timestamp.parse_text("2024-03-01").unwrap(), json!("2024-03-01T00:00:00Z"));
    }

    #[test]
    fn int_coercion_checks_range_and_shape() {
        assert_eq!(ColumnType::Int.coerce(&json!(7)).unwrap(), json!(7));
        assert_eq!(ColumnType::Int.coerce(&json!("7")).unwrap(), json!(7));
        assert!(ColumnType::Int.coerce(&json!(1.5)).is_err());
        assert!(ColumnType::Int.coerce(&json!(i64::MAX)).is_err());
        assert!(ColumnType::Int.coerce(&json!(true)).is_err());
    }

    #[test]
    fn empty_text_is_null_except_for_text_columns() {
        assert_eq!(ColumnType::Int.parse_text("").unwrap(), Value::Null);
        assert_eq!(ColumnType::Text.parse_text("").unwrap(), json!(""));
    }

    #[test]
    fn bool_and_decimal_coercion() {
        assert_eq!(ColumnType::Bool.coerce(&json!("TRUE")).unwrap(), json!(true));
        assert_eq!(ColumnType::Bool.coerce(&json!(0)).unwrap(), json!(false));
        assert_eq!(ColumnType::Decimal.coerce(&json!("12.50")).unwrap(), json!("12.50"));
        assert_eq!(ColumnType::Decimal.coerce(&json!(250)).unwrap(), json!("250"));
        assert!(ColumnType::Decimal.coerce(&json!("abc")).is_err());
        assert!(ColumnType::Decimal.coerce(&json!("1.2.3")).is_err());
        assert!(ColumnType::Decimal.coerce(&json!(".")).is_err());
    }

    #[test]
    fn decimals_keep_every_digit() {
        let wide = "12345678901234567.89";
        assert_eq!(ColumnType::Decimal.parse_text(wide).unwrap(), json!(wide));
        assert!(is_decimal_text("-0.50"));
        assert!(is_decimal_text(".5"));
        assert!(is_decimal_text("1e-3"));
        assert!(!is_decimal_text("1e"));
        assert!(!is_decimal_text("NaN"));
    }

    #[test]
    fn identity_is_found_by_auto_kind() {
        let def = EntityDef::new("room", "Room", "room")
            .column(ColumnDef::new("room_no", ColumnType::Text))
            .column(ColumnDef::id("room_id"));
        assert_eq!(def.id_name(), "room_id");
        let bare = EntityDef::new("x", "X", "x").column(ColumnDef::new("a", ColumnType::Text));
        assert!(bare.identity().is_none());
    }

    #[test]
    fn redact_strips_sensitive_columns() {
        let def = EntityDef::new("user", "User", "usr")
            .column(ColumnDef::id("user_id"))
            .column(ColumnDef::new("password_hash", ColumnType::Text).sensitive());
        let mut r = Record::new();
        r.insert("user_id".into(), json!(1));
        r.insert("password_hash".into(), json!("x"));
        let out = def.redact(r);
        assert!(out.contains_key("user_id"));
        assert!(!out.contains_key("password_hash"));
    }
}
