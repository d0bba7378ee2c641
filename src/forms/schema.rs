//! Declarative list/form configuration per entity, derived from the catalog.

use crate::config::{parse_date, Auto, ColumnDef, ColumnType, EntityDef, Record};
use crate::service::{is_blank, is_email};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Columns shown in a list view, identifier included.
const LIST_COLUMNS: usize = 6;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    Date,
    Select { options: Vec<String> },
    Boolean,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RuleSet {
    pub required: bool,
    pub email: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub rules: RuleSet,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ListColumn {
    pub key: String,
    pub label: String,
    pub sortable: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FormSchema {
    pub entity: String,
    pub label: String,
    pub id_field: String,
    pub list_columns: Vec<ListColumn>,
    pub search_fields: Vec<String>,
    pub fields: Vec<FieldSpec>,
}

/// First failing rule per field, keyed by field name.
pub type FieldErrors = BTreeMap<String, String>;

/// `first_name` → `First Name`; a trailing `_id` reads as the referenced thing (`dept_id` → `Dept`).
pub fn humanize(name: &str) -> String {
    let base = name.strip_suffix("_id").filter(|b| !b.is_empty()).unwrap_or(name);
    base.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn field_for(entity: &EntityDef, c: &ColumnDef) -> FieldSpec {
    let rule = entity.validation.iter().find(|(f, _)| *f == c.name).map(|(_, r)| r);
    let kind = match (c.ty, rule.and_then(|r| r.allowed.as_ref())) {
        (_, Some(allowed)) => FieldKind::Select {
            options: allowed
                .iter()
                .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                .collect(),
        },
        (ColumnType::Int | ColumnType::BigInt | ColumnType::Decimal, None) => FieldKind::Number,
        (ColumnType::Date | ColumnType::Timestamp, None) => FieldKind::Date,
        (ColumnType::Bool, None) => FieldKind::Boolean,
        (ColumnType::Text, None) => FieldKind::Text,
    };
    let rules = RuleSet {
        required: rule.and_then(|r| r.required).unwrap_or(false) || (!c.nullable && !c.has_default()),
        email: rule
            .and_then(|r| r.format.as_deref())
            .map_or(false, |f| f.eq_ignore_ascii_case("email")),
        max_length: rule.and_then(|r| r.max_length),
    };
    FieldSpec {
        name: c.name.to_string(),
        label: humanize(c.name),
        kind,
        rules,
    }
}

impl FormSchema {
    pub fn for_entity(entity: &EntityDef) -> Self {
        let id = entity.id_column();
        let visible: Vec<&ColumnDef> = entity.columns.iter().filter(|c| !c.sensitive).collect();
        let list_columns = std::iter::once(ListColumn {
            key: id.name.to_string(),
            label: "ID".to_string(),
            sortable: true,
        })
        .chain(
            visible
                .iter()
                .filter(|c| c.auto == Auto::None)
                .take(LIST_COLUMNS - 1)
                .map(|c| ListColumn {
                    key: c.name.to_string(),
                    label: humanize(c.name),
                    sortable: true,
                }),
        )
        .collect();
        FormSchema {
            entity: entity.name.to_string(),
            label: entity.label.to_string(),
            id_field: id.name.to_string(),
            list_columns,
            search_fields: visible
                .iter()
                .filter(|c| c.ty == ColumnType::Text)
                .map(|c| c.name.to_string())
                .collect(),
            fields: entity
                .columns
                .iter()
                .filter(|c| c.is_writable())
                .map(|c| field_for(entity, c))
                .collect(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Runs every field's validators; submission is allowed only when no field fails.
    pub fn validate(&self, values: &Record) -> Result<(), FieldErrors> {
        let errors: FieldErrors = self
            .fields
            .iter()
            .filter_map(|f| {
                f.check(values.get(&f.name).unwrap_or(&Value::Null))
                    .map(|e| (f.name.clone(), e))
            })
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl FieldSpec {
    /// First failing rule: required, then the kind's shape, then email, then length.
    pub fn check(&self, v: &Value) -> Option<String> {
        if is_blank(v) {
            return self.rules.required.then(|| format!("{} is required", self.label));
        }
        match &self.kind {
            FieldKind::Number => {
                let numeric = v.is_number() || v.as_str().map_or(false, |s| s.trim().parse::<f64>().is_ok());
                if !numeric {
                    return Some(format!("{} must be a number", self.label));
                }
            }
            FieldKind::Date => {
                if v.as_str().and_then(|s| parse_date(s.trim())).is_none() {
                    return Some(format!("{} must be a valid date", self.label));
                }
            }
            FieldKind::Select { options } => {
                let s = v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string());
                if !options.contains(&s) {
                    return Some(format!("{} must be one of: {}", self.label, options.join(", ")));
                }
            }
            FieldKind::Boolean => {
                if !v.is_boolean() {
                    return Some(format!("{} must be true or false", self.label));
                }
            }
            FieldKind::Text => {}
        }
        if self.rules.email && !v.as_str().map_or(false, is_email) {
            return Some(format!("{} must be a valid email address", self.label));
        }
        if let (Some(max), Some(s)) = (self.rules.max_length, v.as_str()) {
            if s.chars().count() > max as usize {
                return Some(format!("{} must be at most {} characters", self.label, max));
            }
        }
        None
    }
}
