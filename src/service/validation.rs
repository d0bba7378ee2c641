//! Request validation from the entity's field rules.

use crate::config::{Record, ValidationRule};
use crate::error::AppError;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

pub struct RequestValidator;

impl RequestValidator {
    /// Check rules in declaration order; the first failure is reported.
    pub fn validate(body: &Record, rules: &[(&'static str, ValidationRule)]) -> Result<(), AppError> {
        for (col, rule) in rules {
            let val = body.get(*col).unwrap_or(&Value::Null);
            if rule.required == Some(true) && is_blank(val) {
                return Err(AppError::Validation(format!("{} is required", col)));
            }
            validate_field(col, val, rule)?;
        }
        Ok(())
    }
}

/// Null, missing, or a string of only whitespace.
pub fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// A single address: local part, `@`, dotted domain, no spaces.
pub fn is_email(s: &str) -> bool {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
        .map_or(false, |re| re.is_match(s))
}

fn validate_field(col: &str, v: &Value, rule: &ValidationRule) -> Result<(), AppError> {
    if v.is_null() {
        return Ok(());
    }
    if let Some(format) = &rule.format {
        validate_format(col, v, format)?;
    }
    if let Some(max) = rule.max_length {
        if let Some(s) = v.as_str() {
            if s.chars().count() > max as usize {
                return Err(AppError::Validation(format!(
                    "{} must be at most {} characters",
                    col, max
                )));
            }
        }
    }
    if let Some(ref pattern) = rule.pattern {
        let re = Regex::new(pattern).map_err(|_| AppError::Internal(format!("invalid pattern for {}", col)))?;
        if let Some(s) = v.as_str() {
            if !re.is_match(s) {
                return Err(AppError::Validation(format!("{} does not match required pattern", col)));
            }
        }
    }
    if let Some(ref allowed) = rule.allowed {
        if !allowed.iter().any(|a| value_eq(v, a)) {
            return Err(AppError::Validation(format!(
                "{} must be one of: {}",
                col,
                allowed.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ")
            )));
        }
    }
    if let Some(min) = rule.exclusive_minimum {
        if let Some(n) = numeric(v) {
            if n <= min {
                return Err(AppError::Validation(format!("{} must be greater than {}", col, min)));
            }
        }
    }
    if let Some(min) = rule.minimum {
        if let Some(n) = numeric(v) {
            if n < min {
                return Err(AppError::Validation(format!("{} must be at least {}", col, min)));
            }
        }
    }
    Ok(())
}

/// Numbers, and decimals carried as their exact text.
fn numeric(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}

fn validate_format(col: &str, v: &Value, format: &str) -> Result<(), AppError> {
    if format.eq_ignore_ascii_case("email") {
        if let Some(s) = v.as_str() {
            if !is_email(s) {
                return Err(AppError::Validation(format!("{} format is invalid", col)));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rules() -> Vec<(&'static str, ValidationRule)> {
        vec![
            ("first_name", ValidationRule::required()),
            ("email", ValidationRule::required().email()),
            ("amount", ValidationRule::default().greater_than(0.0)),
            ("status", ValidationRule::default().one_of(&["pending", "paid"])),
        ]
    }

    fn body(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    fn message(r: Result<(), AppError>) -> String {
        r.unwrap_err().to_string()
    }

    #[test]
    fn first_failing_rule_wins() {
        let err = message(RequestValidator::validate(&body(json!({})), &rules()));
        assert_eq!(err, "first_name is required");
    }

    #[test]
    fn whitespace_counts_as_missing() {
        let err = message(RequestValidator::validate(
            &body(json!({ "first_name": "   ", "email": "a@b.co" })),
            &rules(),
        ));
        assert_eq!(err, "first_name is required");
    }

    #[test]
    fn email_shape_is_checked() {
        let err = message(RequestValidator::validate(
            &body(json!({ "first_name": "A", "email": "not-an-email" })),
            &rules(),
        ));
        assert_eq!(err, "email format is invalid");
        assert!(is_email("asha.rao@college.edu"));
        assert!(!is_email("a b@c.d"));
    }

    #[test]
    fn numeric_and_enum_rules() {
        let base = json!({ "first_name": "A", "email": "a@b.co" });
        let mut zero = body(base.clone());
        zero.insert("amount".into(), json!(0));
        assert_eq!(message(RequestValidator::validate(&zero, &rules())), "amount must be greater than 0");

        let mut bad_status = body(base.clone());
        bad_status.insert("status".into(), json!("void"));
        assert!(message(RequestValidator::validate(&bad_status, &rules())).starts_with("status must be one of"));

        let mut negative_text = body(base.clone());
        negative_text.insert("amount".into(), json!("-50.00"));
        assert_eq!(
            message(RequestValidator::validate(&negative_text, &rules())),
            "amount must be greater than 0"
        );

        let mut ok = body(base);
        ok.insert("amount".into(), json!("12.50"));
        ok.insert("status".into(), json!("paid"));
        assert!(RequestValidator::validate(&ok, &rules()).is_ok());
    }

    #[test]
    fn inclusive_minimum_allows_the_bound() {
        let rules = vec![("marks", ValidationRule::required().at_least(0.0))];
        assert!(RequestValidator::validate(&body(json!({ "marks": 0 })), &rules).is_ok());
        assert_eq!(
            message(RequestValidator::validate(&body(json!({ "marks": -1 })), &rules)),
            "marks must be at least 0"
        );
    }
}
