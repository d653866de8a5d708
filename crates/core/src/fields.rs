//! Field-map input: the closed, untyped payload shape accepted at the
//! entity-model boundary.
//!
//! External callers (the HTTP layer) decode requests into a [`FieldMap`];
//! the entity models validate and coerce it into typed records. Helpers here
//! reject wrong-typed values instead of coercing them, and name the offending
//! field in the error.

use serde_json::Value;

use crate::error::{DomainError, DomainResult};

/// Untyped field map, as decoded from a request body.
pub type FieldMap = serde_json::Map<String, Value>;

/// Reject any key outside the operation's allowed set.
///
/// Unknown fields are an error, never silently ignored.
pub fn ensure_known(fields: &FieldMap, allowed: &[&str]) -> DomainResult<()> {
    for key in fields.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(DomainError::validation(format!("unknown field '{key}'")));
        }
    }
    Ok(())
}

/// A JSON `null` counts as absent.
fn present<'a>(fields: &'a FieldMap, key: &str) -> Option<&'a Value> {
    fields.get(key).filter(|v| !v.is_null())
}

pub fn require_str<'a>(fields: &'a FieldMap, key: &str) -> DomainResult<&'a str> {
    optional_str(fields, key)?
        .ok_or_else(|| DomainError::validation(format!("missing field '{key}'")))
}

pub fn optional_str<'a>(fields: &'a FieldMap, key: &str) -> DomainResult<Option<&'a str>> {
    match present(fields, key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(DomainError::validation(format!("'{key}' must be a string"))),
    }
}

pub fn require_f64(fields: &FieldMap, key: &str) -> DomainResult<f64> {
    optional_f64(fields, key)?
        .ok_or_else(|| DomainError::validation(format!("missing field '{key}'")))
}

pub fn optional_f64(fields: &FieldMap, key: &str) -> DomainResult<Option<f64>> {
    match present(fields, key) {
        None => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| DomainError::validation(format!("'{key}' must be a number"))),
        Some(_) => Err(DomainError::validation(format!("'{key}' must be a number"))),
    }
}

pub fn require_i64(fields: &FieldMap, key: &str) -> DomainResult<i64> {
    optional_i64(fields, key)?
        .ok_or_else(|| DomainError::validation(format!("missing field '{key}'")))
}

pub fn optional_i64(fields: &FieldMap, key: &str) -> DomainResult<Option<i64>> {
    match present(fields, key) {
        None => Ok(None),
        // `as_i64` rejects fractional numbers, so 4.5 is not a valid rating.
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| DomainError::validation(format!("'{key}' must be an integer"))),
        Some(_) => Err(DomainError::validation(format!("'{key}' must be an integer"))),
    }
}

pub fn optional_bool(fields: &FieldMap, key: &str) -> DomainResult<Option<bool>> {
    match present(fields, key) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(DomainError::validation(format!("'{key}' must be a boolean"))),
    }
}

pub fn optional_str_list<'a>(
    fields: &'a FieldMap,
    key: &str,
) -> DomainResult<Option<Vec<&'a str>>> {
    match present(fields, key) {
        None => Ok(None),
        Some(Value::Array(items)) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => out.push(s.as_str()),
                    _ => {
                        return Err(DomainError::validation(format!(
                            "'{key}' must be a list of strings"
                        )));
                    }
                }
            }
            Ok(Some(out))
        }
        Some(_) => Err(DomainError::validation(format!(
            "'{key}' must be a list of strings"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> FieldMap {
        value.as_object().expect("test payload must be an object").clone()
    }

    #[test]
    fn ensure_known_rejects_unknown_field() {
        let fields = map(json!({"name": "Wifi", "color": "blue"}));
        let err = ensure_known(&fields, &["name"]).unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.contains("color")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn require_str_names_missing_field() {
        let fields = map(json!({}));
        let err = require_str(&fields, "title").unwrap_err();
        assert!(err.to_string().contains("title"));
    }

    #[test]
    fn null_counts_as_absent() {
        let fields = map(json!({"description": null}));
        assert_eq!(optional_str(&fields, "description").unwrap(), None);
    }

    #[test]
    fn numbers_reject_non_numeric_input() {
        let fields = map(json!({"price_per_night": "100"}));
        assert!(require_f64(&fields, "price_per_night").is_err());
    }

    #[test]
    fn integers_reject_fractions() {
        let fields = map(json!({"rating": 4.5}));
        assert!(require_i64(&fields, "rating").is_err());
    }

    #[test]
    fn str_list_rejects_mixed_items() {
        let fields = map(json!({"amenity_ids": ["a", 3]}));
        assert!(optional_str_list(&fields, "amenity_ids").is_err());
    }
}
