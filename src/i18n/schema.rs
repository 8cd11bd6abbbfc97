//! Schema: the default-language strings that define every accessor's shape.

use crate::i18n::error::I18nError;
use serde_json::Value;
use std::sync::Arc;

/// A validated default-language schema.
///
/// The root is an object; every leaf is a template string or an array.
/// Key order is the order of the source document.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    root: Arc<Value>,
}

impl Schema {
    /// Validate `value` and wrap it as a schema.
    ///
    /// # Returns
    /// * `Ok(Schema)` if the root is an object and all leaves are strings or arrays
    /// * `Err(I18nError::InvalidSchema)` naming the first offending path otherwise
    pub fn new(value: Value) -> Result<Self, I18nError> {
        if !value.is_object() {
            return Err(I18nError::invalid_schema("", "the root must be an object"));
        }
        validate(&value, "")?;
        Ok(Self {
            root: Arc::new(value),
        })
    }

    pub fn value(&self) -> &Value {
        &self.root
    }

    /// The schema's values as a shareable dataset.
    pub fn dataset(&self) -> Arc<Value> {
        Arc::clone(&self.root)
    }
}

/// Join a parent path and a key with `.`.
pub(crate) fn build_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

/// Describe a JSON value's type for error messages.
pub(crate) fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn validate(node: &Value, path: &str) -> Result<(), I18nError> {
    let Value::Object(map) = node else {
        return Ok(());
    };
    for (key, value) in map {
        let current = build_path(path, key);
        match value {
            Value::String(_) | Value::Array(_) => {}
            Value::Object(_) => validate(value, &current)?,
            other => {
                return Err(I18nError::invalid_schema(
                    &current,
                    format!("a {} is neither a template, an array nor an object", kind(other)),
                ))
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_accepts_strings_arrays_objects() {
        let schema = Schema::new(json!({
            "title": "Hello",
            "items": ["a", "b"],
            "nested": {"deeper": {"leaf": "x"}}
        }));
        assert!(schema.is_ok());
    }

    #[test]
    fn test_schema_rejects_non_object_root() {
        let err = Schema::new(json!(["a"])).unwrap_err();
        assert!(matches!(err, I18nError::InvalidSchema { .. }));
    }

    #[test]
    fn test_schema_rejects_number_leaf_with_path() {
        let err = Schema::new(json!({"home": {"count": 3}})).unwrap_err();
        match err {
            I18nError::InvalidSchema { path, reason } => {
                assert_eq!(path, "home.count");
                assert!(reason.contains("number"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_schema_rejects_null_and_bool() {
        assert!(Schema::new(json!({"a": null})).is_err());
        assert!(Schema::new(json!({"a": true})).is_err());
    }

    #[test]
    fn test_schema_dataset_shares_value() {
        let schema = Schema::new(json!({"a": "b"})).unwrap();
        let first = schema.dataset();
        let second = schema.dataset();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_build_path() {
        assert_eq!(build_path("", "greet"), "greet");
        assert_eq!(build_path("home", "title"), "home.title");
    }
}
