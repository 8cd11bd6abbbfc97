//! Translation quality validation.
//!
//! Compares a language's dataset with the default-language schema and reports
//! anything the accessor builder would have to paper over at runtime: shape
//! mismatches, missing or extra keys, and leaves whose placeholders or markup
//! tags differ from the schema's.

use crate::i18n::schema::{build_path, kind};
use crate::i18n::template::placeholders;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Validation report containing errors and warnings about a translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Shape mismatches the accessor builder cannot use
    pub errors: Vec<String>,

    /// Gaps and drift that fall back to schema behaviour
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// Create a new empty validation report
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Check if the report has any errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Check if the report has any warnings
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Check if the report is clean (no errors or warnings)
    pub fn is_clean(&self) -> bool {
        !self.has_errors() && !self.has_warnings()
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Validator for translation datasets.
pub struct TranslationValidator;

static TAG_NAME_REGEX: OnceLock<Regex> = OnceLock::new();

impl TranslationValidator {
    /// Validate `dataset` against `schema`.
    ///
    /// # Arguments
    /// * `schema` - The default language's strings
    /// * `dataset` - Another language's strings
    ///
    /// # Returns
    /// A `ValidationReport`; errors for shape mismatches, warnings for
    /// missing keys, extra keys, and placeholder or tag drift.
    pub fn validate(schema: &Value, dataset: &Value) -> ValidationReport {
        let mut report = ValidationReport::new();
        Self::compare(schema, dataset, "", &mut report);
        report
    }

    fn compare(schema: &Value, data: &Value, path: &str, report: &mut ValidationReport) {
        let display = if path.is_empty() { "<root>" } else { path };

        match (schema, data) {
            (Value::Object(schema_map), Value::Object(data_map)) => {
                for (key, schema_value) in schema_map {
                    let current = build_path(path, key);
                    match data_map.get(key) {
                        Some(data_value) => {
                            Self::compare(schema_value, data_value, &current, report)
                        }
                        None => report.warnings.push(format!("Missing key: {}", current)),
                    }
                }
                for key in data_map.keys().filter(|k| !schema_map.contains_key(*k)) {
                    report
                        .warnings
                        .push(format!("Extra key: {}", build_path(path, key)));
                }
            }
            (Value::String(original), Value::String(translated)) => {
                Self::compare_leaf(original, translated, display, report);
            }
            (Value::Array(_), Value::Array(_)) => {}
            (Value::String(_), Value::Number(_) | Value::Bool(_) | Value::Null) => {
                report.warnings.push(format!(
                    "Non-string value at {}: {} will render as its JSON text",
                    display,
                    kind(data)
                ));
            }
            _ => {
                report.errors.push(format!(
                    "Shape mismatch at {}: expected {}, found {}",
                    display,
                    kind(schema),
                    kind(data)
                ));
            }
        }
    }

    fn compare_leaf(original: &str, translated: &str, path: &str, report: &mut ValidationReport) {
        let orig_vars: BTreeSet<String> = placeholders(original).into_iter().collect();
        let trans_vars: BTreeSet<String> = placeholders(translated).into_iter().collect();
        if orig_vars != trans_vars {
            report.warnings.push(format!(
                "Placeholder mismatch at {}: original has {:?}, translation has {:?}",
                path, orig_vars, trans_vars
            ));
        }

        let orig_tags = Self::extract_tags(original);
        let trans_tags = Self::extract_tags(translated);
        if orig_tags != trans_tags {
            report.warnings.push(format!(
                "Tag mismatch at {}: original has {:?}, translation has {:?}",
                path, orig_tags, trans_tags
            ));
        }
    }

    /// Extract all `{tag{` openers from text
    fn extract_tags(text: &str) -> BTreeSet<String> {
        let regex = TAG_NAME_REGEX.get_or_init(|| Regex::new(r"\{([A-Za-z0-9_]+)\{").unwrap());

        regex
            .captures_iter(text)
            .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
            .collect()
    }
}
