//! Template engine: `{{ name }}` substitution and leaf evaluation.
//!
//! A [`Template`] is compiled once when an accessor tree is built. It records
//! whether its text needs interpolation and/or tag parsing so that calling a
//! leaf never rescans for transforms it does not need.

use crate::i18n::markup::{parse_tags, Rendered};
use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::OnceLock;

/// Substitution variables passed to a leaf.
pub type Vars = serde_json::Map<String, Value>;

// Regex patterns (cached for performance)
static INTERPOLATION_REGEX: OnceLock<Regex> = OnceLock::new();
static HAS_VARS_REGEX: OnceLock<Regex> = OnceLock::new();
static HAS_TAGS_REGEX: OnceLock<Regex> = OnceLock::new();

fn interpolation_regex() -> &'static Regex {
    INTERPOLATION_REGEX.get_or_init(|| Regex::new(r"\{\{\s*([^}]+?)\s*\}\}").unwrap())
}

fn has_vars_regex() -> &'static Regex {
    HAS_VARS_REGEX.get_or_init(|| Regex::new(r"(?s)\{\{.*?\}\}").unwrap())
}

fn has_tags_regex() -> &'static Regex {
    HAS_TAGS_REGEX.get_or_init(|| Regex::new(r"(?s)\{[A-Za-z0-9_]+\{.*?\}\}").unwrap())
}

/// Replace every `{{ name }}` with the stringified value of `vars[name]`.
///
/// Missing variables (or `null` values) become the empty string. Substituted
/// text is not scanned again.
pub fn interpolate(text: &str, vars: Option<&Vars>) -> String {
    interpolation_regex()
        .replace_all(text, |caps: &Captures| {
            vars.and_then(|vars| vars.get(&caps[1]))
                .map(stringify)
                .unwrap_or_default()
        })
        .into_owned()
}

/// Names of all `{{ name }}` placeholders in `text`, in order of appearance.
pub fn placeholders(text: &str) -> Vec<String> {
    interpolation_regex()
        .captures_iter(text)
        .map(|cap| cap[1].to_string())
        .collect()
}

/// Stringify a substitution value.
///
/// Arrays are joined with `,` and objects are written as compact JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// A leaf text compiled for repeated evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    has_vars: bool,
    has_tags: bool,
}

impl Template {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let has_vars = has_vars_regex().is_match(&source);
        let has_tags = has_tags_regex().is_match(&source);
        Self {
            source,
            has_vars,
            has_tags,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn has_vars(&self) -> bool {
        self.has_vars
    }

    pub fn has_tags(&self) -> bool {
        self.has_tags
    }

    /// Interpolate (if needed), then parse tags (if needed).
    pub fn render(&self, vars: Option<&Vars>) -> Rendered {
        let text = if self.has_vars {
            interpolate(&self.source, vars)
        } else {
            self.source.clone()
        };

        if self.has_tags {
            parse_tags(&text)
        } else {
            Rendered::Text(text)
        }
    }
}
