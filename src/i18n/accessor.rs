//! Accessor trees: the read interface produced from a schema and a dataset.
//!
//! A tree mirrors the schema key for key. String accessors hold callable
//! leaves; array accessors hold lists. Data keys the schema does not know are
//! never visited, and any key the dataset lacks resolves through the
//! [`FallbackMode`].

use crate::i18n::error::I18nError;
use crate::i18n::markup::Rendered;
use crate::i18n::schema::{build_path, kind};
use crate::i18n::template::{Template, Vars};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// How a key missing from the active dataset is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackMode {
    /// Missing strings render as their dotted path; missing arrays are empty.
    #[default]
    Development,
    /// Missing strings and arrays fall back to the schema's own values.
    Production,
}

impl std::str::FromStr for FallbackMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(FallbackMode::Development),
            "production" | "prod" => Ok(FallbackMode::Production),
            other => Err(format!("unknown fallback mode '{}'", other)),
        }
    }
}

/// A callable leaf of a string accessor.
#[derive(Debug, Clone, PartialEq)]
pub enum Leaf {
    /// Translation (or schema default) text evaluated with the caller's vars.
    Template(Template),
    /// A non-string dataset value; vars are ignored.
    Literal(String),
    /// A key missing in development mode; renders as its dotted path.
    MissingPath(String),
}

impl Leaf {
    /// Evaluate the leaf.
    pub fn call(&self, vars: Option<&Vars>) -> Rendered {
        match self {
            Leaf::Template(template) => template.render(vars),
            Leaf::Literal(text) | Leaf::MissingPath(text) => Rendered::Text(text.clone()),
        }
    }

    /// Evaluate the leaf and flatten any markup to plain text.
    pub fn text(&self, vars: Option<&Vars>) -> String {
        self.call(vars).to_plain_text()
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Leaf::MissingPath(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StringNode {
    Leaf(Leaf),
    Branch(StringAccessor),
}

/// Tree of callable leaves mirroring the schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringAccessor {
    entries: Vec<(String, StringNode)>,
}

impl StringAccessor {
    pub fn node(&self, key: &str) -> Option<&StringNode> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, node)| node)
    }

    pub fn leaf(&self, key: &str) -> Option<&Leaf> {
        match self.node(key)? {
            StringNode::Leaf(leaf) => Some(leaf),
            StringNode::Branch(_) => None,
        }
    }

    pub fn branch(&self, key: &str) -> Option<&StringAccessor> {
        match self.node(key)? {
            StringNode::Branch(branch) => Some(branch),
            StringNode::Leaf(_) => None,
        }
    }

    /// Look up a leaf by dotted path (`"home.title"`).
    pub fn get(&self, path: &str) -> Option<&Leaf> {
        let (parents, last) = match path.rsplit_once('.') {
            Some((parents, last)) => (Some(parents), last),
            None => (None, path),
        };
        let mut current = self;
        if let Some(parents) = parents {
            for key in parents.split('.') {
                current = current.branch(key)?;
            }
        }
        current.leaf(last)
    }

    /// Evaluate the leaf at `path`, if the schema has one there.
    pub fn render(&self, path: &str, vars: Option<&Vars>) -> Option<Rendered> {
        self.get(path).map(|leaf| leaf.call(vars))
    }

    /// Evaluate the leaf at `path` as plain text. Unknown paths render as
    /// themselves.
    pub fn text(&self, path: &str, vars: Option<&Vars>) -> String {
        match self.get(path) {
            Some(leaf) => leaf.text(vars),
            None => path.to_string(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StringNode)> {
        self.entries.iter().map(|(k, node)| (k.as_str(), node))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrayNode {
    List(Vec<Value>),
    Branch(ArrayAccessor),
}

/// Tree of lists mirroring the schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayAccessor {
    entries: Vec<(String, ArrayNode)>,
}

impl ArrayAccessor {
    pub fn node(&self, key: &str) -> Option<&ArrayNode> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, node)| node)
    }

    pub fn list(&self, key: &str) -> Option<&[Value]> {
        match self.node(key)? {
            ArrayNode::List(items) => Some(items.as_slice()),
            ArrayNode::Branch(_) => None,
        }
    }

    pub fn branch(&self, key: &str) -> Option<&ArrayAccessor> {
        match self.node(key)? {
            ArrayNode::Branch(branch) => Some(branch),
            ArrayNode::List(_) => None,
        }
    }

    /// Look up a list by dotted path.
    pub fn get(&self, path: &str) -> Option<&[Value]> {
        let (parents, last) = match path.rsplit_once('.') {
            Some((parents, last)) => (Some(parents), last),
            None => (None, path),
        };
        let mut current = self;
        if let Some(parents) = parents {
            for key in parents.split('.') {
                current = current.branch(key)?;
            }
        }
        current.list(last)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build a string accessor for `schema`, reading leaves from `data`.
///
/// `data` may be absent or partial; it is indexed by schema keys and never
/// iterated. Fails only when the schema has a leaf that is not a string, an
/// array or an object.
pub fn build_string_accessor(
    schema: &Value,
    data: Option<&Value>,
    path: &str,
    mode: FallbackMode,
) -> Result<StringAccessor, I18nError> {
    let Value::Object(keys) = schema else {
        return Err(I18nError::invalid_schema(path, "expected an object"));
    };
    let values = data.and_then(Value::as_object);

    let mut entries = Vec::with_capacity(keys.len());
    for (key, schema_value) in keys {
        let current = build_path(path, key);
        let data_value = values.and_then(|values| values.get(key));

        let node = match schema_value {
            Value::Object(_) => StringNode::Branch(build_string_accessor(
                schema_value,
                data_value,
                &current,
                mode,
            )?),
            Value::String(default) => {
                StringNode::Leaf(string_leaf(default, data_value, current, mode))
            }
            Value::Array(_) => StringNode::Leaf(match mode {
                FallbackMode::Development => Leaf::MissingPath(current),
                FallbackMode::Production => Leaf::Literal(String::new()),
            }),
            other => {
                return Err(I18nError::invalid_schema(
                    &current,
                    format!("unsupported {} leaf", kind(other)),
                ))
            }
        };
        entries.push((key.clone(), node));
    }

    Ok(StringAccessor { entries })
}

fn string_leaf(default: &str, value: Option<&Value>, path: String, mode: FallbackMode) -> Leaf {
    match value {
        Some(Value::String(text)) => Leaf::Template(Template::new(text.as_str())),
        Some(literal @ (Value::Number(_) | Value::Bool(_) | Value::Null)) => {
            Leaf::Literal(literal.to_string())
        }
        _ => {
            debug!("Missing translation at: {}", path);
            match mode {
                FallbackMode::Development => Leaf::MissingPath(path),
                FallbackMode::Production => Leaf::Template(Template::new(default)),
            }
        }
    }
}

/// Build an array accessor for `schema`, reading lists from `data`.
///
/// Lists are used verbatim. A missing list is empty in development mode
/// (with a warning) and the schema's own list in production mode.
pub fn build_array_accessor(
    schema: &Value,
    data: Option<&Value>,
    path: &str,
    mode: FallbackMode,
) -> Result<ArrayAccessor, I18nError> {
    let Value::Object(keys) = schema else {
        return Err(I18nError::invalid_schema(path, "expected an object"));
    };
    let values = data.and_then(Value::as_object);

    let mut entries = Vec::with_capacity(keys.len());
    for (key, schema_value) in keys {
        let current = build_path(path, key);
        let data_value = values.and_then(|values| values.get(key));

        let node = match schema_value {
            Value::Object(_) => ArrayNode::Branch(build_array_accessor(
                schema_value,
                data_value,
                &current,
                mode,
            )?),
            Value::Array(default) => match data_value {
                Some(Value::Array(items)) => ArrayNode::List(items.clone()),
                _ => match mode {
                    FallbackMode::Development => {
                        warn!("Missing array at: {}", current);
                        ArrayNode::List(Vec::new())
                    }
                    FallbackMode::Production => ArrayNode::List(default.clone()),
                },
            },
            Value::String(_) => ArrayNode::List(Vec::new()),
            other => {
                return Err(I18nError::invalid_schema(
                    &current,
                    format!("unsupported {} leaf", kind(other)),
                ))
            }
        };
        entries.push((key.clone(), node));
    }

    Ok(ArrayAccessor { entries })
}
