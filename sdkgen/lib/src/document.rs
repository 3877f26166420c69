//! The parsed API description document.
//!
//! A [`SchemaDocument`] wraps the raw document tree and is never mutated once
//! built. Mapping order is the document's declaration order (`serde_json` is
//! compiled with `preserve_order`), which keeps every generation pass
//! deterministic.
//!
//! Two schema-location conventions are supported:
//!
//! - **Legacy** (`swagger: "2.0"`): schemas live under `definitions`
//! - **Current** (OpenAPI 3.x): schemas live under `components.schemas`

use serde_json::{Map, Value};

use crate::errors::GeneratorError;
use crate::resolver::escape_segment;

/// Where a document keeps its named schema definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaStyle {
    /// `definitions` at the document root.
    Legacy,
    /// `components.schemas`.
    Current,
}

impl SchemaStyle {
    /// The internal pointer prefix under which definitions are found.
    pub fn definitions_pointer(self) -> &'static str {
        match self {
            SchemaStyle::Legacy => "#/definitions",
            SchemaStyle::Current => "#/components/schemas",
        }
    }
}

/// An immutable, parsed API description.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDocument {
    root: Value,
}

impl SchemaDocument {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// Parses document text, choosing JSON when the text starts with `{` or `[`
    /// and YAML otherwise.
    ///
    /// ## Errors
    ///
    /// Returns `GeneratorError::DocumentParse` if the text is not valid in the
    /// chosen format.
    pub fn parse(text: &str) -> Result<Self, GeneratorError> {
        let trimmed = text.trim_start();
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            Self::from_json_str(text)
        } else {
            Self::from_yaml_str(text)
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self, GeneratorError> {
        serde_json::from_str(text)
            .map(Self::new)
            .map_err(|e| GeneratorError::DocumentParse(format!("invalid JSON: {}", e)))
    }

    /// Parses YAML text into the document tree.
    ///
    /// YAML allows non-string mapping keys (response codes are commonly
    /// written as bare `200:`); those keys are stringified.
    pub fn from_yaml_str(text: &str) -> Result<Self, GeneratorError> {
        let yaml: serde_yaml::Value = serde_yaml::from_str(text)
            .map_err(|e| GeneratorError::DocumentParse(format!("invalid YAML: {}", e)))?;
        Ok(Self::new(yaml_to_json(yaml)))
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Detects which schema-location convention the document follows.
    ///
    /// An explicit `swagger: "2.0"` marker wins. Otherwise a document with a
    /// root-level `definitions` table and no `components` is treated as legacy.
    pub fn style(&self) -> SchemaStyle {
        if self.root.get("swagger").and_then(Value::as_str) == Some("2.0") {
            return SchemaStyle::Legacy;
        }
        if self.root.get("components").is_none() && self.root.get("definitions").is_some() {
            return SchemaStyle::Legacy;
        }
        SchemaStyle::Current
    }

    /// The definition table, in declaration order.
    pub fn definitions(&self) -> impl Iterator<Item = (&String, &Value)> {
        let table = match self.style() {
            SchemaStyle::Legacy => self.root.get("definitions"),
            SchemaStyle::Current => self
                .root
                .get("components")
                .and_then(|components| components.get("schemas")),
        };
        table.and_then(Value::as_object).into_iter().flatten()
    }

    /// The pointer a `$ref` uses to reach the definition named `key`.
    pub fn definition_pointer(&self, key: &str) -> String {
        format!("{}/{}", self.style().definitions_pointer(), escape_segment(key))
    }

    /// The `paths` table, in declaration order.
    pub fn paths(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.root
            .get("paths")
            .and_then(Value::as_object)
            .into_iter()
            .flatten()
    }

    /// Looks up one operation object (`paths.<path>.<verb>`).
    pub fn operation(&self, path: &str, verb: &str) -> Option<&Value> {
        self.root.get("paths")?.get(path)?.get(verb)
    }
}

fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => {
            Value::Array(items.into_iter().map(yaml_to_json).collect())
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut map = Map::new();
            for (key, value) in mapping {
                map.insert(yaml_key(key), yaml_to_json(value));
            }
            Value::Object(map)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}
