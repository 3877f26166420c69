//! Normalized schema descriptors.
//!
//! Raw schema nodes are arbitrarily nested mappings. They are normalized once
//! into a [`TypeDescriptor`] so that later stages match on a closed set of
//! shapes instead of re-inspecting the raw tree.

use serde_json::Value;

/// Primitive type tags understood by the type mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Number,
    Integer,
    Boolean,
    String,
}

impl Primitive {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "number" => Some(Primitive::Number),
            "integer" => Some(Primitive::Integer),
            "boolean" => Some(Primitive::Boolean),
            "string" => Some(Primitive::String),
            _ => None,
        }
    }
}

/// The normalized shape of one schema node.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    /// `{"$ref": "#/..."}`
    Ref(String),
    /// A primitive with an optional `format` (e.g. `float`, `double`, `date-time`).
    Scalar {
        primitive: Primitive,
        format: Option<String>,
    },
    /// An array; `items` is `None` when the node declares no item schema.
    Array { items: Option<Box<TypeDescriptor>> },
    /// An object, possibly titled, possibly open (`additionalProperties`).
    Object {
        title: Option<String>,
        additional_properties: bool,
    },
    /// Missing or unrecognized type tag.
    Unknown,
}

impl TypeDescriptor {
    /// Normalizes a raw schema node. Never fails: anything unrecognized
    /// becomes [`TypeDescriptor::Unknown`].
    pub fn from_schema(node: &Value) -> Self {
        if let Some(pointer) = node.get("$ref").and_then(Value::as_str) {
            return TypeDescriptor::Ref(pointer.to_string());
        }

        let Some(tag) = type_tag(node) else {
            return TypeDescriptor::Unknown;
        };

        match tag {
            "array" => TypeDescriptor::Array {
                items: node
                    .get("items")
                    .filter(|items| items.is_object())
                    .map(|items| Box::new(TypeDescriptor::from_schema(items))),
            },
            "object" => TypeDescriptor::Object {
                title: node.get("title").and_then(Value::as_str).map(str::to_string),
                additional_properties: node
                    .get("additionalProperties")
                    .is_some_and(is_truthy),
            },
            other => match Primitive::from_tag(other) {
                Some(primitive) => TypeDescriptor::Scalar {
                    primitive,
                    format: node.get("format").and_then(Value::as_str).map(str::to_string),
                },
                None => TypeDescriptor::Unknown,
            },
        }
    }

    pub fn scalar(primitive: Primitive, format: Option<&str>) -> Self {
        TypeDescriptor::Scalar {
            primitive,
            format: format.map(str::to_string),
        }
    }

    pub fn array_of(items: TypeDescriptor) -> Self {
        TypeDescriptor::Array {
            items: Some(Box::new(items)),
        }
    }
}

/// Reads the `type` tag. OpenAPI 3.1 allows a list (`["number", "null"]`);
/// the first non-null entry is used.
fn type_tag(node: &Value) -> Option<&str> {
    match node.get("type")? {
        Value::String(tag) => Some(tag.as_str()),
        Value::Array(tags) => tags
            .iter()
            .filter_map(Value::as_str)
            .find(|tag| *tag != "null"),
        _ => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Object(map) => !map.is_empty(),
        Value::Null => false,
        _ => true,
    }
}
