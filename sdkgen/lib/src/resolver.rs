//! Internal reference resolution.
//!
//! Pointers take the form `#/a/b/c`: the leading `#` anchor is discarded and
//! each remaining segment is looked up in turn, starting at the document root.
//! Segments use JSON Pointer escaping (`~1` for `/`, `~0` for `~`).

use std::collections::HashSet;

use serde_json::Value;

use crate::document::SchemaDocument;
use crate::errors::GeneratorError;

/// Resolves `pointer` to the node it designates.
///
/// ## Examples
///
/// ```
/// use sdkgen_lib::document::SchemaDocument;
/// use sdkgen_lib::resolver::resolve;
///
/// let doc = SchemaDocument::parse(r#"{"components": {"schemas": {"Foo": {"title": "Foo"}}}}"#).unwrap();
/// let node = resolve(&doc, "#/components/schemas/Foo").unwrap();
/// assert_eq!(node["title"], "Foo");
/// ```
///
/// ## Errors
///
/// - `GeneratorError::InvalidReference` if the pointer does not start with `#`
/// - `GeneratorError::UnresolvedReference` as soon as one segment lookup misses,
///   naming both the pointer and the failing segment
pub fn resolve<'a>(document: &'a SchemaDocument, pointer: &str) -> Result<&'a Value, GeneratorError> {
    let Some(rest) = pointer.strip_prefix('#') else {
        return Err(GeneratorError::InvalidReference(pointer.to_string()));
    };

    let mut node = document.root();
    for raw in rest.split('/').filter(|segment| !segment.is_empty()) {
        let segment = unescape(raw);
        let next = match node {
            Value::Object(map) => map.get(&segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        node = next.ok_or_else(|| GeneratorError::UnresolvedReference {
            pointer: pointer.to_string(),
            segment: segment.clone(),
        })?;
    }
    Ok(node)
}

/// Returns the `$ref` pointer of a node, if it carries one.
pub fn ref_of(node: &Value) -> Option<&str> {
    node.get("$ref").and_then(Value::as_str)
}

/// The final path segment of a pointer (`#/components/schemas/Foo` -> `Foo`).
pub fn last_segment(pointer: &str) -> String {
    unescape(pointer.rsplit('/').next().unwrap_or(pointer))
}

/// Follows chains of `$ref`s, guarding against cycles.
///
/// A node that is itself only a reference (`{"$ref": "..."}`) is followed
/// until a concrete node is reached. Revisiting a pointer is an error rather
/// than unbounded recursion.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceResolver<'a> {
    document: &'a SchemaDocument,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(document: &'a SchemaDocument) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &'a SchemaDocument {
        self.document
    }

    /// Resolves a single pointer without following further references.
    pub fn resolve(&self, pointer: &str) -> Result<&'a Value, GeneratorError> {
        resolve(self.document, pointer)
    }

    /// Resolves `pointer` and keeps following while the target is a `$ref` node.
    ///
    /// ## Errors
    ///
    /// Returns `GeneratorError::CyclicReference` when a pointer is reached twice.
    pub fn resolve_chain(&self, pointer: &str) -> Result<&'a Value, GeneratorError> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut current = pointer.to_string();
        loop {
            if !visited.insert(current.clone()) {
                return Err(GeneratorError::CyclicReference { pointer: current });
            }
            let node = self.resolve(&current)?;
            match ref_of(node) {
                Some(next) => current = next.to_string(),
                None => return Ok(node),
            }
        }
    }

    /// Returns `node` itself, or the end of its reference chain if it is a `$ref`.
    pub fn deref(&self, node: &'a Value) -> Result<&'a Value, GeneratorError> {
        match ref_of(node) {
            Some(pointer) => self.resolve_chain(pointer),
            None => Ok(node),
        }
    }
}

/// Escapes one pointer segment (`~` -> `~0`, `/` -> `~1`).
pub fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}
