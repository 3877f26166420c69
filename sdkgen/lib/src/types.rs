//! Mapping from schema descriptors to generated Rust types.
//!
//! [`TypeMapper::map`] is total over well-formed input: every descriptor maps
//! to some [`TypeName`], with `String` as the fallback whenever the schema
//! carries too little information. The only failure is a `$ref` that cannot
//! be resolved, which is fatal for whatever definition or endpoint used it.
//!
//! ## Rules (in precedence order)
//!
//! 1. `$ref` -> the resolved node's `title`, else the pointer's last segment
//! 2. `number` + `float` -> `Option<f32>`; other `number` -> `Option<f64>`;
//!    `integer` -> `Option<i32>`; `boolean` -> `Option<bool>`
//! 3. `array` -> `Vec<T>` (`Vec<String>` without item information)
//! 4. titled `object` -> the named model; `additionalProperties` ->
//!    `HashMap<String, serde_json::Value>`; otherwise
//!    `serde_json::Map<String, serde_json::Value>`
//! 5. anything else -> `String`
//!
//! Numeric and boolean types are nullable so that "not supplied" stays
//! distinct from zero or `false`.
//!
//! A mapper built with [`TypeMapper::with_names`] names references and
//! titled objects from a [`ModelNames`] table, so every emitted type name is
//! a struct that is actually generated.

use std::collections::{HashMap, HashSet};
use std::fmt;

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use serde_json::Value;
use tracing::debug;

use crate::document::SchemaDocument;
use crate::errors::GeneratorError;
use crate::naming::to_type_name;
use crate::resolver::{ReferenceResolver, last_segment, ref_of};
use crate::schema::{Primitive, TypeDescriptor};

/// Import path that brings a named model into scope.
pub const MODELS_MODULE: &str = "crate::models";

/// A generated Rust type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeName {
    /// `Option<f32>`
    Float,
    /// `Option<f64>`
    Double,
    /// `Option<i32>`
    Integer,
    /// `Option<bool>`
    Boolean,
    String,
    /// `Vec<T>`
    List(Box<TypeName>),
    /// A generated model type.
    Named(String),
    /// `HashMap<String, serde_json::Value>`
    OpenMap,
    /// `serde_json::Map<String, serde_json::Value>`
    AnyMap,
}

impl TypeName {
    /// Whether this is one of the nullable numeric or boolean types.
    pub fn is_nullable_scalar(&self) -> bool {
        matches!(
            self,
            TypeName::Float | TypeName::Double | TypeName::Integer | TypeName::Boolean
        )
    }

    pub fn is_container(&self) -> bool {
        matches!(self, TypeName::List(_))
    }

    /// The type as written in a field or optional-argument position.
    pub fn tokens(&self) -> TokenStream {
        match self {
            TypeName::Float => quote! { Option<f32> },
            TypeName::Double => quote! { Option<f64> },
            TypeName::Integer => quote! { Option<i32> },
            TypeName::Boolean => quote! { Option<bool> },
            TypeName::String => quote! { String },
            TypeName::List(inner) => {
                let inner = inner.tokens();
                quote! { Vec<#inner> }
            }
            TypeName::Named(name) => {
                let ident = format_ident!("{}", name);
                quote! { #ident }
            }
            TypeName::OpenMap => quote! { HashMap<String, serde_json::Value> },
            TypeName::AnyMap => quote! { serde_json::Map<String, serde_json::Value> },
        }
    }

    /// The type a caller must supply for a required argument: nullable
    /// scalars lose their `Option`, everything else is unchanged.
    pub fn required_tokens(&self) -> TokenStream {
        match self {
            TypeName::Float => quote! { f32 },
            TypeName::Double => quote! { f64 },
            TypeName::Integer => quote! { i32 },
            TypeName::Boolean => quote! { bool },
            other => other.tokens(),
        }
    }

    /// The type used for an optional argument or field: always exactly one
    /// layer of `Option`.
    pub fn optional_tokens(&self) -> TokenStream {
        if self.is_nullable_scalar() {
            self.tokens()
        } else {
            let inner = self.tokens();
            quote! { Option<#inner> }
        }
    }

    /// `use` paths this type needs, e.g. `std::collections::HashMap`.
    pub fn imports(&self) -> Vec<String> {
        match self {
            TypeName::List(inner) => inner.imports(),
            TypeName::Named(name) => vec![format!("{}::{}", MODELS_MODULE, name)],
            TypeName::OpenMap => vec!["std::collections::HashMap".to_string()],
            _ => Vec::new(),
        }
    }

    /// Named model types referenced by this type, outermost first.
    pub fn named_types(&self) -> Vec<&str> {
        match self {
            TypeName::List(inner) => inner.named_types(),
            TypeName::Named(name) => vec![name.as_str()],
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeName::Float => write!(f, "Option<f32>"),
            TypeName::Double => write!(f, "Option<f64>"),
            TypeName::Integer => write!(f, "Option<i32>"),
            TypeName::Boolean => write!(f, "Option<bool>"),
            TypeName::String => write!(f, "String"),
            TypeName::List(inner) => write!(f, "Vec<{}>", inner),
            TypeName::Named(name) => write!(f, "{}", name),
            TypeName::OpenMap => write!(f, "HashMap<String, serde_json::Value>"),
            TypeName::AnyMap => write!(f, "serde_json::Map<String, serde_json::Value>"),
        }
    }
}

/// Struct names of every model that will be emitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelNames {
    by_pointer: HashMap<String, String>,
    emitted: HashSet<String>,
}

impl ModelNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the struct emitted for the definition at `pointer`.
    pub fn insert_definition(&mut self, pointer: impl Into<String>, name: &str) {
        self.by_pointer.insert(pointer.into(), name.to_string());
        self.emitted.insert(name.to_string());
    }

    /// Records a struct emitted for a titled inline object. Returns `false`
    /// when a struct of that name already exists.
    pub fn insert_inline(&mut self, name: &str) -> bool {
        self.emitted.insert(name.to_string())
    }

    pub fn for_pointer(&self, pointer: &str) -> Option<&str> {
        self.by_pointer.get(pointer).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.emitted.contains(name)
    }
}

/// Maps [`TypeDescriptor`]s to [`TypeName`]s against one document.
#[derive(Debug, Clone, Copy)]
pub struct TypeMapper<'a> {
    resolver: ReferenceResolver<'a>,
    names: Option<&'a ModelNames>,
}

impl<'a> TypeMapper<'a> {
    /// A mapper that names references by title, else by the pointer's last
    /// segment.
    pub fn new(document: &'a SchemaDocument) -> Self {
        Self {
            resolver: ReferenceResolver::new(document),
            names: None,
        }
    }

    /// A mapper that names types only after emitted models. A reference to
    /// anything else is mapped by the shape of its target, and a titled
    /// object without a model becomes a plain JSON map.
    pub fn with_names(document: &'a SchemaDocument, names: &'a ModelNames) -> Self {
        Self {
            resolver: ReferenceResolver::new(document),
            names: Some(names),
        }
    }

    pub fn resolver(&self) -> ReferenceResolver<'a> {
        self.resolver
    }

    /// Maps a descriptor to a type name.
    ///
    /// ## Errors
    ///
    /// Only reference resolution can fail; see [`crate::resolver::resolve`].
    pub fn map(&self, descriptor: &TypeDescriptor) -> Result<TypeName, GeneratorError> {
        match descriptor {
            TypeDescriptor::Ref(pointer) => {
                let node = self.resolver.resolve(pointer)?;
                if let Some(names) = self.names {
                    if let Some(name) = names.for_pointer(pointer) {
                        return Ok(TypeName::Named(name.to_string()));
                    }
                    if let Some(next) = ref_of(node) {
                        // Fails on a cycle before recursing.
                        self.resolver.resolve_chain(pointer)?;
                        return self.map(&TypeDescriptor::Ref(next.to_string()));
                    }
                    return self.map_schema(node);
                }
                let name = node
                    .get("title")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| last_segment(pointer));
                Ok(TypeName::Named(to_type_name(&name)))
            }
            TypeDescriptor::Scalar { primitive, format } => Ok(match primitive {
                Primitive::Number if format.as_deref() == Some("float") => TypeName::Float,
                Primitive::Number => TypeName::Double,
                Primitive::Integer => TypeName::Integer,
                Primitive::Boolean => TypeName::Boolean,
                Primitive::String => TypeName::String,
            }),
            TypeDescriptor::Array { items } => {
                let inner = match items {
                    Some(items) => self.map(items)?,
                    None => {
                        debug!("array schema without items; element type defaults to String");
                        TypeName::String
                    }
                };
                Ok(TypeName::List(Box::new(inner)))
            }
            TypeDescriptor::Object {
                title,
                additional_properties,
            } => Ok(match (title, additional_properties) {
                (Some(title), _) => {
                    let name = to_type_name(title);
                    match self.names {
                        Some(names) if !names.contains(&name) => {
                            debug!(title = %title, "titled object has no model; mapping to a JSON map");
                            TypeName::AnyMap
                        }
                        _ => TypeName::Named(name),
                    }
                }
                (None, true) => TypeName::OpenMap,
                (None, false) => TypeName::AnyMap,
            }),
            TypeDescriptor::Unknown => {
                debug!("schema without a recognized type; defaulting to String");
                Ok(TypeName::String)
            }
        }
    }

    /// Normalizes a raw schema node and maps it.
    pub fn map_schema(&self, node: &Value) -> Result<TypeName, GeneratorError> {
        self.map(&TypeDescriptor::from_schema(node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> SchemaDocument {
        SchemaDocument::new(json!({
            "components": {
                "schemas": {
                    "RadiationResponse": {"title": "RadiationResponse", "type": "object"},
                    "Untitled": {"type": "object"},
                    "Renamed": {"title": "Pv Site", "type": "object"}
                }
            }
        }))
    }

    fn map(node: serde_json::Value) -> TypeName {
        let doc = doc();
        TypeMapper::new(&doc).map_schema(&node).unwrap()
    }

    #[test]
    fn ref_uses_title() {
        assert_eq!(
            map(json!({"$ref": "#/components/schemas/RadiationResponse"})),
            TypeName::Named("RadiationResponse".to_string())
        );
        assert_eq!(
            map(json!({"$ref": "#/components/schemas/Renamed"})),
            TypeName::Named("PvSite".to_string())
        );
    }

    #[test]
    fn ref_without_title_uses_last_segment() {
        assert_eq!(
            map(json!({"$ref": "#/components/schemas/Untitled"})),
            TypeName::Named("Untitled".to_string())
        );
    }

    #[test]
    fn unresolved_ref_is_fatal() {
        let doc = doc();
        let result = TypeMapper::new(&doc).map_schema(&json!({"$ref": "#/components/schemas/Missing"}));
        assert!(matches!(
            result,
            Err(GeneratorError::UnresolvedReference { ref segment, .. }) if segment == "Missing"
        ));
    }

    #[test]
    fn number_formats() {
        assert_eq!(map(json!({"type": "number", "format": "float"})), TypeName::Float);
        assert_eq!(map(json!({"type": "number", "format": "double"})), TypeName::Double);
        assert_eq!(map(json!({"type": "number"})), TypeName::Double);
        assert_eq!(map(json!({"type": "number", "format": "decimal"})), TypeName::Double);
    }

    #[test]
    fn integer_and_boolean_are_nullable() {
        let integer = map(json!({"type": "integer", "format": "int64"}));
        assert_eq!(integer, TypeName::Integer);
        assert!(integer.is_nullable_scalar());
        assert_eq!(integer.to_string(), "Option<i32>");
        assert_eq!(map(json!({"type": "boolean"})).to_string(), "Option<bool>");
    }

    #[test]
    fn arrays() {
        assert_eq!(
            map(json!({"type": "array", "items": {"type": "number"}})).to_string(),
            "Vec<Option<f64>>"
        );
        assert_eq!(
            map(json!({"type": "array", "items": {"$ref": "#/components/schemas/RadiationResponse"}}))
                .to_string(),
            "Vec<RadiationResponse>"
        );
        assert_eq!(map(json!({"type": "array"})).to_string(), "Vec<String>");
    }

    #[test]
    fn objects() {
        assert_eq!(
            map(json!({"type": "object", "title": "Site"})),
            TypeName::Named("Site".to_string())
        );
        assert_eq!(
            map(json!({"type": "object", "additionalProperties": true})).to_string(),
            "HashMap<String, serde_json::Value>"
        );
        assert_eq!(
            map(json!({"type": "object"})).to_string(),
            "serde_json::Map<String, serde_json::Value>"
        );
    }

    #[test]
    fn unknown_defaults_to_string() {
        assert_eq!(map(json!({})), TypeName::String);
        assert_eq!(map(json!({"type": "string", "format": "date-time"})), TypeName::String);
        assert_eq!(map(json!({"type": "mystery"})), TypeName::String);
    }

    #[test]
    fn every_shape_maps_to_a_non_empty_name() {
        let shapes = [
            json!({"$ref": "#/components/schemas/RadiationResponse"}),
            json!({"type": "number", "format": "float"}),
            json!({"type": "number", "format": "double"}),
            json!({"type": "integer"}),
            json!({"type": "boolean"}),
            json!({"type": "array", "items": {"type": "integer"}}),
            json!({"type": "object", "title": "Titled"}),
            json!({"type": "object", "additionalProperties": {}}),
            json!({"type": "object", "additionalProperties": {"type": "string"}}),
            json!({"type": "object"}),
            json!({"type": 42}),
        ];
        for shape in shapes {
            let name = map(shape.clone());
            assert!(!name.to_string().is_empty(), "empty type name for {}", shape);
            assert!(syn::parse_str::<syn::Type>(&name.to_string()).is_ok());
        }
    }

    #[test]
    fn required_and_optional_tokens() {
        assert_eq!(TypeName::Integer.required_tokens().to_string(), "i32");
        assert_eq!(TypeName::Integer.optional_tokens().to_string(), "Option < i32 >");
        assert_eq!(TypeName::String.optional_tokens().to_string(), "Option < String >");
        assert_eq!(
            TypeName::List(Box::new(TypeName::String)).required_tokens().to_string(),
            "Vec < String >"
        );
    }

    #[test]
    fn imports_follow_the_type() {
        assert_eq!(
            TypeName::List(Box::new(TypeName::Named("Site".to_string()))).imports(),
            vec!["crate::models::Site".to_string()]
        );
        assert_eq!(TypeName::OpenMap.imports(), vec!["std::collections::HashMap".to_string()]);
        assert!(TypeName::Double.imports().is_empty());
    }

    #[test]
    fn named_mapping_uses_the_emitted_struct() {
        let doc = SchemaDocument::new(json!({
            "components": {
                "schemas": {
                    "A": {"title": "Same", "type": "object"},
                    "B": {"title": "Same", "type": "object"}
                },
                "responses": {
                    "Plain": {"type": "object", "additionalProperties": true},
                    "Alias": {"$ref": "#/components/schemas/B"}
                }
            }
        }));
        let mut names = ModelNames::new();
        names.insert_definition("#/components/schemas/A", "Same");
        names.insert_definition("#/components/schemas/B", "Same_2");
        let mapper = TypeMapper::with_names(&doc, &names);

        let map = |node: serde_json::Value| mapper.map_schema(&node).unwrap();
        assert_eq!(
            map(json!({"$ref": "#/components/schemas/B"})),
            TypeName::Named("Same_2".to_string())
        );
        assert_eq!(
            map(json!({"$ref": "#/components/responses/Alias"})),
            TypeName::Named("Same_2".to_string())
        );
        assert_eq!(map(json!({"$ref": "#/components/responses/Plain"})), TypeName::OpenMap);
        assert_eq!(map(json!({"type": "object", "title": "Same"})), TypeName::Named("Same".to_string()));
        assert_eq!(map(json!({"type": "object", "title": "Nowhere"})), TypeName::AnyMap);
    }
}
