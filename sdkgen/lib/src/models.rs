//! Model synthesis from the document's definition table.
//!
//! Each definition becomes one struct with one field per declared property.
//! A definition whose name contains `request` (any case) is a request model;
//! everything else is a response model. The split is a naming heuristic and
//! nothing more.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde_json::Value;
use tracing::debug;

use crate::document::SchemaDocument;
use crate::endpoint::{operation_schemas, operations};
use crate::errors::GeneratorError;
use crate::naming::{UniqueNames, to_snake_case, to_type_name};
use crate::resolver::ReferenceResolver;
use crate::schema::TypeDescriptor;
use crate::types::{MODELS_MODULE, ModelNames, TypeMapper, TypeName};

/// Which `models` submodule a struct is emitted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelKind {
    Request,
    Response,
}

impl ModelKind {
    /// Classifies a definition by name.
    pub fn of(definition_name: &str) -> Self {
        if definition_name.to_lowercase().contains("request") {
            ModelKind::Request
        } else {
            ModelKind::Response
        }
    }

    pub fn module(self) -> &'static str {
        match self {
            ModelKind::Request => "requests",
            ModelKind::Response => "responses",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Property name in the document; used for serde renames.
    pub wire_name: String,
    /// Rust field name, unique within the struct.
    pub ident: String,
    pub type_name: TypeName,
    pub required: bool,
    /// Set when the field leads back to its own struct and must be boxed.
    pub boxed: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelDescriptor {
    /// Definition key, or the title of an inline object.
    pub definition: String,
    /// Struct name.
    pub name: String,
    pub kind: ModelKind,
    pub description: Option<String>,
    pub fields: Vec<FieldDescriptor>,
    pub imports: BTreeSet<String>,
}

/// One struct the crate will emit.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry<'a> {
    /// Definition key, or the title of an inline object.
    pub source: String,
    pub name: String,
    pub kind: ModelKind,
    /// The schema node, with any `$ref` chain already followed.
    pub node: &'a Value,
}

/// Every model of one document and the struct name each one gets.
///
/// Definitions come first, in declaration order, named by their `title`,
/// else their key; repeated names get numeric suffixes. Titled inline
/// objects follow. They are collected from definition properties, from
/// endpoint parameters and request bodies (request models) and from `200`
/// responses (response models), and from their own properties in turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelCatalog<'a> {
    entries: Vec<CatalogEntry<'a>>,
    names: ModelNames,
}

impl<'a> ModelCatalog<'a> {
    /// ## Errors
    ///
    /// Returns an error if a definition alias or an endpoint schema `$ref`
    /// does not resolve or is cyclic.
    pub fn build(document: &'a SchemaDocument) -> Result<Self, GeneratorError> {
        let resolver = ReferenceResolver::new(document);
        let mut claimed = UniqueNames::new();
        let mut names = ModelNames::new();
        let mut entries = Vec::new();
        let mut pending: Vec<(String, ModelKind, &'a Value)> = Vec::new();

        for (key, definition) in document.definitions() {
            let node = resolver.deref(definition)?;
            // Named from the definition as written, which is what a `$ref` to it sees.
            let base = to_type_name(definition.get("title").and_then(Value::as_str).unwrap_or(key));
            let name = claimed.claim(&base);
            if name != base {
                debug!(definition = %key, name = %name, "model name already taken; renamed");
            }
            names.insert_definition(document.definition_pointer(key), &name);
            let kind = ModelKind::of(key);
            collect_property_objects(node, kind, &mut pending);
            entries.push(CatalogEntry {
                source: key.clone(),
                name,
                kind,
                node,
            });
        }

        for (_, _, operation) in operations(document) {
            let schemas = operation_schemas(resolver, operation)?;
            for schema in schemas.inputs {
                collect_titled_object(schema, ModelKind::Request, &mut pending);
            }
            for schema in schemas.outputs {
                collect_titled_object(schema, ModelKind::Response, &mut pending);
            }
        }

        let mut cursor = 0;
        while cursor < pending.len() {
            let (title, kind, node) = pending[cursor].clone();
            cursor += 1;
            let name = to_type_name(&title);
            if !names.insert_inline(&name) {
                continue;
            }
            collect_property_objects(node, kind, &mut pending);
            entries.push(CatalogEntry {
                source: title,
                name,
                kind,
                node,
            });
        }

        Ok(Self { entries, names })
    }

    pub fn entries(&self) -> &[CatalogEntry<'a>] {
        &self.entries
    }

    /// The name table a [`TypeMapper`] should use for this document.
    pub fn names(&self) -> &ModelNames {
        &self.names
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ModelSynthesizer<'a> {
    mapper: TypeMapper<'a>,
}

impl<'a> ModelSynthesizer<'a> {
    pub fn new(mapper: TypeMapper<'a>) -> Self {
        Self { mapper }
    }

    /// Builds one model per catalog entry, in catalog order.
    ///
    /// A field whose struct can reach the enclosing struct again through
    /// direct (non-`Vec`) fields is boxed, so mutually recursive models
    /// still have a finite size.
    ///
    /// ## Errors
    ///
    /// Returns an error for the first property type that does not resolve.
    pub fn synthesize_all(
        &self,
        catalog: &ModelCatalog<'_>,
    ) -> Result<Vec<ModelDescriptor>, GeneratorError> {
        let mut models = catalog
            .entries()
            .iter()
            .map(|entry| self.synthesize(&entry.source, &entry.name, entry.kind, entry.node))
            .collect::<Result<Vec<_>, _>>()?;
        box_recursive_fields(&mut models);
        Ok(models)
    }

    /// Builds one model from a definition node.
    pub fn synthesize(
        &self,
        definition: &str,
        name: &str,
        kind: ModelKind,
        node: &Value,
    ) -> Result<ModelDescriptor, GeneratorError> {
        let required: HashSet<&str> = node
            .get("required")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .collect();

        let mut imports = BTreeSet::new();
        imports.insert("serde::Deserialize".to_string());
        imports.insert("serde::Serialize".to_string());

        let mut idents = UniqueNames::new();
        let mut fields = Vec::new();
        for (property, schema) in properties(node) {
            let type_name = self.mapper.map(&TypeDescriptor::from_schema(schema))?;
            for import in type_name.imports() {
                if import != format!("{}::{}", MODELS_MODULE, name) {
                    imports.insert(import);
                }
            }
            let mut snake = to_snake_case(property);
            if snake.is_empty() {
                snake = "field".to_string();
            }
            fields.push(FieldDescriptor {
                wire_name: property.clone(),
                ident: idents.claim(&snake),
                boxed: type_name == TypeName::Named(name.to_string()),
                type_name,
                required: required.contains(property.as_str()),
                description: schema
                    .get("description")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            });
        }

        Ok(ModelDescriptor {
            definition: definition.to_string(),
            name: name.to_string(),
            kind,
            description: node
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
            fields,
            imports,
        })
    }
}

fn properties(node: &Value) -> impl Iterator<Item = (&String, &Value)> {
    node.get("properties")
        .and_then(Value::as_object)
        .into_iter()
        .flatten()
}

/// Queues the titled objects declared in a node's properties.
fn collect_property_objects<'a>(
    node: &'a Value,
    kind: ModelKind,
    pending: &mut Vec<(String, ModelKind, &'a Value)>,
) {
    for (_, schema) in properties(node) {
        collect_titled_object(schema, kind, pending);
    }
}

/// Queues `schema` (or its array items) when it is a titled inline object.
fn collect_titled_object<'a>(
    schema: &'a Value,
    kind: ModelKind,
    pending: &mut Vec<(String, ModelKind, &'a Value)>,
) {
    let mut candidate = schema;
    while candidate.get("type").and_then(Value::as_str) == Some("array") {
        match candidate.get("items") {
            Some(items) => candidate = items,
            None => return,
        }
    }
    let is_object = candidate.get("type").and_then(Value::as_str) == Some("object");
    if candidate.get("$ref").is_some() || !is_object {
        return;
    }
    if let Some(title) = candidate.get("title").and_then(Value::as_str) {
        pending.push((title.to_string(), kind, candidate));
    }
}

/// Boxes every field on a cycle of direct struct references.
fn box_recursive_fields(models: &mut [ModelDescriptor]) {
    let edges: HashMap<String, Vec<String>> = models
        .iter()
        .map(|model| {
            let targets = model
                .fields
                .iter()
                .filter_map(|field| match &field.type_name {
                    TypeName::Named(target) => Some(target.clone()),
                    _ => None,
                })
                .collect();
            (model.name.clone(), targets)
        })
        .collect();

    for model in models.iter_mut() {
        for field in &mut model.fields {
            if let TypeName::Named(target) = &field.type_name
                && reaches(&edges, target, &model.name)
            {
                if !field.boxed {
                    debug!(model = %model.name, field = %field.ident, "recursive field boxed");
                }
                field.boxed = true;
            }
        }
    }
}

fn reaches(edges: &HashMap<String, Vec<String>>, from: &str, to: &str) -> bool {
    let mut stack = vec![from];
    let mut seen = HashSet::new();
    while let Some(current) = stack.pop() {
        if current == to {
            return true;
        }
        if !seen.insert(current) {
            continue;
        }
        if let Some(next) = edges.get(current) {
            stack.extend(next.iter().map(String::as_str));
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::SchemaDocument;
    use serde_json::json;

    fn try_synthesize(doc: &SchemaDocument) -> Result<Vec<ModelDescriptor>, GeneratorError> {
        let catalog = ModelCatalog::build(doc)?;
        ModelSynthesizer::new(TypeMapper::with_names(doc, catalog.names())).synthesize_all(&catalog)
    }

    fn synthesize(doc: &SchemaDocument) -> Vec<ModelDescriptor> {
        try_synthesize(doc).unwrap()
    }

    #[test]
    fn fields_follow_properties_in_order() {
        let doc = SchemaDocument::new(json!({
            "components": {"schemas": {
                "RadiationResponse": {
                    "type": "object",
                    "title": "RadiationResponse",
                    "required": ["estimated_actuals"],
                    "properties": {
                        "estimated_actuals": {
                            "type": "array",
                            "items": {"$ref": "#/components/schemas/Radiation"}
                        },
                        "period": {"type": "string", "description": "ISO 8601 period."},
                        "ghi": {"type": "number", "format": "float"}
                    }
                },
                "Radiation": {"type": "object", "properties": {}}
            }}
        }));
        let models = synthesize(&doc);
        assert_eq!(models.len(), 2);

        let response = &models[0];
        assert_eq!(response.name, "RadiationResponse");
        assert_eq!(response.kind, ModelKind::Response);
        let idents: Vec<&str> = response.fields.iter().map(|f| f.ident.as_str()).collect();
        assert_eq!(idents, vec!["estimated_actuals", "period", "ghi"]);
        assert!(response.fields[0].required);
        assert!(!response.fields[1].required);
        assert_eq!(response.fields[0].type_name.to_string(), "Vec<Radiation>");
        assert_eq!(response.fields[1].description.as_deref(), Some("ISO 8601 period."));
        assert_eq!(response.fields[2].type_name, TypeName::Float);
        assert!(response.imports.contains("crate::models::Radiation"));
    }

    #[test]
    fn request_classification_is_a_substring_match() {
        assert_eq!(ModelKind::of("SiteRequest"), ModelKind::Request);
        assert_eq!(ModelKind::of("REQUESTED_BY"), ModelKind::Request);
        assert_eq!(ModelKind::of("UnrequestedData"), ModelKind::Request);
        assert_eq!(ModelKind::of("RadiationResponse"), ModelKind::Response);
        assert_eq!(ModelKind::of("Site"), ModelKind::Response);
    }

    #[test]
    fn model_name_prefers_title() {
        let doc = SchemaDocument::new(json!({
            "definitions": {
                "site_request": {"title": "PvSiteRequest", "properties": {"name": {"type": "string"}}}
            }
        }));
        let models = synthesize(&doc);
        assert_eq!(models[0].name, "PvSiteRequest");
        assert_eq!(models[0].definition, "site_request");
        assert_eq!(models[0].kind, ModelKind::Request);
    }

    #[test]
    fn duplicate_names_are_suffixed_and_referenced() {
        let doc = SchemaDocument::new(json!({
            "components": {"schemas": {
                "A": {"title": "Same"},
                "B": {"title": "Same"},
                "Holder": {"properties": {
                    "first": {"$ref": "#/components/schemas/A"},
                    "second": {"$ref": "#/components/schemas/B"}
                }}
            }}
        }));
        let models = synthesize(&doc);
        let names: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Same", "Same_2", "Holder"]);
        assert_eq!(models[2].fields[0].type_name, TypeName::Named("Same".to_string()));
        assert_eq!(models[2].fields[1].type_name, TypeName::Named("Same_2".to_string()));
    }

    #[test]
    fn mutually_recursive_fields_are_boxed() {
        let doc = SchemaDocument::new(json!({
            "components": {"schemas": {
                "A": {"properties": {
                    "b": {"$ref": "#/components/schemas/B"},
                    "name": {"type": "string"}
                }},
                "B": {"properties": {
                    "a": {"$ref": "#/components/schemas/A"},
                    "c": {"$ref": "#/components/schemas/C"}
                }},
                "C": {"properties": {
                    "all_a": {"type": "array", "items": {"$ref": "#/components/schemas/A"}}
                }}
            }}
        }));
        let models = synthesize(&doc);
        assert!(models[0].fields[0].boxed);
        assert!(!models[0].fields[1].boxed);
        assert!(models[1].fields[0].boxed);
        // `C` only reaches `A` through a `Vec`, which is already on the heap.
        assert!(!models[1].fields[1].boxed);
        assert!(!models[2].fields[0].boxed);
    }

    #[test]
    fn endpoint_inline_objects_become_models() {
        let doc = SchemaDocument::new(json!({
            "paths": {"/data/live/thing": {"post": {
                "requestBody": {"content": {"application/json": {"schema": {
                    "type": "object",
                    "title": "ThingQuery",
                    "properties": {"filter": {"type": "object", "title": "ThingFilter"}}
                }}}},
                "responses": {"200": {"content": {"application/json": {"schema": {
                    "type": "array",
                    "items": {"type": "object", "title": "InlineThing", "properties": {"id": {"type": "string"}}}
                }}}}}
            }}},
            "components": {"schemas": {}}
        }));
        let models = synthesize(&doc);
        let names: Vec<(&str, ModelKind)> = models.iter().map(|m| (m.name.as_str(), m.kind)).collect();
        assert_eq!(
            names,
            vec![
                ("ThingQuery", ModelKind::Request),
                ("InlineThing", ModelKind::Response),
                ("ThingFilter", ModelKind::Request)
            ]
        );
        assert_eq!(models[0].fields[0].type_name, TypeName::Named("ThingFilter".to_string()));
    }

    #[test]
    fn self_reference_is_boxed_and_not_imported() {
        let doc = SchemaDocument::new(json!({
            "components": {"schemas": {
                "Node": {
                    "properties": {
                        "parent": {"$ref": "#/components/schemas/Node"},
                        "children": {"type": "array", "items": {"$ref": "#/components/schemas/Node"}}
                    }
                }
            }}
        }));
        let models = synthesize(&doc);
        assert!(models[0].fields[0].boxed);
        assert!(!models[0].fields[1].boxed);
        assert!(!models[0].imports.contains("crate::models::Node"));
    }

    #[test]
    fn inline_titled_objects_become_models() {
        let doc = SchemaDocument::new(json!({
            "components": {"schemas": {
                "SiteRequest": {
                    "properties": {
                        "location": {
                            "type": "object",
                            "title": "Location",
                            "properties": {"latitude": {"type": "number"}}
                        },
                        "tags": {"type": "array", "items": {"type": "object", "title": "Tag"}}
                    }
                }
            }}
        }));
        let models = synthesize(&doc);
        let names: Vec<(&str, ModelKind)> = models.iter().map(|m| (m.name.as_str(), m.kind)).collect();
        assert_eq!(
            names,
            vec![
                ("SiteRequest", ModelKind::Request),
                ("Location", ModelKind::Request),
                ("Tag", ModelKind::Request)
            ]
        );
        assert_eq!(models[1].fields[0].type_name, TypeName::Double);
    }

    #[test]
    fn unresolved_property_ref_is_fatal() {
        let doc = SchemaDocument::new(json!({
            "components": {"schemas": {
                "Broken": {"properties": {"x": {"$ref": "#/components/schemas/Missing"}}}
            }}
        }));
        assert!(matches!(try_synthesize(&doc), Err(GeneratorError::UnresolvedReference { .. })));
    }

    #[test]
    fn cyclic_definition_alias_is_fatal() {
        let doc = SchemaDocument::new(json!({
            "components": {"schemas": {
                "A": {"$ref": "#/components/schemas/B"},
                "B": {"$ref": "#/components/schemas/A"}
            }}
        }));
        assert!(matches!(ModelCatalog::build(&doc), Err(GeneratorError::CyclicReference { .. })));
    }
}
