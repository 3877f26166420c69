//! Endpoint descriptors extracted from the `paths` table.

use std::fmt;

use serde_json::Value;

use crate::document::SchemaDocument;
use crate::errors::GeneratorError;
use crate::resolver::ReferenceResolver;
use crate::schema::TypeDescriptor;

/// HTTP verbs that produce client methods. Other path-item keys
/// (`parameters`, `summary`, `servers`, ...) are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl Verb {
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "get" => Some(Verb::Get),
            "post" => Some(Verb::Post),
            "put" => Some(Verb::Put),
            "delete" => Some(Verb::Delete),
            "patch" => Some(Verb::Patch),
            _ => None,
        }
    }

    /// The key used in the document (`get`, `post`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "get",
            Verb::Post => "post",
            Verb::Put => "put",
            Verb::Delete => "delete",
            Verb::Patch => "patch",
        }
    }

    /// The capitalized verb that starts a synthesized method name.
    pub fn method_prefix(self) -> &'static str {
        match self {
            Verb::Get => "Get",
            Verb::Post => "Post",
            Verb::Put => "Put",
            Verb::Delete => "Delete",
            Verb::Patch => "Patch",
        }
    }

    /// The `reqwest::Method` constant name.
    pub fn http_method(self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Delete => "DELETE",
            Verb::Patch => "PATCH",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a parameter travels. Everything that is not a body is sent in the
/// query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterLocation {
    Query,
    Body,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    /// Wire name, as declared in the document.
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub schema: TypeDescriptor,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EndpointDescriptor {
    pub path: String,
    pub verb: Verb,
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub parameters: Vec<ParameterDescriptor>,
    /// Schema of the `200` response, if any.
    pub response: Option<TypeDescriptor>,
}

impl EndpointDescriptor {
    /// Builds the descriptor for one operation object.
    ///
    /// Parameter `$ref`s are resolved first. When no parameter is explicitly
    /// located in the body, the first `requestBody` content schema becomes a
    /// synthesized `body` parameter.
    ///
    /// ## Errors
    ///
    /// Returns an error if a parameter, request body or response `$ref`
    /// cannot be resolved.
    pub fn extract(
        resolver: ReferenceResolver<'_>,
        path: &str,
        verb: Verb,
        operation: &Value,
    ) -> Result<Self, GeneratorError> {
        let mut parameters = Vec::new();
        if let Some(declared) = operation.get("parameters").and_then(Value::as_array) {
            for raw in declared {
                let node = resolver.deref(raw)?;
                parameters.push(parameter_from_node(node));
            }
        }

        let has_body = parameters
            .iter()
            .any(|p| p.location == ParameterLocation::Body);
        if !has_body
            && let Some(request_body) = request_body(resolver, operation)?
            && let Some(schema) = first_content_schema(request_body)
        {
            parameters.push(ParameterDescriptor {
                name: "body".to_string(),
                location: ParameterLocation::Body,
                required: true,
                schema: TypeDescriptor::from_schema(schema),
                description: string_field(request_body, "description").unwrap_or_default(),
            });
        }

        let response = response_schema(resolver, operation)?.map(TypeDescriptor::from_schema);

        Ok(Self {
            path: path.to_string(),
            verb,
            operation_id: string_field(operation, "operationId"),
            summary: string_field(operation, "summary"),
            description: string_field(operation, "description"),
            parameters,
            response,
        })
    }
}

/// The raw schemas one operation reads and returns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationSchemas<'a> {
    /// Parameter and request body schemas.
    pub inputs: Vec<&'a Value>,
    /// The `200` response schema.
    pub outputs: Vec<&'a Value>,
}

/// Collects the schemas of one operation, with parameter, request body and
/// response `$ref`s resolved.
///
/// ## Errors
///
/// Returns an error if one of those `$ref`s cannot be resolved.
pub fn operation_schemas<'a>(
    resolver: ReferenceResolver<'a>,
    operation: &'a Value,
) -> Result<OperationSchemas<'a>, GeneratorError> {
    let mut schemas = OperationSchemas::default();
    if let Some(declared) = operation.get("parameters").and_then(Value::as_array) {
        for raw in declared {
            schemas.inputs.push(parameter_schema(resolver.deref(raw)?));
        }
    }
    if let Some(request_body) = request_body(resolver, operation)?
        && let Some(schema) = first_content_schema(request_body)
    {
        schemas.inputs.push(schema);
    }
    schemas.outputs.extend(response_schema(resolver, operation)?);
    Ok(schemas)
}

/// Lists every `(path, verb, operation)` in declaration order.
pub fn operations(document: &SchemaDocument) -> Vec<(&str, Verb, &Value)> {
    document
        .paths()
        .flat_map(|(path, item)| {
            item.as_object()
                .into_iter()
                .flatten()
                .filter_map(move |(key, operation)| {
                    Verb::parse(key).map(|verb| (path.as_str(), verb, operation))
                })
        })
        .collect()
}

fn parameter_from_node(node: &Value) -> ParameterDescriptor {
    let location = match node.get("in").and_then(Value::as_str) {
        Some("body") => ParameterLocation::Body,
        _ => ParameterLocation::Query,
    };
    let schema = parameter_schema(node);
    ParameterDescriptor {
        name: string_field(node, "name").unwrap_or_default(),
        location,
        required: node.get("required").and_then(Value::as_bool).unwrap_or(false),
        schema: TypeDescriptor::from_schema(schema),
        description: string_field(node, "description").unwrap_or_default(),
    }
}

/// Current-style parameters wrap their type in `schema`; legacy ones
/// declare `type`/`format`/`items` inline.
fn parameter_schema(node: &Value) -> &Value {
    node.get("schema").unwrap_or(node)
}

fn request_body<'a>(
    resolver: ReferenceResolver<'a>,
    operation: &'a Value,
) -> Result<Option<&'a Value>, GeneratorError> {
    operation
        .get("requestBody")
        .map(|body| resolver.deref(body))
        .transpose()
}

/// Legacy documents put the schema on the response; current ones under
/// `content.<media type>`.
fn response_schema<'a>(
    resolver: ReferenceResolver<'a>,
    operation: &'a Value,
) -> Result<Option<&'a Value>, GeneratorError> {
    let Some(ok) = operation.get("responses").and_then(|r| r.get("200")) else {
        return Ok(None);
    };
    let ok = resolver.deref(ok)?;
    Ok(ok.get("schema").or_else(|| first_content_schema(ok)))
}

fn first_content_schema(node: &Value) -> Option<&Value> {
    node.get("content")?
        .as_object()?
        .values()
        .next()?
        .get("schema")
}

fn string_field(node: &Value, key: &str) -> Option<String> {
    node.get(key).and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Primitive;
    use serde_json::json;

    fn doc() -> SchemaDocument {
        SchemaDocument::new(json!({
            "openapi": "3.0.1",
            "paths": {
                "/data/live/radiation": {
                    "parameters": [],
                    "get": {
                        "operationId": "live-radiation",
                        "description": "Live radiation.",
                        "parameters": [
                            {"name": "latitude", "in": "query", "required": true,
                             "schema": {"type": "number", "format": "double"}},
                            {"$ref": "#/components/parameters/Hours"}
                        ],
                        "responses": {
                            "200": {"content": {"application/json": {
                                "schema": {"$ref": "#/components/schemas/RadiationResponse"}
                            }}}
                        }
                    }
                },
                "/resources/site": {
                    "post": {
                        "requestBody": {
                            "description": "The site.",
                            "content": {"application/json": {
                                "schema": {"$ref": "#/components/schemas/SiteRequest"}
                            }}
                        },
                        "responses": {}
                    }
                },
                "/broken": {
                    "get": {"parameters": [{"$ref": "#/components/parameters/Nope"}]}
                }
            },
            "components": {
                "parameters": {
                    "Hours": {"name": "hours", "in": "query", "schema": {"type": "integer"}}
                },
                "schemas": {
                    "RadiationResponse": {"type": "object"},
                    "SiteRequest": {"type": "object"}
                }
            }
        }))
    }

    #[test]
    fn operations_skip_non_verb_keys() {
        let doc = doc();
        let ops: Vec<(&str, Verb)> = operations(&doc).into_iter().map(|(p, v, _)| (p, v)).collect();
        assert_eq!(
            ops,
            vec![
                ("/data/live/radiation", Verb::Get),
                ("/resources/site", Verb::Post),
                ("/broken", Verb::Get)
            ]
        );
    }

    #[test]
    fn extract_resolves_parameter_refs() {
        let doc = doc();
        let op = doc.operation("/data/live/radiation", "get").unwrap();
        let endpoint =
            EndpointDescriptor::extract(ReferenceResolver::new(&doc), "/data/live/radiation", Verb::Get, op)
                .unwrap();

        assert_eq!(endpoint.operation_id.as_deref(), Some("live-radiation"));
        assert_eq!(endpoint.parameters.len(), 2);
        assert_eq!(endpoint.parameters[0].name, "latitude");
        assert!(endpoint.parameters[0].required);
        assert_eq!(endpoint.parameters[1].name, "hours");
        assert!(!endpoint.parameters[1].required);
        assert_eq!(
            endpoint.parameters[1].schema,
            TypeDescriptor::scalar(Primitive::Integer, None)
        );
        assert_eq!(
            endpoint.response,
            Some(TypeDescriptor::Ref("#/components/schemas/RadiationResponse".to_string()))
        );
    }

    #[test]
    fn request_body_becomes_body_parameter() {
        let doc = doc();
        let op = doc.operation("/resources/site", "post").unwrap();
        let endpoint =
            EndpointDescriptor::extract(ReferenceResolver::new(&doc), "/resources/site", Verb::Post, op)
                .unwrap();

        assert_eq!(endpoint.parameters.len(), 1);
        let body = &endpoint.parameters[0];
        assert_eq!(body.name, "body");
        assert_eq!(body.location, ParameterLocation::Body);
        assert_eq!(body.description, "The site.");
        assert!(endpoint.response.is_none());
    }

    #[test]
    fn legacy_parameters_declare_type_inline() {
        let node = json!({"name": "ids", "in": "query", "type": "array", "items": {"type": "string"}});
        let param = parameter_from_node(&node);
        assert_eq!(
            param.schema,
            TypeDescriptor::array_of(TypeDescriptor::scalar(Primitive::String, None))
        );
    }

    #[test]
    fn legacy_response_schema() {
        let doc = SchemaDocument::new(json!({
            "swagger": "2.0",
            "definitions": {"Thing": {"type": "object"}}
        }));
        let op = json!({"responses": {"200": {"schema": {"$ref": "#/definitions/Thing"}}}});
        let endpoint =
            EndpointDescriptor::extract(ReferenceResolver::new(&doc), "/thing", Verb::Get, &op).unwrap();
        assert_eq!(
            endpoint.response,
            Some(TypeDescriptor::Ref("#/definitions/Thing".to_string()))
        );
    }

    #[test]
    fn operation_schemas_split_inputs_and_outputs() {
        let doc = doc();
        let resolver = ReferenceResolver::new(&doc);

        let radiation = operation_schemas(resolver, doc.operation("/data/live/radiation", "get").unwrap()).unwrap();
        assert_eq!(radiation.inputs.len(), 2);
        assert_eq!(radiation.inputs[1], &json!({"type": "integer"}));
        assert_eq!(
            radiation.outputs,
            vec![&json!({"$ref": "#/components/schemas/RadiationResponse"})]
        );

        let site = operation_schemas(resolver, doc.operation("/resources/site", "post").unwrap()).unwrap();
        assert_eq!(site.inputs, vec![&json!({"$ref": "#/components/schemas/SiteRequest"})]);
        assert!(site.outputs.is_empty());

        let broken = operation_schemas(resolver, doc.operation("/broken", "get").unwrap());
        assert!(matches!(broken, Err(GeneratorError::UnresolvedReference { .. })));
    }

    #[test]
    fn unresolved_parameter_ref_is_fatal() {
        let doc = doc();
        let op = doc.operation("/broken", "get").unwrap();
        let result = EndpointDescriptor::extract(ReferenceResolver::new(&doc), "/broken", Verb::Get, op);
        assert!(matches!(result, Err(GeneratorError::UnresolvedReference { .. })));
    }
}
