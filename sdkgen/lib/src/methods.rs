//! Client method synthesis.
//!
//! One [`MethodDescriptor`] is built per `(endpoint, verb)` pair. Parameters
//! are partitioned into required query parameters, optional query parameters
//! and at most one body parameter; the signature lists them in that order.
//!
//! ## Query policy
//!
//! At call time the generated method builds its outgoing key/value list:
//!
//! - required parameters are always added
//! - optional parameters are added only when supplied
//! - optional lists are added only when supplied and non-empty, comma-joined
//!
//! ## Response policy
//!
//! A `401` becomes `ClientError::UnauthorizedApiKey` before any other status
//! check; every other non-success status is `ClientError::Status`. On success
//! the body text is always returned, and is decoded into the response type
//! only when the outgoing list contains `format=json`.

use std::collections::BTreeSet;

use tracing::debug;

use crate::classify::constant_name_from_path;
use crate::endpoint::{EndpointDescriptor, ParameterLocation, Verb};
use crate::errors::GeneratorError;
use crate::naming::{UniqueNames, to_pascal_case, to_snake_case};
use crate::types::{TypeMapper, TypeName};

/// How an optional parameter reaches the query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPolicy {
    /// Required: added unconditionally.
    Always,
    /// Added when the caller passed `Some(_)`.
    WhenPresent,
    /// Added when the caller passed a non-empty list.
    WhenNonEmpty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodParameter {
    /// Key sent on the wire.
    pub wire_name: String,
    /// Rust argument name, unique within the method.
    pub ident: String,
    pub type_name: TypeName,
    pub required: bool,
    pub policy: QueryPolicy,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BodyParameter {
    pub ident: String,
    pub type_name: TypeName,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDescriptor {
    /// PascalCase name, e.g. `GetRadiationForecast`.
    pub name: String,
    /// snake_case function name, unique within its client.
    pub fn_name: String,
    pub verb: Verb,
    pub path: String,
    /// Name of the URL table constant (PascalCase).
    pub url_constant: String,
    pub description: Option<String>,
    pub required: Vec<MethodParameter>,
    pub optional: Vec<MethodParameter>,
    pub body: Option<BodyParameter>,
    /// Declared `200` response type; `None` means raw text only.
    pub response: Option<TypeName>,
    pub imports: BTreeSet<String>,
}

impl MethodDescriptor {
    /// Query parameters in signature order (required first).
    pub fn query_parameters(&self) -> impl Iterator<Item = &MethodParameter> {
        self.required.iter().chain(self.optional.iter())
    }

    /// Argument names in signature order, body last.
    pub fn signature(&self) -> Vec<&str> {
        self.query_parameters()
            .map(|p| p.ident.as_str())
            .chain(self.body.iter().map(|b| b.ident.as_str()))
            .collect()
    }

    /// The type parameter of the returned `ApiResponse`.
    pub fn response_type(&self) -> TypeName {
        self.response.clone().unwrap_or(TypeName::String)
    }
}

/// Synthesizes method descriptors for a set of endpoints.
#[derive(Debug, Clone, Copy)]
pub struct MethodSynthesizer<'a> {
    mapper: TypeMapper<'a>,
}

impl<'a> MethodSynthesizer<'a> {
    pub fn new(mapper: TypeMapper<'a>) -> Self {
        Self { mapper }
    }

    /// Builds the descriptor for one endpoint.
    ///
    /// `context` is the optional discriminator inserted between the verb and
    /// the last path segment (`GetLiveAggregations`).
    ///
    /// ## Errors
    ///
    /// Returns an error if a parameter, body or response type references a
    /// schema that does not resolve.
    pub fn synthesize(
        &self,
        endpoint: &EndpointDescriptor,
        context: Option<&str>,
    ) -> Result<MethodDescriptor, GeneratorError> {
        let name = method_name(endpoint.verb, &endpoint.path, context);
        let mut imports: BTreeSet<String> = [
            "crate::errors::ClientError",
            "crate::urls",
            "crate::utilities::ApiResponse",
            "reqwest::Method",
        ]
        .into_iter()
        .map(str::to_string)
        .collect();

        let body_source = endpoint
            .parameters
            .iter()
            .find(|p| p.location == ParameterLocation::Body);

        // Locals of the generated method body.
        let mut names = UniqueNames::new();
        names.reserve("parameters");
        names.reserve("payload");
        if body_source.is_some() {
            names.reserve("body");
        }

        let mut required = Vec::new();
        let mut optional = Vec::new();
        for param in endpoint
            .parameters
            .iter()
            .filter(|p| p.location != ParameterLocation::Body)
        {
            let type_name = self.mapper.map(&param.schema)?;
            let mut snake = to_snake_case(&param.name);
            if snake.is_empty() {
                snake = "param".to_string();
            }
            let ident = names.claim(&snake);
            let policy = if param.required {
                QueryPolicy::Always
            } else if type_name.is_container() {
                QueryPolicy::WhenNonEmpty
            } else {
                QueryPolicy::WhenPresent
            };
            imports.extend(type_name.imports());
            let descriptor = MethodParameter {
                wire_name: param.name.clone(),
                ident,
                type_name,
                required: param.required,
                policy,
                description: param.description.clone(),
            };
            if param.required {
                required.push(descriptor);
            } else {
                optional.push(descriptor);
            }
        }
        if !required.is_empty() || !optional.is_empty() {
            imports.insert("crate::utilities::query_value".to_string());
        }

        let body = match body_source {
            Some(param) => {
                let type_name = self.mapper.map(&param.schema)?;
                imports.extend(type_name.imports());
                Some(BodyParameter {
                    ident: "body".to_string(),
                    type_name,
                    description: param.description.clone(),
                })
            }
            None => None,
        };

        let response = match &endpoint.response {
            Some(descriptor) => {
                let type_name = self.mapper.map(descriptor)?;
                imports.extend(type_name.imports());
                Some(type_name)
            }
            None => {
                debug!(path = %endpoint.path, verb = %endpoint.verb, "no 200 response schema; returning raw text");
                None
            }
        };

        Ok(MethodDescriptor {
            fn_name: to_snake_case(&name),
            name,
            verb: endpoint.verb,
            path: endpoint.path.clone(),
            url_constant: constant_name_from_path(&endpoint.path),
            description: endpoint.description.clone().or_else(|| endpoint.summary.clone()),
            required,
            optional,
            body,
            response,
            imports,
        })
    }

    /// Synthesizes every endpoint of one client, de-duplicating function
    /// names with numeric suffixes.
    pub fn synthesize_all(
        &self,
        endpoints: &[(EndpointDescriptor, Option<String>)],
    ) -> Result<Vec<MethodDescriptor>, GeneratorError> {
        let mut names = UniqueNames::new();
        endpoints
            .iter()
            .map(|(endpoint, context)| {
                let mut method = self.synthesize(endpoint, context.as_deref())?;
                method.fn_name = names.claim(&method.fn_name);
                Ok(method)
            })
            .collect()
    }
}

/// `verb` + optional discriminator + last path segment, all PascalCase.
pub fn method_name(verb: Verb, path: &str, context: Option<&str>) -> String {
    let last = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .next_back()
        .unwrap_or_default();
    format!(
        "{}{}{}",
        verb.method_prefix(),
        context.map(to_pascal_case).unwrap_or_default(),
        to_pascal_case(last)
    )
}
