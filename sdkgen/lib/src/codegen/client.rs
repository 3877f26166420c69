//! Client struct and endpoint method generation.
//!
//! Each client wraps a `BaseClient` and exposes one async method per
//! endpoint. A method builds its query list, serializes the body if it has
//! one, and hands both to `BaseClient::execute` (or `execute_raw` when the
//! endpoint declares no response type).

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::codegen::{doc_lines, docs};
use crate::methods::{MethodDescriptor, QueryPolicy};
use crate::naming::{ident, to_screaming_snake_case};

/// Generates a client struct with constructors and its endpoint methods.
///
/// ## Examples
///
/// ```ignore
/// /// Client for the `/data/live/` endpoints.
/// #[derive(Debug, Clone)]
/// pub struct LiveClient {
///     base: BaseClient,
/// }
///
/// impl LiveClient {
///     pub fn new() -> Result<Self, ClientError> { ... }
///     pub fn with_options(options: ClientOptions) -> Result<Self, ClientError> { ... }
///     pub async fn get_radiation_and_weather(&self, latitude: f64, ...) -> Result<ApiResponse<...>, ClientError> { ... }
/// }
/// ```
pub fn client_tokens(name: &str, summary: &str, methods: &[MethodDescriptor]) -> TokenStream {
    let struct_name = format_ident!("{}", name);
    let struct_docs = docs(summary);
    let methods: Vec<TokenStream> = methods.iter().map(method_tokens).collect();

    quote! {
        #struct_docs
        #[derive(Debug, Clone)]
        pub struct #struct_name {
            base: BaseClient,
        }

        impl #struct_name {
            /// Creates a client with default options.
            ///
            /// ## Errors
            ///
            /// Returns `ClientError::MissingApiKey` if no API key is configured.
            pub fn new() -> Result<Self, ClientError> {
                Self::with_options(ClientOptions::default())
            }

            /// Creates a client with custom options.
            pub fn with_options(options: ClientOptions) -> Result<Self, ClientError> {
                Ok(Self {
                    base: BaseClient::new(options)?,
                })
            }

            #(#methods)*
        }
    }
}

/// Generates one endpoint method.
pub fn method_tokens(method: &MethodDescriptor) -> TokenStream {
    let fn_name = ident(&method.fn_name);
    let doc = method_docs(method);
    let operation = method.fn_name.as_str();
    let verb = format_ident!("{}", method.verb.http_method());
    let url = format_ident!("{}", to_screaming_snake_case(&method.url_constant));

    let mut args = Vec::new();
    for param in &method.required {
        let name = ident(&param.ident);
        let ty = param.type_name.required_tokens();
        args.push(quote! { #name: #ty });
    }
    for param in &method.optional {
        let name = ident(&param.ident);
        let ty = param.type_name.optional_tokens();
        args.push(quote! { #name: #ty });
    }
    if let Some(body) = &method.body {
        let name = ident(&body.ident);
        let ty = body.type_name.required_tokens();
        args.push(quote! { #name: #ty });
    }

    let pushes: Vec<TokenStream> = method
        .query_parameters()
        .map(|param| {
            let name = ident(&param.ident);
            let wire = param.wire_name.as_str();
            match param.policy {
                QueryPolicy::Always => quote! {
                    parameters.push((#wire.to_string(), query_value(&#name)?));
                },
                QueryPolicy::WhenPresent => quote! {
                    if let Some(value) = &#name {
                        parameters.push((#wire.to_string(), query_value(value)?));
                    }
                },
                QueryPolicy::WhenNonEmpty => quote! {
                    if let Some(values) = &#name
                        && !values.is_empty()
                    {
                        parameters.push((#wire.to_string(), query_value(values)?));
                    }
                },
            }
        })
        .collect();

    let parameters = if pushes.is_empty() {
        quote! { let parameters: Vec<(String, String)> = Vec::new(); }
    } else {
        quote! {
            let mut parameters: Vec<(String, String)> = Vec::new();
            #(#pushes)*
        }
    };

    let payload = match &method.body {
        Some(body) => {
            let name = ident(&body.ident);
            quote! {
                let payload = Some(serde_json::to_value(&#name).map_err(ClientError::Serialization)?);
            }
        }
        None => quote! { let payload = None; },
    };

    let (response_ty, call) = match &method.response {
        Some(response) => {
            let ty = response.required_tokens();
            (
                ty.clone(),
                quote! {
                    self.base
                        .execute::<#ty>(Method::#verb, urls::#url, #operation, parameters, payload)
                        .await
                },
            )
        }
        None => (
            quote! { String },
            quote! {
                self.base
                    .execute_raw(Method::#verb, urls::#url, #operation, parameters, payload)
                    .await
            },
        ),
    };

    quote! {
        #doc
        pub async fn #fn_name(
            &self,
            #(#args),*
        ) -> Result<ApiResponse<#response_ty>, ClientError> {
            #parameters
            #payload
            #call
        }
    }
}

fn method_docs(method: &MethodDescriptor) -> TokenStream {
    let mut lines = match &method.description {
        Some(description) => doc_lines(description),
        None => vec![format!(" `{} /{}`", method.verb.http_method(), method.path.trim_start_matches('/'))],
    };

    let described: Vec<(String, &str)> = method
        .query_parameters()
        .map(|p| (p.ident.clone(), p.description.as_str()))
        .chain(method.body.iter().map(|b| (b.ident.clone(), b.description.as_str())))
        .collect();
    if !described.is_empty() {
        lines.push(String::new());
        lines.push(" ## Arguments".to_string());
        lines.push(String::new());
        for (name, description) in described {
            let description = description.split_whitespace().collect::<Vec<_>>().join(" ");
            if description.is_empty() {
                lines.push(format!(" * `{}`", name));
            } else {
                lines.push(format!(" * `{}` - {}", name, description));
            }
        }
    }
    lines.push(String::new());
    lines.push(" ## Errors".to_string());
    lines.push(String::new());
    lines.push(
        " Returns `ClientError::UnauthorizedApiKey` on a 401 and `ClientError::Status` for any other failed status."
            .to_string(),
    );

    quote! { #(#[doc = #lines])* }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{format_tokens, sample_method};
    use crate::types::TypeName;

    fn code(method: &MethodDescriptor) -> String {
        let tokens = method_tokens(method);
        format_tokens(&quote! { impl Client { #tokens } })
    }

    #[test]
    fn required_before_optional_in_signature() {
        let code = code(&sample_method());
        let latitude = code.find("latitude: f64").unwrap();
        let hours = code.find("hours: Option<i32>").unwrap();
        let outputs = code.find("output_parameters: Option<Vec<String>>").unwrap();
        assert!(latitude < hours && hours < outputs);
    }

    #[test]
    fn query_policy_per_parameter() {
        let code = code(&sample_method());
        assert!(code.contains("parameters.push((\"latitude\".to_string(), query_value(&latitude)?));"));
        assert!(code.contains("if let Some(value) = &hours"));
        assert!(code.contains("if let Some(values) = &output_parameters"));
        assert!(code.contains("!values.is_empty()"));
    }

    #[test]
    fn absent_optional_integer_is_not_sent() {
        let code = code(&sample_method());
        let guard = code.find("if let Some(value) = &hours {").unwrap();
        let push = code
            .find("parameters.push((\"hours\".to_string(), query_value(value)?));")
            .unwrap();
        assert!(guard < push);
        assert_eq!(code.matches("(\"hours\".to_string()").count(), 1);
    }

    #[test]
    fn format_is_forwarded_for_the_json_rule() {
        let code = code(&sample_method());
        assert!(code.contains("if let Some(value) = &format {"));
        assert!(code.contains("parameters.push((\"format\".to_string(), query_value(value)?));"));
        assert!(code.contains("execute::<RadiationResponse>"));
        assert!(code.contains("\"get_radiation_forecast\""));
    }

    #[test]
    fn typed_response_uses_execute() {
        let code = code(&sample_method());
        assert!(code.contains("Result<ApiResponse<RadiationResponse>, ClientError>"));
        assert!(code.contains("execute::<RadiationResponse>"));
        assert!(code.contains("urls::LIVE_RADIATION_FORECAST"));
        assert!(code.contains("Method::GET"));
    }

    #[test]
    fn raw_response_uses_execute_raw() {
        let mut method = sample_method();
        method.response = None;
        let code = code(&method);
        assert!(code.contains("Result<ApiResponse<String>, ClientError>"));
        assert!(code.contains("execute_raw("));
    }

    #[test]
    fn no_query_parameters_keeps_list_immutable() {
        let mut method = sample_method();
        method.required.clear();
        method.optional.clear();
        let code = code(&method);
        assert!(code.contains("let parameters: Vec<(String, String)> = Vec::new();"));
        assert!(!code.contains("let mut parameters"));
    }

    #[test]
    fn body_is_serialized() {
        let mut method = sample_method();
        method.body = Some(crate::methods::BodyParameter {
            ident: "body".to_string(),
            type_name: TypeName::Named("SiteRequest".to_string()),
            description: "The site.".to_string(),
        });
        let code = code(&method);
        assert!(code.contains("body: SiteRequest"));
        assert!(code.contains("serde_json::to_value(&body)"));
        assert!(code.contains("* `body` - The site."));
    }

    #[test]
    fn client_struct_has_constructors() {
        let tokens = client_tokens("LiveClient", "Live data.", &[sample_method()]);
        let code = format_tokens(&tokens);
        assert!(code.contains("pub struct LiveClient"));
        assert!(code.contains("pub fn new() -> Result<Self, ClientError>"));
        assert!(code.contains("pub fn with_options(options: ClientOptions)"));
        assert!(code.contains("pub async fn get_radiation_forecast("));
    }
}
