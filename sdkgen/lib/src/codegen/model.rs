//! Model struct generation.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::codegen::doc_lines;
use crate::models::{FieldDescriptor, ModelDescriptor};
use crate::naming::ident;

/// Generates a serde model struct.
///
/// Every struct carries `#[serde(default)]` so partial payloads still decode.
/// Optional fields are skipped on serialization when unset.
///
/// ```ignore
/// #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// #[serde(default)]
/// pub struct RadiationResponse {
///     /// Required.
///     pub estimated_actuals: Vec<Radiation>,
///     #[serde(rename = "Period", skip_serializing_if = "Option::is_none")]
///     pub period: Option<String>,
/// }
/// ```
pub fn model_tokens(model: &ModelDescriptor) -> TokenStream {
    let name = format_ident!("{}", model.name);
    let doc_text = model
        .description
        .clone()
        .unwrap_or_else(|| format!("The `{}` model.", model.definition));
    let docs = doc_lines(&doc_text);
    let fields: Vec<TokenStream> = model.fields.iter().map(field_tokens).collect();

    quote! {
        #(#[doc = #docs])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct #name {
            #(#fields)*
        }
    }
}

fn field_tokens(field: &FieldDescriptor) -> TokenStream {
    let name = ident(&field.ident);

    let mut docs = field.description.as_deref().map(doc_lines).unwrap_or_default();
    if field.required {
        if !docs.is_empty() {
            docs.push(String::new());
        }
        docs.push(" Required.".to_string());
    }

    let (ty, optional) = if field.boxed {
        let inner = field.type_name.tokens();
        (quote! { Option<Box<#inner>> }, true)
    } else if field.required || field.type_name.is_nullable_scalar() {
        (field.type_name.tokens(), !field.required)
    } else {
        (field.type_name.optional_tokens(), true)
    };

    let renamed = name.to_string().trim_start_matches("r#") != field.wire_name;
    let wire = field.wire_name.as_str();
    let serde_attr = match (renamed, optional) {
        (true, true) => quote! { #[serde(rename = #wire, skip_serializing_if = "Option::is_none")] },
        (true, false) => quote! { #[serde(rename = #wire)] },
        (false, true) => quote! { #[serde(skip_serializing_if = "Option::is_none")] },
        (false, false) => quote! {},
    };

    quote! {
        #(#[doc = #docs])*
        #serde_attr
        pub #name: #ty,
    }
}
