//! Code generation for the emitted client crate.
//!
//! Generators return `proc_macro2::TokenStream`s which [`crate::output`]
//! validates with `syn::parse2` and formats with `prettyplease`.
//!
//! ## Submodules
//!
//! - [`client`] - client structs with one async method per endpoint
//! - [`model`] - request and response structs
//! - [`runtime`] - `errors`, `utilities` and `base_client`, emitted verbatim
//! - [`tables`] - the URL and location tables
//! - [`scaffold`] - `lib.rs`, `mod.rs` files, the prelude and `Cargo.toml`
//!
//! Every generated class goes through [`ClassEmitter`], which writes the
//! ordered `use` block ahead of the class body.

pub mod client;
pub mod model;
pub mod runtime;
pub mod scaffold;
pub mod tables;

use std::collections::BTreeSet;

use proc_macro2::TokenStream;
use quote::quote;

use crate::errors::GeneratorError;
use crate::imports::use_items;
use crate::methods::MethodDescriptor;
use crate::models::ModelDescriptor;
use crate::naming::module_name;

/// What a class contains.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassMembers {
    /// A client struct and its endpoint methods, in declaration order.
    Methods(Vec<MethodDescriptor>),
    /// A model struct.
    Fields(ModelDescriptor),
}

/// One emitted class: a type, its members, and the imports it needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDescriptor {
    pub name: String,
    /// Module path the class lives in, e.g. `crate::clients::live_client`.
    pub namespace: String,
    /// One-line description used for the module and type docs.
    pub summary: String,
    pub imports: BTreeSet<String>,
    pub members: ClassMembers,
}

impl ClassDescriptor {
    /// A client class collecting the imports of all its methods.
    pub fn client(name: &str, summary: String, methods: Vec<MethodDescriptor>) -> Self {
        let mut imports: BTreeSet<String> = [
            "crate::base_client::BaseClient",
            "crate::base_client::ClientOptions",
            "crate::errors::ClientError",
        ]
        .into_iter()
        .map(str::to_string)
        .collect();
        for method in &methods {
            imports.extend(method.imports.iter().cloned());
        }
        Self {
            name: name.to_string(),
            namespace: format!("crate::clients::{}", module_name(name)),
            summary,
            imports,
            members: ClassMembers::Methods(methods),
        }
    }

    /// A model class in `models::requests` or `models::responses`.
    pub fn model(model: ModelDescriptor, module: &str) -> Self {
        Self {
            name: model.name.clone(),
            namespace: format!("crate::models::{}::{}", model.kind.module(), module),
            summary: model
                .description
                .clone()
                .unwrap_or_else(|| format!("The `{}` model.", model.definition)),
            imports: model.imports.clone(),
            members: ClassMembers::Fields(model),
        }
    }

    /// Source path relative to the crate root (`src/clients/live_client.rs`).
    pub fn file_path(&self) -> String {
        let relative: Vec<&str> = self
            .namespace
            .split("::")
            .skip_while(|segment| *segment == "crate")
            .collect();
        format!("src/{}.rs", relative.join("/"))
    }

    /// The last namespace segment, i.e. the module declared for this file.
    pub fn module(&self) -> &str {
        self.namespace.rsplit("::").next().unwrap_or(&self.namespace)
    }
}

/// Renders [`ClassDescriptor`]s for one generated crate.
#[derive(Debug, Clone)]
pub struct ClassEmitter {
    crate_name: String,
}

impl ClassEmitter {
    pub fn new(crate_name: impl Into<String>) -> Self {
        Self {
            crate_name: crate_name.into(),
        }
    }

    /// Emits a module doc, the ordered imports, then the class body.
    ///
    /// ## Errors
    ///
    /// Returns `GeneratorError::CodeGenError` if an import is not a valid
    /// `use` path.
    pub fn emit(&self, class: &ClassDescriptor) -> Result<TokenStream, GeneratorError> {
        let module_doc = format!(" {}", first_line(&class.summary));
        let imports = use_items(&class.imports, &self.crate_name)?;
        let body = match &class.members {
            ClassMembers::Methods(methods) => client::client_tokens(&class.name, &class.summary, methods),
            ClassMembers::Fields(model) => model::model_tokens(model),
        };
        Ok(quote! {
            #![doc = #module_doc]

            #imports

            #body
        })
    }
}

/// `#[doc]` attributes for free text, one per line.
pub(crate) fn doc_lines(text: &str) -> Vec<String> {
    text.trim()
        .lines()
        .map(|line| {
            let line = line.trim_end();
            if line.is_empty() {
                String::new()
            } else {
                format!(" {}", line)
            }
        })
        .collect()
}

pub(crate) fn docs(text: &str) -> TokenStream {
    let lines = doc_lines(text);
    quote! { #(#[doc = #lines])* }
}

fn first_line(text: &str) -> &str {
    text.trim().lines().next().unwrap_or_default()
}
