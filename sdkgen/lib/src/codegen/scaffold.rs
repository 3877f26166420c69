//! Crate scaffolding: `lib.rs`, the `mod.rs` files, the prelude and the
//! manifest.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::config::GeneratorConfig;

/// A module file and the type it re-exports (`mod live_client; pub use live_client::LiveClient;`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleEntry {
    pub module: String,
    pub type_name: String,
}

impl ModuleEntry {
    pub fn new(module: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            type_name: type_name.into(),
        }
    }
}

/// Generates `lib.rs`.
pub fn lib_tokens(config: &GeneratorConfig) -> TokenStream {
    let title = format!(" Rust client for the {} API.", config.crate_name);
    let key = format!(
        " Every client reads its API key from `{}` unless one is passed in `ClientOptions`.",
        config.api_key_env
    );
    let example = format!(" use {}::prelude::*;", config.crate_ident());
    quote! {
        #![doc = #title]
        #![doc = ""]
        #![doc = #key]
        #![doc = ""]
        #![doc = " ```ignore"]
        #![doc = #example]
        #![doc = " ```"]

        pub mod base_client;
        pub mod clients;
        pub mod errors;
        pub mod locations;
        pub mod models;
        pub mod prelude;
        pub mod urls;
        pub mod utilities;
    }
}

/// Generates a `mod.rs` that declares private modules and re-exports one type
/// from each.
pub fn reexport_tokens(doc: &str, entries: &[ModuleEntry]) -> TokenStream {
    let doc = format!(" {}", doc);
    let items: Vec<TokenStream> = entries
        .iter()
        .map(|entry| {
            let module = format_ident!("{}", entry.module);
            let type_name = format_ident!("{}", entry.type_name);
            quote! {
                mod #module;
                pub use #module::#type_name;
            }
        })
        .collect();
    quote! {
        #![doc = #doc]

        #(#items)*
    }
}

/// Generates `models/mod.rs`.
pub fn models_mod_tokens() -> TokenStream {
    quote! {
        //! Request and response models.

        pub mod requests;
        pub mod responses;

        pub use requests::*;
        pub use responses::*;
    }
}

/// Generates `prelude.rs` re-exporting the clients and the types every
/// caller touches.
pub fn prelude_tokens(clients: &[String]) -> TokenStream {
    let clients: Vec<_> = clients.iter().map(|name| format_ident!("{}", name)).collect();
    quote! {
        //! Convenient re-exports.
        //!
        //! ```ignore
        //! let client = LiveClient::new()?;
        //! ```

        pub use crate::base_client::ClientOptions;
        pub use crate::clients::{#(#clients),*};
        pub use crate::errors::ClientError;
        pub use crate::locations::{LOCATIONS, Location, find_location};
        pub use crate::utilities::ApiResponse;
    }
}

/// The emitted `Cargo.toml`.
pub fn cargo_toml(config: &GeneratorConfig) -> String {
    format!(
        r#"[package]
name = "{name}"
version = "{version}"
edition = "2024"
description = "Rust client for the {name} API"

[dependencies]
reqwest = {{ version = "0.12", default-features = false, features = ["json", "rustls-tls"] }}
semver = "1.0"
serde = {{ version = "1.0", features = ["derive"] }}
serde_json = "1.0"
thiserror = "2.0"
tokio = {{ version = "1", features = ["sync"] }}

[dev-dependencies]
tokio = {{ version = "1", features = ["macros", "rt-multi-thread"] }}
"#,
        name = config.crate_name,
        version = config.crate_version,
    )
}
