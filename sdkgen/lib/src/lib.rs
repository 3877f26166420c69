//! Client generator for OpenAPI and Swagger documents.
//!
//! This crate reads an API description and emits a complete, strongly-typed
//! Rust client crate: one client struct per endpoint group with one async
//! method per endpoint, a combined aggregation client, serde models for every
//! definition, a URL table, and a small runtime (errors, auth, update check).
//!
//! ## Modules
//!
//! - [`document`] - the parsed document and its schema-location style
//! - [`resolver`] - `$ref` resolution with cycle detection
//! - [`schema`] / [`types`] - schema normalization and type mapping
//! - [`endpoint`] / [`classify`] - endpoint extraction and grouping
//! - [`methods`] / [`models`] - method and model synthesis
//! - [`aggregation`] - the cross-group aggregation client
//! - [`imports`] - ordering of `use` blocks
//! - [`codegen`] - token generation for every emitted file
//! - [`output`] - crate assembly, validation, formatting and writing
//! - [`loader`] / [`config`] - inputs and configuration
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use sdkgen_lib::config::GeneratorConfig;
//! use sdkgen_lib::document::SchemaDocument;
//! use sdkgen_lib::output::generate;
//!
//! let text = std::fs::read_to_string("openapi.json").unwrap();
//! let document = SchemaDocument::parse(&text).unwrap();
//! let output = generate(&document, &GeneratorConfig::default(), &[]).unwrap();
//! output.write(Path::new("generated")).unwrap();
//! ```

pub mod aggregation;
pub mod classify;
pub mod codegen;
pub mod config;
pub mod document;
pub mod endpoint;
pub mod errors;
pub mod imports;
pub mod loader;
pub mod methods;
pub mod models;
pub mod naming;
pub mod output;
pub mod resolver;
pub mod schema;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;
