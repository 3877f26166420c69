//! Shared fixtures for unit tests.

use proc_macro2::TokenStream;

use crate::document::SchemaDocument;
use crate::endpoint::{EndpointDescriptor, operations};
use crate::methods::{MethodDescriptor, MethodSynthesizer};
use crate::models::{ModelCatalog, ModelDescriptor, ModelSynthesizer};
use crate::types::TypeMapper;

/// The sample Solcast-style document shared with the integration tests.
pub const SAMPLE_DOCUMENT: &str = include_str!("../tests/fixtures/solcast_sample.json");

pub fn sample_document() -> SchemaDocument {
    SchemaDocument::parse(SAMPLE_DOCUMENT).unwrap()
}

/// Parses and pretty-prints tokens without the generated-file notice.
pub fn format_tokens(tokens: &TokenStream) -> String {
    let file = syn::parse2::<syn::File>(tokens.clone()).unwrap();
    prettyplease::unparse(&file)
}

/// `GetRadiationForecast` from the sample document: two required doubles,
/// an optional integer, an optional string list and `format`.
pub fn sample_method() -> MethodDescriptor {
    let document = sample_document();
    let catalog = ModelCatalog::build(&document).unwrap();
    let mapper = TypeMapper::with_names(&document, catalog.names());
    let (path, verb, operation) = operations(&document)
        .into_iter()
        .find(|(path, _, _)| *path == "/data/live/radiation_forecast")
        .unwrap();
    let endpoint = EndpointDescriptor::extract(mapper.resolver(), path, verb, operation).unwrap();
    MethodSynthesizer::new(mapper).synthesize(&endpoint, None).unwrap()
}

/// The `RadiationResponse` model from the sample document.
pub fn sample_model() -> ModelDescriptor {
    let document = sample_document();
    let catalog = ModelCatalog::build(&document).unwrap();
    ModelSynthesizer::new(TypeMapper::with_names(&document, catalog.names()))
        .synthesize_all(&catalog)
        .unwrap()
        .into_iter()
        .find(|model| model.name == "RadiationResponse")
        .unwrap()
}
