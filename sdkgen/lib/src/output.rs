//! Output assembly and file writing for the generated client crate.
//!
//! This module runs the whole pipeline over one API description and produces
//! every file of the emitted crate in memory. Nothing is written until all
//! files have been generated and validated.
//!
//! ## Output Structure
//!
//! ```text
//! <output>/
//! ├── Cargo.toml
//! └── src/
//!     ├── lib.rs, prelude.rs, urls.rs, locations.rs
//!     ├── base_client.rs, errors.rs, utilities.rs
//!     ├── clients/{mod.rs, live_client.rs, ..., aggregation_client.rs}
//!     └── models/{mod.rs, requests/, responses/}
//! ```
//!
//! ## Safety Guarantees
//!
//! - **Validation**: every Rust file is parsed with `syn` before anything is written
//! - **Formatting**: output is formatted with `prettyplease`
//! - **Atomic writes**: temp file + rename, so no file is left half-written
//! - **Determinism**: the same input yields byte-identical files in the same order

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use proc_macro2::TokenStream;
use tracing::{debug, info, instrument};

use crate::aggregation::{AGGREGATION_CLIENT, ContextualEndpoint};
use crate::classify::{classify, client_name_for_group, group_of};
use crate::codegen::scaffold::{self, ModuleEntry};
use crate::codegen::{ClassDescriptor, ClassEmitter, runtime, tables};
use crate::config::GeneratorConfig;
use crate::document::SchemaDocument;
use crate::endpoint::{EndpointDescriptor, operations};
use crate::errors::GeneratorError;
use crate::loader::Location;
use crate::methods::MethodSynthesizer;
use crate::models::{ModelCatalog, ModelKind, ModelSynthesizer};
use crate::naming::{UniqueNames, module_name};
use crate::types::TypeMapper;

/// Notice prepended to every emitted Rust file.
pub const GENERATED_NOTICE: &str =
    "// This code was automatically generated by sdkgen. Do not edit manually.";

/// One emitted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Path relative to the crate root, `/`-separated.
    pub path: String,
    pub contents: String,
}

/// Every file of one emitted crate, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedCrate {
    pub files: Vec<GeneratedFile>,
}

impl GeneratedCrate {
    pub fn file(&self, path: &str) -> Option<&GeneratedFile> {
        self.files.iter().find(|file| file.path == path)
    }

    pub fn paths(&self) -> Vec<&str> {
        self.files.iter().map(|file| file.path.as_str()).collect()
    }

    fn push(&mut self, path: impl Into<String>, contents: String) {
        self.files.push(GeneratedFile {
            path: path.into(),
            contents,
        });
    }

    fn push_rust(&mut self, path: impl Into<String>, tokens: &TokenStream) -> Result<(), GeneratorError> {
        let path = path.into();
        let file = validate_code(tokens).map_err(|e| match e {
            GeneratorError::CodeGenError(message) => GeneratorError::CodeGenError(format!("{}: {}", path, message)),
            other => other,
        })?;
        self.push(path, format_code(&file));
        Ok(())
    }

    /// Writes every file below `output_dir`.
    ///
    /// ## Errors
    ///
    /// Returns `GeneratorError::WriteError` for the first file that cannot be written.
    #[instrument(skip(self), fields(files = self.files.len()))]
    pub fn write(&self, output_dir: &Path) -> Result<(), GeneratorError> {
        for file in &self.files {
            write_atomic(&output_dir.join(&file.path), &file.contents)?;
        }
        info!(output = %output_dir.display(), "client crate written");
        Ok(())
    }

    /// Prints every file to stdout instead of writing it.
    pub fn print(&self) {
        for file in &self.files {
            println!("=== {} ===\n{}\n", file.path, file.contents);
        }
    }
}

/// Generates the complete client crate for one API description.
///
/// ## Pipeline
///
/// 1. Catalog every model and its struct name
/// 2. Classify paths and extract endpoints per group, in document order
/// 3. Move aggregation endpoints into the combined client
/// 4. Synthesize methods and models
/// 5. Emit, validate and format every file
///
/// ## Errors
///
/// Returns the first error from any stage. An unresolved or cyclic `$ref`
/// aborts the whole run, as does any file that fails validation.
#[instrument(skip_all, fields(crate_name = %config.crate_name))]
pub fn generate(
    document: &SchemaDocument,
    config: &GeneratorConfig,
    locations: &[Location],
) -> Result<GeneratedCrate, GeneratorError> {
    config.validate()?;

    let catalog = ModelCatalog::build(document)?;
    let mapper = TypeMapper::with_names(document, catalog.names());
    let classification = classify(document, &config.group_prefixes);
    let grouping = config.aggregation();
    let synthesizer = MethodSynthesizer::new(mapper);
    let emitter = ClassEmitter::new(config.crate_ident());

    let mut endpoints: IndexMap<&str, Vec<EndpointDescriptor>> = config
        .group_prefixes
        .iter()
        .map(|prefix| (prefix.as_str(), Vec::new()))
        .collect();
    for (path, verb, operation) in operations(document) {
        if let Some(group) = group_of(path, &config.group_prefixes)
            && let Some(list) = endpoints.get_mut(group)
        {
            list.push(EndpointDescriptor::extract(mapper.resolver(), path, verb, operation)?);
        }
    }

    let mut client_names = UniqueNames::new();
    let mut clients = Vec::new();
    let mut combined: Vec<ContextualEndpoint> = Vec::new();
    for (prefix, group) in endpoints {
        let remaining: Vec<ContextualEndpoint> = grouping
            .split_off(group, &mut combined)
            .into_iter()
            .map(|endpoint| (endpoint, None))
            .collect();
        let methods = synthesizer.synthesize_all(&remaining)?;
        let name = client_names.claim(&client_name_for_group(prefix));
        debug!(client = %name, methods = methods.len(), "client synthesized");
        clients.push(ClassDescriptor::client(
            &name,
            format!("Client for the `{}` endpoints.", prefix),
            methods,
        ));
    }
    if !combined.is_empty() {
        let methods = synthesizer.synthesize_all(&combined)?;
        let name = client_names.claim(AGGREGATION_CLIENT);
        clients.push(ClassDescriptor::client(
            &name,
            format!("Client for the `{}` endpoints of every group.", grouping.suffix()),
            methods,
        ));
    }

    let models = ModelSynthesizer::new(mapper).synthesize_all(&catalog)?;
    let mut module_names: IndexMap<ModelKind, UniqueNames> = IndexMap::new();
    let models: Vec<ClassDescriptor> = models
        .into_iter()
        .map(|model| {
            let module = module_names
                .entry(model.kind)
                .or_default()
                .claim(&module_name(&model.name));
            ClassDescriptor::model(model, &module)
        })
        .collect();
    info!(
        clients = clients.len(),
        models = models.len(),
        "synthesis complete"
    );

    let mut output = GeneratedCrate::default();
    output.push("Cargo.toml", scaffold::cargo_toml(config));
    output.push_rust("src/lib.rs", &scaffold::lib_tokens(config))?;
    output.push_rust("src/errors.rs", &runtime::errors_tokens(config))?;
    output.push_rust("src/utilities.rs", &runtime::utilities_tokens())?;
    output.push_rust("src/base_client.rs", &runtime::base_client_tokens(config))?;
    output.push_rust("src/urls.rs", &tables::urls_tokens(&classification, &config.base_url))?;
    output.push_rust("src/locations.rs", &tables::locations_tokens(locations))?;

    let client_entries: Vec<ModuleEntry> = clients
        .iter()
        .map(|class| ModuleEntry::new(class.module(), &class.name))
        .collect();
    output.push_rust(
        "src/clients/mod.rs",
        &scaffold::reexport_tokens("API clients, one per endpoint group.", &client_entries),
    )?;
    for class in &clients {
        output.push_rust(class.file_path(), &emitter.emit(class)?)?;
    }

    output.push_rust("src/models/mod.rs", &scaffold::models_mod_tokens())?;
    for (kind, doc) in [
        (ModelKind::Request, "Request models."),
        (ModelKind::Response, "Response models."),
    ] {
        let entries: Vec<ModuleEntry> = models
            .iter()
            .filter(|class| class.namespace.starts_with(&format!("crate::models::{}::", kind.module())))
            .map(|class| ModuleEntry::new(class.module(), &class.name))
            .collect();
        output.push_rust(
            format!("src/models/{}/mod.rs", kind.module()),
            &scaffold::reexport_tokens(doc, &entries),
        )?;
    }
    for class in &models {
        output.push_rust(class.file_path(), &emitter.emit(class)?)?;
    }

    let client_names: Vec<String> = clients.iter().map(|class| class.name.clone()).collect();
    output.push_rust("src/prelude.rs", &scaffold::prelude_tokens(&client_names))?;

    info!(files = output.files.len(), "client crate generated");
    Ok(output)
}

/// Validates generated code using syn.
///
/// ## Errors
///
/// Returns `GeneratorError::CodeGenError` if the code fails to parse.
pub fn validate_code(tokens: &TokenStream) -> Result<syn::File, GeneratorError> {
    syn::parse2(tokens.clone())
        .map_err(|e| GeneratorError::CodeGenError(format!("Generated code is invalid: {}", e)))
}

/// Formats a parsed file with prettyplease, prepending [`GENERATED_NOTICE`].
pub fn format_code(file: &syn::File) -> String {
    format!("{}\n\n{}", GENERATED_NOTICE, prettyplease::unparse(file))
}

/// Writes content to a file atomically using temp file + rename.
///
/// ## Errors
///
/// Returns `GeneratorError::WriteError` if the parent directory cannot be
/// created, the temp file cannot be written, or the rename fails.
pub fn write_atomic(path: &Path, content: &str) -> Result<(), GeneratorError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| GeneratorError::WriteError {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content).map_err(|e| GeneratorError::WriteError {
        path: temp_path.display().to_string(),
        source: e,
    })?;

    fs::rename(&temp_path, path).map_err(|e| GeneratorError::WriteError {
        path: path.display().to_string(),
        source: e,
    })?;

    debug!(path = %path.display(), bytes = content.len(), "wrote file");
    Ok(())
}
