//! Error types for the client generator.

use thiserror::Error;

/// Errors that can occur while loading a document or generating code.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// A `$ref` pointer names a node that does not exist.
    ///
    /// Fatal for the definition or endpoint that used the pointer.
    #[error("Unresolved reference '{pointer}': no entry named '{segment}'")]
    UnresolvedReference {
        /// The full pointer as written in the document (e.g. `#/components/schemas/Foo`).
        pointer: String,
        /// The path segment whose lookup failed.
        segment: String,
    },

    /// Following a chain of `$ref` pointers led back to a pointer already visited.
    #[error("Cyclic reference detected while resolving '{pointer}'")]
    CyclicReference {
        /// The pointer that was reached a second time.
        pointer: String,
    },

    /// The pointer is not an internal `#/a/b/c` pointer.
    #[error("Invalid reference '{0}': only internal '#/...' pointers are supported")]
    InvalidReference(String),

    /// The document text is neither valid JSON nor valid YAML.
    #[error("Failed to parse API description: {0}")]
    DocumentParse(String),

    /// Failed to generate code
    #[error("Code generation failed: {0}")]
    CodeGenError(String),

    /// Failed to write output file
    #[error("Failed to write output file '{path}': {source}")]
    WriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read a local input file
    #[error("Failed to read '{path}': {source}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to download the API description
    #[error("Failed to fetch '{url}': {source}")]
    FetchError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}
