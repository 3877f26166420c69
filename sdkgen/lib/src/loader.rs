//! Acquiring the API description and the optional location table.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::config::SpecSource;
use crate::document::SchemaDocument;
use crate::errors::GeneratorError;

/// One entry of the static location table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Location {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "resourceId")]
    pub resource_id: String,
}

fn is_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Loads and parses the API description.
///
/// URLs are fetched (a non-success status is an error); anything else must
/// be an existing file.
///
/// ## Errors
///
/// - `GeneratorError::FetchError` if the download fails
/// - `GeneratorError::ConfigError` if a custom location is neither a URL nor a file
/// - `GeneratorError::DocumentParse` if the text is not JSON or YAML
#[instrument(skip_all, fields(source = %source.location()))]
pub async fn load_document(source: &SpecSource) -> Result<SchemaDocument, GeneratorError> {
    let location = source.location();
    let text = if is_url(location) {
        info!("fetching API description");
        fetch(location).await?
    } else {
        let path = Path::new(location);
        if !path.is_file() {
            return Err(GeneratorError::ConfigError(format!(
                "'{}' is neither a URL nor an existing file",
                location
            )));
        }
        read(path)?
    };
    debug!(bytes = text.len(), "API description loaded");
    SchemaDocument::parse(&text)
}

async fn fetch(url: &str) -> Result<String, GeneratorError> {
    let wrap = |source| GeneratorError::FetchError {
        url: url.to_string(),
        source,
    };
    reqwest::get(url)
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(wrap)?
        .text()
        .await
        .map_err(wrap)
}

fn read(path: &Path) -> Result<String, GeneratorError> {
    std::fs::read_to_string(path).map_err(|source| GeneratorError::ReadError {
        path: path.display().to_string(),
        source,
    })
}

/// Reads the location table. A missing file yields an empty table.
///
/// ## Errors
///
/// Returns an error if the file exists but cannot be read or is not a JSON
/// array of locations.
pub fn load_locations(path: &Path) -> Result<Vec<Location>, GeneratorError> {
    if !path.exists() {
        debug!(path = %path.display(), "no location table; emitting an empty one");
        return Ok(Vec::new());
    }
    let text = read(path)?;
    serde_json::from_str(&text).map_err(|e| {
        GeneratorError::DocumentParse(format!("invalid location table '{}': {}", path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loads_local_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("openapi.yaml");
        std::fs::write(&path, "openapi: 3.0.0\npaths: {}\n").unwrap();

        let source = SpecSource::Custom(path.display().to_string());
        let doc = load_document(&source).await.unwrap();
        assert_eq!(doc.root()["openapi"], "3.0.0");
    }

    #[tokio::test]
    async fn custom_source_must_exist() {
        let source = SpecSource::Custom("definitely/not/here.json".to_string());
        assert!(matches!(
            load_document(&source).await,
            Err(GeneratorError::ConfigError(_))
        ));
    }

    #[test]
    fn locations_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locations.json");
        std::fs::write(
            &path,
            r#"[{"name": "Sydney Opera House", "latitude": -33.856784, "longitude": 151.215297, "resourceId": "ba75-e17a-7374-95ed"}]"#,
        )
        .unwrap();

        let locations = load_locations(&path).unwrap();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].resource_id, "ba75-e17a-7374-95ed");
    }

    #[test]
    fn missing_location_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_locations(&dir.path().join("none.json")).unwrap().is_empty());
    }

    #[test]
    fn malformed_location_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locations.json");
        std::fs::write(&path, r#"{"name": "not a list"}"#).unwrap();
        assert!(load_locations(&path).is_err());
    }
}
