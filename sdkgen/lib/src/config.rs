//! Generator configuration.
//!
//! Defaults target the Solcast API. Any field can be overridden from a TOML
//! file; missing keys keep their defaults.
//!
//! ```toml
//! crate_name = "solcast"
//! group_prefixes = ["/data/live/", "/data/forecast/"]
//! aggregation_suffix = "/aggregations"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::aggregation::{AggregationGrouping, DEFAULT_DISCRIMINATORS};
use crate::errors::GeneratorError;

/// Production API description.
pub const DEFAULT_SPEC_URL: &str = "https://api.solcast.com.au/openapi/v1/openapi.json";
/// Development API description (`--dev`).
pub const ALTERNATE_SPEC_URL: &str = "https://dev-api.solcast.com.au/openapi/v1/openapi.json";
/// Read at generation time to override the emitted base URL.
pub const BASE_URL_ENV: &str = "SOLCAST_API_BASE_URL";
pub const DEFAULT_BASE_URL: &str = "https://api.solcast.com.au";

/// Where the API description comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SpecSource {
    /// The production description.
    #[default]
    Default,
    /// The development description.
    Alternate,
    /// Any local path or HTTP(S) URL.
    Custom(String),
}

impl SpecSource {
    /// Picks a source from CLI flags; an explicit path wins over `--dev`.
    pub fn from_flags(dev: bool, path: Option<String>) -> Self {
        match (path, dev) {
            (Some(path), _) => SpecSource::Custom(path),
            (None, true) => SpecSource::Alternate,
            (None, false) => SpecSource::Default,
        }
    }

    pub fn location(&self) -> &str {
        match self {
            SpecSource::Default => DEFAULT_SPEC_URL,
            SpecSource::Alternate => ALTERNATE_SPEC_URL,
            SpecSource::Custom(location) => location,
        }
    }
}

/// Everything that shapes one generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Name of the emitted crate.
    pub crate_name: String,
    /// Version written to the emitted `Cargo.toml`.
    pub crate_version: String,
    /// Endpoint group prefixes; the first match wins.
    pub group_prefixes: Vec<String>,
    /// Path suffix of cross-group aggregation endpoints.
    pub aggregation_suffix: String,
    /// Context discriminators searched for in aggregation paths, in order.
    pub discriminators: Vec<String>,
    /// Base URL compiled into the emitted URL table.
    pub base_url: String,
    pub api_key_env: String,
    pub base_url_env: String,
    pub suppress_update_check_env: String,
    pub verbose_output_env: String,
    /// GitHub "latest release" endpoint queried by the emitted update check.
    pub release_check_url: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            crate_name: "solcast".to_string(),
            crate_version: "0.1.0".to_string(),
            group_prefixes: [
                "/data/live/",
                "/data/forecast/",
                "/data/historic/",
                "/data/tmy/",
                "/resources/pv_power_site",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
            aggregation_suffix: "/aggregations".to_string(),
            discriminators: DEFAULT_DISCRIMINATORS.iter().map(|d| d.to_string()).collect(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key_env: "SOLCAST_API_KEY".to_string(),
            base_url_env: BASE_URL_ENV.to_string(),
            suppress_update_check_env: "SUPPRESS_SDK_UPDATE_CHECK".to_string(),
            verbose_output_env: "SOLCAST_VERBOSE_OUTPUT".to_string(),
            release_check_url:
                "https://api.github.com/repos/solcast/solcast-api-csharp-sdk/releases/latest"
                    .to_string(),
        }
    }
}

impl GeneratorConfig {
    /// Defaults, with the base URL taken from `SOLCAST_API_BASE_URL` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var(&config.base_url_env)
            && !url.trim().is_empty()
        {
            config.base_url = url.trim().to_string();
        }
        config
    }

    /// Parses a TOML document over the defaults.
    ///
    /// ## Errors
    ///
    /// Returns `GeneratorError::ConfigError` for invalid TOML or an invalid
    /// resulting configuration.
    pub fn from_toml_str(text: &str) -> Result<Self, GeneratorError> {
        let config: Self =
            toml::from_str(text).map_err(|e| GeneratorError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self, GeneratorError> {
        let text = std::fs::read_to_string(path).map_err(|source| GeneratorError::ReadError {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks the fields later stages rely on.
    pub fn validate(&self) -> Result<(), GeneratorError> {
        if self.crate_name.is_empty()
            || !self
                .crate_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(GeneratorError::ConfigError(format!(
                "crate_name '{}' is not a valid crate name",
                self.crate_name
            )));
        }
        if semver::Version::parse(&self.crate_version).is_err() {
            return Err(GeneratorError::ConfigError(format!(
                "crate_version '{}' is not MAJOR.MINOR.PATCH",
                self.crate_version
            )));
        }
        if self.group_prefixes.iter().any(|p| p.is_empty()) {
            return Err(GeneratorError::ConfigError(
                "group_prefixes must not contain empty entries".to_string(),
            ));
        }
        Ok(())
    }

    /// The crate name as it appears in Rust paths (`-` becomes `_`).
    pub fn crate_ident(&self) -> String {
        self.crate_name.replace('-', "_")
    }

    pub fn aggregation(&self) -> AggregationGrouping {
        AggregationGrouping::new(self.aggregation_suffix.clone(), self.discriminators.clone())
    }
}

/// Options for one CLI run (source, output, extras).
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub source: SpecSource,
    /// Root directory of the emitted crate.
    pub output: PathBuf,
    /// Optional JSON file with the static location table.
    pub locations: Option<PathBuf>,
    /// Print files instead of writing them.
    pub dry_run: bool,
}
