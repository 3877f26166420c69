//! Runtime support modules of the emitted crate.
//!
//! These files do not depend on the API description. Only the names in
//! [`GeneratorConfig`] (crate name, environment variables, release URL) are
//! spliced in.

use proc_macro2::TokenStream;
use quote::quote;

use crate::config::GeneratorConfig;

/// Generates `errors.rs` with the `ClientError` enum.
///
/// `401` has its own variant so callers can tell a bad key from any other
/// failed status.
pub fn errors_tokens(config: &GeneratorConfig) -> TokenStream {
    let missing_key = format!("The {} environment variable is not set.", config.api_key_env);
    quote! {
        //! Errors returned by the API clients.

        use thiserror::Error;

        /// Errors that can occur when calling the API.
        #[derive(Debug, Error)]
        pub enum ClientError {
            /// No API key was passed in `ClientOptions` or found in the environment.
            #[error(#missing_key)]
            MissingApiKey,

            /// The API rejected the key (`401 Unauthorized`).
            #[error("The API key was rejected (401 Unauthorized).")]
            UnauthorizedApiKey,

            /// The request could not be sent or its body could not be read.
            #[error("Request '{operation}' failed with parameters [{parameters}]: {source}")]
            Transport {
                operation: String,
                /// The query parameters that were sent, as `key=value` pairs.
                parameters: String,
                #[source]
                source: reqwest::Error,
            },

            /// The API answered with a non-success status other than `401`.
            #[error("Request '{operation}' returned status {status}: {body}")]
            Status {
                operation: String,
                status: u16,
                body: String,
            },

            /// The response body did not decode into the response type.
            #[error("Failed to decode response: {0}")]
            Json(#[from] serde_json::Error),

            /// An argument could not be serialized.
            #[error("Failed to serialize request data: {0}")]
            Serialization(#[source] serde_json::Error),

            /// The HTTP client could not be built (for example an invalid proxy).
            #[error("Failed to build HTTP client: {0}")]
            ClientBuild(#[source] reqwest::Error),
        }
    }
}

/// Generates `utilities.rs`: `ApiResponse`, `query_value` and `wants_json`.
pub fn utilities_tokens() -> TokenStream {
    quote! {
        //! Response wrapper and query helpers shared by all clients.

        use serde::Serialize;
        use serde::de::DeserializeOwned;
        use serde_json::Value;

        use crate::errors::ClientError;

        /// The outcome of a successful call.
        ///
        /// `raw_response` always holds the body text. `data` is decoded only
        /// when the request asked for `format=json`.
        #[derive(Debug, Clone, PartialEq)]
        pub struct ApiResponse<T> {
            pub data: Option<T>,
            pub raw_response: String,
        }

        impl<T> ApiResponse<T> {
            pub fn new(data: Option<T>, raw_response: String) -> Self {
                Self { data, raw_response }
            }
        }

        impl<T: DeserializeOwned> ApiResponse<T> {
            /// Wraps a response body, decoding it into `data` when `decode` is set.
            ///
            /// ## Errors
            ///
            /// Returns `ClientError::Json` if `decode` is set and the body is not
            /// valid JSON for `T`.
            pub fn from_body(raw_response: String, decode: bool) -> Result<Self, ClientError> {
                let data = if decode {
                    Some(serde_json::from_str(&raw_response)?)
                } else {
                    None
                };
                Ok(Self::new(data, raw_response))
            }
        }

        /// Renders an argument as a query value.
        ///
        /// Strings are sent unquoted, lists are comma-joined, `None` is empty.
        ///
        /// ## Errors
        ///
        /// Returns `ClientError::Serialization` if the value cannot be serialized.
        pub fn query_value<T: Serialize + ?Sized>(value: &T) -> Result<String, ClientError> {
            let value = serde_json::to_value(value).map_err(ClientError::Serialization)?;
            Ok(flatten(&value))
        }

        fn flatten(value: &Value) -> String {
            match value {
                Value::Null => String::new(),
                Value::String(s) => s.clone(),
                Value::Array(items) => items.iter().map(flatten).collect::<Vec<_>>().join(","),
                other => other.to_string(),
            }
        }

        /// Whether the outgoing parameters ask for a JSON body.
        pub fn wants_json(parameters: &[(String, String)]) -> bool {
            parameters
                .iter()
                .any(|(key, value)| key == "format" && value == "json")
        }

    }
}

/// Generates `base_client.rs`: options, authenticated requests, status
/// handling and the once-per-process release check.
pub fn base_client_tokens(config: &GeneratorConfig) -> TokenStream {
    let crate_name = config.crate_name.as_str();
    let user_agent_prefix = format!("{}-rust-sdk/", config.crate_name);
    let api_key_env = config.api_key_env.as_str();
    let verbose_env = config.verbose_output_env.as_str();
    let suppress_env = config.suppress_update_check_env.as_str();
    let release_url = config.release_check_url.as_str();

    quote! {
        //! Shared HTTP plumbing for the API clients.

        use reqwest::{Method, StatusCode};
        use serde::de::DeserializeOwned;
        use serde_json::Value;
        use tokio::sync::OnceCell;

        use crate::errors::ClientError;
        use crate::urls::BASE_URL;
        use crate::utilities::{ApiResponse, wants_json};

        const CRATE_NAME: &str = #crate_name;
        const API_KEY_ENV: &str = #api_key_env;
        const VERBOSE_OUTPUT_ENV: &str = #verbose_env;
        const SUPPRESS_UPDATE_CHECK_ENV: &str = #suppress_env;
        const RELEASE_CHECK_URL: &str = #release_url;
        const USER_AGENT: &str = concat!(#user_agent_prefix, env!("CARGO_PKG_VERSION"));

        /// Completed once per process, by the first request of a client with
        /// update checks enabled.
        static UPDATE_CHECK: OnceCell<()> = OnceCell::const_new();

        /// Options for constructing a client.
        #[derive(Debug, Clone)]
        pub struct ClientOptions {
            /// API key; falls back to the API key environment variable.
            pub api_key: Option<String>,
            /// Overrides the compiled-in base URL.
            pub base_url: Option<String>,
            /// Proxy URL applied to all requests.
            pub proxy: Option<String>,
            /// Check once per process whether a newer SDK release exists.
            pub check_for_updates: bool,
        }

        impl Default for ClientOptions {
            fn default() -> Self {
                Self {
                    api_key: None,
                    base_url: None,
                    proxy: None,
                    check_for_updates: true,
                }
            }
        }

        /// The HTTP client every generated client delegates to.
        #[derive(Debug, Clone)]
        pub struct BaseClient {
            http: reqwest::Client,
            api_key: String,
            base_url: String,
            check_for_updates: bool,
        }

        impl BaseClient {
            /// ## Errors
            ///
            /// - `ClientError::MissingApiKey` if no key is configured
            /// - `ClientError::ClientBuild` if the proxy or client setup is invalid
            pub fn new(options: ClientOptions) -> Result<Self, ClientError> {
                let api_key = match options.api_key.filter(|key| !key.trim().is_empty()) {
                    Some(key) => key,
                    None => std::env::var(API_KEY_ENV)
                        .ok()
                        .filter(|key| !key.trim().is_empty())
                        .ok_or(ClientError::MissingApiKey)?,
                };

                let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
                if let Some(proxy) = &options.proxy {
                    builder = builder.proxy(reqwest::Proxy::all(proxy).map_err(ClientError::ClientBuild)?);
                }
                let http = builder.build().map_err(ClientError::ClientBuild)?;

                Ok(Self {
                    http,
                    api_key,
                    base_url: options.base_url.unwrap_or_else(|| BASE_URL.to_string()),
                    check_for_updates: options.check_for_updates,
                })
            }

            /// Sends a request and decodes the body into `T` when `format=json`
            /// was requested.
            pub async fn execute<T: DeserializeOwned>(
                &self,
                method: Method,
                path: &str,
                operation: &str,
                parameters: Vec<(String, String)>,
                payload: Option<Value>,
            ) -> Result<ApiResponse<T>, ClientError> {
                let decode = wants_json(&parameters);
                let raw = self.send(method, path, operation, parameters, payload).await?;
                ApiResponse::from_body(raw, decode)
            }

            /// Sends a request for an endpoint without a declared response type.
            pub async fn execute_raw(
                &self,
                method: Method,
                path: &str,
                operation: &str,
                parameters: Vec<(String, String)>,
                payload: Option<Value>,
            ) -> Result<ApiResponse<String>, ClientError> {
                let raw = self.send(method, path, operation, parameters, payload).await?;
                Ok(ApiResponse::new(None, raw))
            }

            async fn send(
                &self,
                method: Method,
                path: &str,
                operation: &str,
                parameters: Vec<(String, String)>,
                payload: Option<Value>,
            ) -> Result<String, ClientError> {
                if self.check_for_updates {
                    check_for_updates().await;
                }

                let url = format!(
                    "{}/{}",
                    self.base_url.trim_end_matches('/'),
                    path.trim_start_matches('/')
                );
                let mut request = self
                    .http
                    .request(method, &url)
                    .bearer_auth(&self.api_key)
                    .query(&parameters);
                if let Some(payload) = &payload {
                    request = request.json(payload);
                }

                let transport = |source: reqwest::Error| ClientError::Transport {
                    operation: operation.to_string(),
                    parameters: describe(&parameters),
                    source,
                };
                let response = request.send().await.map_err(transport)?;

                let status = response.status();
                if status == StatusCode::UNAUTHORIZED {
                    return Err(ClientError::UnauthorizedApiKey);
                }
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(ClientError::Status {
                        operation: operation.to_string(),
                        status: status.as_u16(),
                        body,
                    });
                }

                let raw = response.text().await.map_err(transport)?;
                if env_flag(VERBOSE_OUTPUT_ENV) {
                    eprintln!("{}", raw);
                }
                Ok(raw)
            }
        }

        fn describe(parameters: &[(String, String)]) -> String {
            parameters
                .iter()
                .map(|(key, value)| format!("{}={}", key, value))
                .collect::<Vec<_>>()
                .join(", ")
        }

        fn env_flag(name: &str) -> bool {
            std::env::var(name)
                .map(|value| value.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(false)
        }

        async fn check_for_updates() {
            if env_flag(SUPPRESS_UPDATE_CHECK_ENV) {
                return;
            }
            UPDATE_CHECK
                .get_or_init(|| async {
                    if let Err(e) = report_newer_release().await {
                        eprintln!("Failed to check for SDK updates: {}", e);
                    }
                })
                .await;
        }

        async fn report_newer_release() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            let release: Value = reqwest::Client::new()
                .get(RELEASE_CHECK_URL)
                .header(reqwest::header::USER_AGENT, USER_AGENT)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            let tag = release
                .get("tag_name")
                .and_then(Value::as_str)
                .ok_or("release has no tag_name")?;
            let latest = semver::Version::parse(tag.trim_start_matches(['v', 'V']))?;
            let current = semver::Version::parse(env!("CARGO_PKG_VERSION"))?;
            if latest > current {
                eprintln!(
                    "A newer version of {} is available ({} -> {}). Run `cargo add {}@{}` to upgrade.",
                    CRATE_NAME, current, latest, CRATE_NAME, latest
                );
            }
            Ok(())
        }
    }
}
