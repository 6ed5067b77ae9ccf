//! Builder for [`DeepInfraClient`].

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};

use crate::client::DeepInfraClient;
use crate::config::{API_TOKEN_ENV_VAR, DeepInfraConfig};
use crate::error::LlmError;

/// DeepInfra client builder.
///
/// Credential resolution: an explicitly supplied key wins; otherwise the
/// `DEEPINFRA_API_TOKEN` environment variable is consulted at build time.
#[derive(Debug, Clone, Default)]
pub struct DeepInfraBuilder {
    config: DeepInfraConfig,
    http_client: Option<reqwest::Client>,
}

impl DeepInfraBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API key (takes precedence over the environment variable).
    pub fn api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.config.api_key = SecretString::from(api_key.into());
        self
    }

    /// Set the model identifier, e.g. `google/flan-t5-xl`.
    pub fn model<S: Into<String>>(mut self, model_id: S) -> Self {
        self.config.model_id = model_id.into();
        self
    }

    /// Replace the configured model parameters wholesale.
    pub fn model_params(mut self, params: Map<String, Value>) -> Self {
        self.config.model_params = params;
        self
    }

    /// Set one configured model parameter.
    pub fn param<S: Into<String>>(mut self, key: S, value: Value) -> Self {
        self.config.model_params.insert(key.into(), value);
        self
    }

    /// Override the inference endpoint root (proxies, mock servers).
    pub fn base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Set the whole-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = Some(timeout);
        self
    }

    /// Use a custom async HTTP client instead of building one from the
    /// configured timeouts. Blocking calls still build their own transport.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Resolve the credential, validate the configuration, and build the
    /// client.
    pub fn build(self) -> Result<DeepInfraClient, LlmError> {
        let mut config = self.config;
        if config.api_key.expose_secret().is_empty()
            && let Ok(token) = std::env::var(API_TOKEN_ENV_VAR)
        {
            config.api_key = SecretString::from(token);
        }
        config.validate()?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => {
                let mut builder = reqwest::Client::builder();
                if let Some(timeout) = config.timeout {
                    builder = builder.timeout(timeout);
                }
                if let Some(timeout) = config.connect_timeout {
                    builder = builder.connect_timeout(timeout);
                }
                builder.build().map_err(|e| {
                    LlmError::ConfigurationError(format!("failed to build HTTP client: {e}"))
                })?
            }
        };

        Ok(DeepInfraClient::with_http_client(config, http_client))
    }
}
