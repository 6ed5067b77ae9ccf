//! Client configuration for the DeepInfra inference API.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};

use crate::error::LlmError;
use crate::types::IdentifyingParams;

/// Model used when none is configured.
pub const DEFAULT_MODEL_ID: &str = "meta-llama/Meta-Llama-3-70B-Instruct";

/// Default inference endpoint root.
pub const DEFAULT_BASE_URL: &str = "https://api.deepinfra.com/v1/inference";

/// Environment variable consulted when no API key is injected.
pub const API_TOKEN_ENV_VAR: &str = "DEEPINFRA_API_TOKEN";

/// DeepInfra client configuration.
///
/// The API key is held as a [`SecretString`]; it is only exposed at the
/// moment the `Authorization` header is built and never appears in `Debug`
/// output or logs.
#[derive(Debug, Clone)]
pub struct DeepInfraConfig {
    /// Model identifier appended to the endpoint root. Must be non-empty.
    pub model_id: String,
    /// Configured model parameters, merged into every request body.
    pub model_params: Map<String, Value>,
    /// Bearer token for the inference API.
    pub api_key: SecretString,
    /// Endpoint root; overridable for proxies and mock servers.
    pub base_url: String,
    /// Whole-request timeout, delegated to the HTTP transport.
    pub timeout: Option<Duration>,
    /// Connection timeout, delegated to the HTTP transport.
    pub connect_timeout: Option<Duration>,
}

impl Default for DeepInfraConfig {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL_ID.to_string(),
            model_params: Map::new(),
            api_key: SecretString::from(String::new()),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            connect_timeout: None,
        }
    }
}

impl DeepInfraConfig {
    /// Validate the configuration before building a client.
    pub fn validate(&self) -> Result<(), LlmError> {
        if self.model_id.trim().is_empty() {
            return Err(LlmError::ConfigurationError(
                "model id must not be empty".to_string(),
            ));
        }
        if self.api_key.expose_secret().is_empty() {
            return Err(LlmError::ConfigurationError(format!(
                "missing API key: pass one to the builder or set {API_TOKEN_ENV_VAR}"
            )));
        }
        if self.base_url.trim().is_empty() {
            return Err(LlmError::ConfigurationError(
                "base URL must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Parameters identifying this configured endpoint.
    pub fn identifying_params(&self) -> IdentifyingParams {
        IdentifyingParams {
            model_id: self.model_id.clone(),
            model_params: self.model_params.clone(),
        }
    }

    /// Configured parameters overlaid with call-time overrides; call-time
    /// keys win on conflict.
    pub(crate) fn merged_params(&self, overrides: &Map<String, Value>) -> Map<String, Value> {
        let mut merged = self.model_params.clone();
        for (key, value) in overrides {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }

    /// Target URL for this model's inference endpoint.
    pub(crate) fn inference_url(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), self.model_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults() {
        let config = DeepInfraConfig::default();
        assert_eq!(config.model_id, DEFAULT_MODEL_ID);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.model_params.is_empty());
        assert!(config.api_key.expose_secret().is_empty());
    }

    #[test]
    fn validate_rejects_empty_model_id() {
        let config = DeepInfraConfig {
            model_id: "  ".to_string(),
            api_key: SecretString::from("k".to_string()),
            ..DeepInfraConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(LlmError::ConfigurationError(_))
        ));
    }

    #[test]
    fn validate_rejects_missing_api_key() {
        let config = DeepInfraConfig::default();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains(API_TOKEN_ENV_VAR));
    }

    #[test]
    fn call_time_overrides_win() {
        let mut config = DeepInfraConfig::default();
        config.model_params.insert("temperature".into(), json!(0.7));
        config.model_params.insert("top_p".into(), json!(0.9));

        let mut overrides = Map::new();
        overrides.insert("temperature".into(), json!(0.1));

        let merged = config.merged_params(&overrides);
        assert_eq!(merged["temperature"], json!(0.1));
        assert_eq!(merged["top_p"], json!(0.9));
    }

    #[test]
    fn inference_url_joins_base_and_model() {
        let config = DeepInfraConfig {
            model_id: "google/flan-t5-xl".to_string(),
            base_url: "https://api.deepinfra.com/v1/inference/".to_string(),
            ..DeepInfraConfig::default()
        };
        assert_eq!(
            config.inference_url(),
            "https://api.deepinfra.com/v1/inference/google/flan-t5-xl"
        );
    }

    #[test]
    fn debug_output_redacts_the_api_key() {
        let config = DeepInfraConfig {
            api_key: SecretString::from("super-secret-token".to_string()),
            ..DeepInfraConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret-token"));
    }
}
