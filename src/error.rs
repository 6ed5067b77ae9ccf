//! Error types and HTTP status classification for the DeepInfra API.
//!
//! Transport-level failures propagate unmodified from `reqwest`; everything
//! the adapter raises itself is an [`LlmError`] variant. Status
//! classification is a pure function over the status code and body text so
//! it stays testable without a transport.

use thiserror::Error;

/// Errors surfaced by the DeepInfra client.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Transport-level HTTP failure (connection, TLS, timeout).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// 5xx response from the inference API.
    #[error("DeepInfra server error {code}: {message}")]
    ServerError {
        /// HTTP status code.
        code: u16,
        /// Response body text.
        message: String,
    },

    /// 401/403 response.
    #[error("DeepInfra authentication failed: {0}")]
    AuthenticationError(String),

    /// 404 response; the message names the requested model.
    #[error("DeepInfra model not found: {0}")]
    NotFound(String),

    /// 429 response.
    #[error("DeepInfra rate limit exceeded: {0}")]
    RateLimitError(String),

    /// Any other 4xx response; carries the response body.
    #[error("DeepInfra received an invalid payload: {0}")]
    InvalidInput(String),

    /// Non-200 status outside the ranges above.
    #[error("DeepInfra returned an unexpected response with status {code}: {message}")]
    ApiError {
        /// HTTP status code.
        code: u16,
        /// Response body text.
        message: String,
    },

    /// Error payload embedded in an HTTP 200 streaming response.
    #[error("DeepInfra reported an error: {0}")]
    ProviderError(String),

    /// Response body did not have the expected shape.
    #[error("failed to parse DeepInfra response: {0}")]
    ParseError(String),

    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    JsonError(String),

    /// SSE framing failure on the response byte stream.
    #[error("stream error: {0}")]
    StreamError(String),

    /// Invalid client configuration.
    #[error("configuration error: {0}")]
    ConfigurationError(String),
}

impl LlmError {
    /// HTTP status code associated with this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ServerError { code, .. } | Self::ApiError { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether retrying the same request could plausibly succeed.
    ///
    /// Retry policy itself is the caller's responsibility; this only labels
    /// the failure.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::HttpError(_) | Self::ServerError { .. } | Self::RateLimitError(_)
        )
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        Self::HttpError(err.to_string())
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

/// Classification of an HTTP response status.
///
/// Each non-success outcome carries the original status code and response
/// body text for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusOutcome {
    /// 200.
    Success,
    /// 5xx.
    ServerError(u16, String),
    /// 401.
    Unauthorized(u16, String),
    /// 403.
    Forbidden(u16, String),
    /// 404.
    NotFound(u16, String),
    /// 429.
    RateLimited(u16, String),
    /// Remaining 4xx.
    InvalidPayload(u16, String),
    /// Any other non-200.
    UnexpectedStatus(u16, String),
}

/// Classify an HTTP status code, first match wins: 5xx, 401, 403, 404, 429,
/// remaining 4xx, any other non-200, then 200.
pub fn classify_status(status: u16, body: &str) -> StatusOutcome {
    match status {
        s if s >= 500 => StatusOutcome::ServerError(s, body.to_string()),
        401 => StatusOutcome::Unauthorized(status, body.to_string()),
        403 => StatusOutcome::Forbidden(status, body.to_string()),
        404 => StatusOutcome::NotFound(status, body.to_string()),
        429 => StatusOutcome::RateLimited(status, body.to_string()),
        s if s >= 400 => StatusOutcome::InvalidPayload(s, body.to_string()),
        200 => StatusOutcome::Success,
        s => StatusOutcome::UnexpectedStatus(s, body.to_string()),
    }
}

impl StatusOutcome {
    /// Convert the classification into the adapter error for non-success
    /// outcomes. `model_id` feeds the 404 diagnostic.
    pub fn into_result(self, model_id: &str) -> Result<(), LlmError> {
        match self {
            Self::Success => Ok(()),
            Self::ServerError(code, body) => Err(LlmError::ServerError {
                code,
                message: body,
            }),
            Self::Unauthorized(..) => Err(LlmError::AuthenticationError("unauthorized".into())),
            Self::Forbidden(..) => Err(LlmError::AuthenticationError("forbidden".into())),
            Self::NotFound(..) => Err(LlmError::NotFound(model_id.to_string())),
            Self::RateLimited(..) => Err(LlmError::RateLimitError("rate limit exceeded".into())),
            Self::InvalidPayload(_, body) => Err(LlmError::InvalidInput(body)),
            Self::UnexpectedStatus(code, body) => Err(LlmError::ApiError {
                code,
                message: body,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_follows_precedence_table() {
        assert_eq!(
            classify_status(500, "boom"),
            StatusOutcome::ServerError(500, "boom".into())
        );
        assert_eq!(
            classify_status(503, ""),
            StatusOutcome::ServerError(503, String::new())
        );
        assert_eq!(
            classify_status(401, "x"),
            StatusOutcome::Unauthorized(401, "x".into())
        );
        assert_eq!(
            classify_status(403, "x"),
            StatusOutcome::Forbidden(403, "x".into())
        );
        assert_eq!(
            classify_status(404, "x"),
            StatusOutcome::NotFound(404, "x".into())
        );
        assert_eq!(
            classify_status(429, "x"),
            StatusOutcome::RateLimited(429, "x".into())
        );
        assert_eq!(
            classify_status(422, "bad field"),
            StatusOutcome::InvalidPayload(422, "bad field".into())
        );
        assert_eq!(
            classify_status(418, "teapot"),
            StatusOutcome::InvalidPayload(418, "teapot".into())
        );
        assert_eq!(classify_status(200, "ok"), StatusOutcome::Success);
        assert_eq!(
            classify_status(302, "moved"),
            StatusOutcome::UnexpectedStatus(302, "moved".into())
        );
        assert_eq!(
            classify_status(204, ""),
            StatusOutcome::UnexpectedStatus(204, String::new())
        );
    }

    #[test]
    fn not_found_error_names_the_model() {
        let err = classify_status(404, "{}")
            .into_result("google/flan-t5-xl")
            .unwrap_err();
        match err {
            LlmError::NotFound(msg) => assert!(msg.contains("google/flan-t5-xl")),
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn invalid_payload_error_carries_body() {
        let err = classify_status(422, r#"{"detail":"bad temperature"}"#)
            .into_result("m")
            .unwrap_err();
        match err {
            LlmError::InvalidInput(msg) => assert!(msg.contains("bad temperature")),
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn auth_outcomes_map_to_authentication_error() {
        assert!(matches!(
            classify_status(401, "").into_result("m").unwrap_err(),
            LlmError::AuthenticationError(_)
        ));
        assert!(matches!(
            classify_status(403, "").into_result("m").unwrap_err(),
            LlmError::AuthenticationError(_)
        ));
    }

    #[test]
    fn retryable_labels() {
        assert!(
            LlmError::ServerError {
                code: 500,
                message: String::new()
            }
            .is_retryable()
        );
        assert!(LlmError::RateLimitError("".into()).is_retryable());
        assert!(!LlmError::NotFound("m".into()).is_retryable());
        assert!(!LlmError::InvalidInput("".into()).is_retryable());
    }

    #[test]
    fn from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: LlmError = json_err.into();
        assert!(matches!(err, LlmError::JsonError(_)));
    }
}
