//! DeepInfra request execution: the four call modes.
//!
//! A call is either blocking (the calling thread is occupied for the full
//! round trip) or async (suspends at each I/O boundary), and either
//! single-shot (returns the final text) or streaming (yields token chunks
//! as they arrive). Each call owns its request and response exclusively;
//! nothing is shared across calls beyond the connection pool inside
//! [`reqwest::Client`]. Dropping a returned iterator or stream drops the
//! underlying response and closes the connection.

use std::io::{BufRead, BufReader, Read};

use async_stream::try_stream;
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde_json::{Map, Value};
use tracing::debug;

use crate::builder::DeepInfraBuilder;
use crate::config::DeepInfraConfig;
use crate::error::{LlmError, classify_status};
use crate::sse::{SseLineReader, interpret_data_line};
use crate::types::{
    CompletionRequest, TokenChunk, TokenIterator, TokenObserver, TokenStream,
};

/// Client for the DeepInfra text-generation inference API.
#[derive(Debug, Clone)]
pub struct DeepInfraClient {
    config: DeepInfraConfig,
    http_client: reqwest::Client,
}

impl DeepInfraClient {
    /// Start building a client.
    pub fn builder() -> DeepInfraBuilder {
        DeepInfraBuilder::new()
    }

    /// Create a client from a configuration and a prebuilt async HTTP
    /// client. The configuration is assumed validated.
    pub fn with_http_client(config: DeepInfraConfig, http_client: reqwest::Client) -> Self {
        Self {
            config,
            http_client,
        }
    }

    /// The client configuration.
    pub fn config(&self) -> &DeepInfraConfig {
        &self.config
    }

    fn headers(&self) -> Result<HeaderMap, LlmError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut auth =
            HeaderValue::from_str(&format!("bearer {}", self.config.api_key.expose_secret()))
                .map_err(|e| LlmError::ConfigurationError(format!("invalid API key: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        Ok(headers)
    }

    /// Request body: `input`, configured parameters overlaid by call-time
    /// overrides (call-time wins), plus `stream` for streaming modes.
    ///
    /// `request.stop` is intentionally not serialized; the API has no
    /// stop-sequence support.
    fn request_body(&self, request: &CompletionRequest, streaming: bool) -> Value {
        let mut body = Map::new();
        body.insert("input".to_string(), Value::String(request.prompt.clone()));
        for (key, value) in self.config.merged_params(&request.overrides) {
            body.insert(key, value);
        }
        if streaming {
            body.insert("stream".to_string(), Value::Bool(true));
        }
        Value::Object(body)
    }

    /// Blocking transport, built per call from the configured timeouts.
    fn blocking_client(&self) -> Result<reqwest::blocking::Client, LlmError> {
        let mut builder = reqwest::blocking::Client::builder().timeout(self.config.timeout);
        if let Some(timeout) = self.config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        builder
            .build()
            .map_err(|e| LlmError::ConfigurationError(format!("failed to build HTTP client: {e}")))
    }

    /// Blocking single-shot completion; returns the generated text.
    ///
    /// Occupies the calling thread for the full round trip. Must not be
    /// invoked from inside an async runtime; use [`complete`](Self::complete)
    /// there.
    pub fn complete_blocking(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let url = self.config.inference_url();
        debug!(model = %self.config.model_id, %url, "dispatching blocking completion");

        let response = self
            .blocking_client()?
            .post(&url)
            .headers(self.headers()?)
            .json(&self.request_body(request, false))
            .send()?;
        let status = response.status().as_u16();
        let text = response.text()?;

        classify_status(status, &text).into_result(&self.config.model_id)?;
        extract_generated_text(&text)
    }

    /// Async single-shot completion; returns the generated text.
    pub async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let url = self.config.inference_url();
        debug!(model = %self.config.model_id, %url, "dispatching completion");

        let response = self
            .http_client
            .post(&url)
            .headers(self.headers()?)
            .json(&self.request_body(request, false))
            .send()
            .await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        classify_status(status, &text).into_result(&self.config.model_id)?;
        extract_generated_text(&text)
    }

    /// Blocking streaming completion; yields token chunks lazily.
    ///
    /// The observer, when present, sees each chunk's text before the chunk
    /// is handed back; an observer error ends the iteration and propagates.
    pub fn complete_stream_blocking(
        &self,
        request: &CompletionRequest,
        observer: Option<TokenObserver>,
    ) -> Result<TokenIterator, LlmError> {
        let url = self.config.inference_url();
        debug!(model = %self.config.model_id, %url, "dispatching blocking streaming completion");

        let response = self
            .blocking_client()?
            .post(&url)
            .headers(self.headers()?)
            .json(&self.request_body(request, true))
            .send()?;
        let status = response.status().as_u16();
        let mut reader = BufReader::new(response);

        // The API embeds error payloads in HTTP 200 responses as a single
        // small JSON document. Inspect the first body line before status
        // classification, and before any chunk is yielded.
        let mut first = String::new();
        reader
            .read_line(&mut first)
            .map_err(|e| LlmError::HttpError(format!("failed to read response body: {e}")))?;
        if first.contains("error") {
            let mut rest = String::new();
            let _ = reader.read_to_string(&mut rest);
            first.push_str(&rest);
            return Err(LlmError::ProviderError(first.trim_end().to_string()));
        }
        classify_status(status, first.trim_end()).into_result(&self.config.model_id)?;

        let lines = SseLineReader::new(std::io::Cursor::new(first.into_bytes()).chain(reader));
        Ok(Box::new(ChunkIter {
            lines,
            observer,
            done: false,
        }))
    }

    /// Async streaming completion; yields token chunks as a [`TokenStream`].
    ///
    /// Same observer contract as the blocking variant. Dropping the stream
    /// closes the connection.
    pub async fn complete_stream(
        &self,
        request: &CompletionRequest,
        observer: Option<TokenObserver>,
    ) -> Result<TokenStream, LlmError> {
        let url = self.config.inference_url();
        debug!(model = %self.config.model_id, %url, "dispatching streaming completion");

        let response = self
            .http_client
            .post(&url)
            .headers(self.headers()?)
            .json(&self.request_body(request, true))
            .send()
            .await?;
        let status = response.status().as_u16();
        let mut bytes = response.bytes_stream();

        // Same embedded-error precheck as the blocking path, on the first
        // transport chunk.
        let first = match bytes.next().await {
            Some(Ok(chunk)) => chunk,
            Some(Err(e)) => return Err(LlmError::HttpError(format!("stream error: {e}"))),
            None => Default::default(),
        };
        {
            let preview = String::from_utf8_lossy(&first);
            if preview.contains("error") {
                return Err(LlmError::ProviderError(preview.trim_end().to_string()));
            }
            classify_status(status, preview.trim_end()).into_result(&self.config.model_id)?;
        }

        let events = futures_util::stream::iter(std::iter::once(Ok(first)))
            .chain(bytes)
            .eventsource();

        let stream = try_stream! {
            futures_util::pin_mut!(events);
            while let Some(event) = events.next().await {
                let event = event
                    .map_err(|e| LlmError::StreamError(format!("SSE parsing error: {e}")))?;
                // End of data, not of the stream: keep draining so the
                // connection closes with the transport.
                if event.data.trim() == "[DONE]" {
                    continue;
                }
                if let Some(chunk) = interpret_data_line(&event.data) {
                    if let Some(ref observer) = observer {
                        observer(chunk.text.as_deref().unwrap_or(""))?;
                    }
                    yield chunk;
                }
            }
        };
        Ok(Box::pin(stream))
    }
}

/// Pull `results[0].generated_text` out of a single-shot response body.
fn extract_generated_text(body: &str) -> Result<String, LlmError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| LlmError::ParseError(format!("invalid JSON body: {e}")))?;
    value
        .get("results")
        .and_then(|results| results.get(0))
        .and_then(|result| result.get("generated_text"))
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| {
            LlmError::ParseError("missing results[0].generated_text in response".to_string())
        })
}

/// Blocking chunk iterator: decoded lines in, interpreted chunks out, with
/// the observer notified before each chunk is returned. Fuses after the
/// first error.
struct ChunkIter<I> {
    lines: I,
    observer: Option<TokenObserver>,
    done: bool,
}

impl<I> Iterator for ChunkIter<I>
where
    I: Iterator<Item = Result<String, LlmError>>,
{
    type Item = Result<TokenChunk, LlmError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self.lines.next()? {
                Ok(data) => {
                    // Undecodable lines yield no chunk; the stream continues.
                    let Some(chunk) = interpret_data_line(&data) else {
                        continue;
                    };
                    if let Some(ref observer) = self.observer {
                        if let Err(e) = observer(chunk.text.as_deref().unwrap_or("")) {
                            self.done = true;
                            return Some(Err(e));
                        }
                    }
                    return Some(Ok(chunk));
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use serde_json::json;

    fn test_client() -> DeepInfraClient {
        let config = DeepInfraConfig {
            model_id: "google/flan-t5-xl".to_string(),
            api_key: SecretString::from("test-key".to_string()),
            ..DeepInfraConfig::default()
        };
        DeepInfraClient::with_http_client(config, reqwest::Client::new())
    }

    #[test]
    fn body_carries_input_and_merged_params() {
        let mut client = test_client();
        client
            .config
            .model_params
            .insert("temperature".into(), json!(0.7));

        let request = CompletionRequest::new("Tell me a joke.")
            .with_param("temperature", json!(0.1))
            .with_param("max_new_tokens", json!(64));
        let body = client.request_body(&request, false);

        assert_eq!(body["input"], json!("Tell me a joke."));
        assert_eq!(body["temperature"], json!(0.1));
        assert_eq!(body["max_new_tokens"], json!(64));
        assert!(body.get("stream").is_none());
    }

    #[test]
    fn body_sets_stream_flag_only_for_streaming() {
        let client = test_client();
        let request = CompletionRequest::new("hi");

        assert!(client.request_body(&request, false).get("stream").is_none());
        assert_eq!(client.request_body(&request, true)["stream"], json!(true));
    }

    #[test]
    fn stop_sequences_are_never_serialized() {
        let client = test_client();
        let request = CompletionRequest::new("hi").with_stop(vec!["###".into()]);
        let body = client.request_body(&request, true);
        assert!(body.get("stop").is_none());
        assert!(!body.to_string().contains("###"));
    }

    #[test]
    fn extract_generated_text_happy_path() {
        let body = r#"{"results":[{"generated_text":"hello"}]}"#;
        assert_eq!(extract_generated_text(body).unwrap(), "hello");
    }

    #[test]
    fn extract_generated_text_rejects_missing_path() {
        for body in [
            "{}",
            r#"{"results":[]}"#,
            r#"{"results":[{"text":"x"}]}"#,
            r#"{"results":[{"generated_text":42}]}"#,
        ] {
            assert!(matches!(
                extract_generated_text(body),
                Err(LlmError::ParseError(_))
            ));
        }
    }

    #[test]
    fn extract_generated_text_rejects_malformed_json() {
        assert!(matches!(
            extract_generated_text("{not json"),
            Err(LlmError::ParseError(_))
        ));
    }

    #[test]
    fn auth_header_is_bearer_and_sensitive() {
        let client = test_client();
        let headers = client.headers().unwrap();
        let auth = headers.get(AUTHORIZATION).unwrap();
        assert_eq!(auth.to_str().unwrap(), "bearer test-key");
        assert!(auth.is_sensitive());
    }
}
