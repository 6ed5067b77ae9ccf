//! The outward text-completion contract.

use async_trait::async_trait;

use crate::client::DeepInfraClient;
use crate::error::LlmError;
use crate::types::{CompletionRequest, IdentifyingParams, TokenIterator, TokenObserver, TokenStream};

/// Narrow capability interface a text-completion backend exposes to generic
/// callers: one blocking and one async entry point for each delivery mode,
/// plus identifying parameters.
///
/// Streaming entry points accept an optional per-chunk observer which is
/// invoked with each chunk's text before the chunk reaches the caller;
/// observer errors propagate and end the stream.
#[async_trait]
pub trait TextCompletionModel: Send + Sync {
    /// Stable provider identifier.
    fn provider_id(&self) -> &'static str;

    /// Parameters identifying this configured endpoint.
    fn identifying_params(&self) -> IdentifyingParams;

    /// Blocking single-shot completion.
    fn complete_blocking(&self, request: &CompletionRequest) -> Result<String, LlmError>;

    /// Blocking streaming completion.
    fn complete_stream_blocking(
        &self,
        request: &CompletionRequest,
        observer: Option<TokenObserver>,
    ) -> Result<TokenIterator, LlmError>;

    /// Async single-shot completion.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;

    /// Async streaming completion.
    async fn complete_stream(
        &self,
        request: &CompletionRequest,
        observer: Option<TokenObserver>,
    ) -> Result<TokenStream, LlmError>;
}

#[async_trait]
impl TextCompletionModel for DeepInfraClient {
    fn provider_id(&self) -> &'static str {
        "deepinfra"
    }

    fn identifying_params(&self) -> IdentifyingParams {
        self.config().identifying_params()
    }

    fn complete_blocking(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        DeepInfraClient::complete_blocking(self, request)
    }

    fn complete_stream_blocking(
        &self,
        request: &CompletionRequest,
        observer: Option<TokenObserver>,
    ) -> Result<TokenIterator, LlmError> {
        DeepInfraClient::complete_stream_blocking(self, request, observer)
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        DeepInfraClient::complete(self, request).await
    }

    async fn complete_stream(
        &self,
        request: &CompletionRequest,
        observer: Option<TokenObserver>,
    ) -> Result<TokenStream, LlmError> {
        DeepInfraClient::complete_stream(self, request, observer).await
    }
}
