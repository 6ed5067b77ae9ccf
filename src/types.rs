//! Request and streaming types shared across call modes.

use std::pin::Pin;
use std::sync::Arc;

use futures::Stream;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::LlmError;

/// One incremental unit of generated text delivered during streaming.
///
/// The server may emit a token event without text; the chunk is still
/// delivered with `text` absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenChunk {
    /// Token text, when the event carried one.
    pub text: Option<String>,
}

/// A single completion call: prompt text, optional stop sequences, and
/// per-call parameter overrides.
///
/// `stop` is accepted for interface parity with other text-generation
/// backends but is not transmitted: the DeepInfra inference API has no
/// native stop-sequence support.
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    /// Prompt text, sent as the `input` field.
    pub prompt: String,
    /// Stop sequences; accepted but never serialized into the request.
    pub stop: Option<Vec<String>>,
    /// Per-call parameter overrides; these win over configured model
    /// parameters on key conflicts.
    pub overrides: Map<String, Value>,
}

impl CompletionRequest {
    /// Create a request for the given prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// Attach stop sequences (interface parity only; not transmitted).
    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Add one per-call parameter override.
    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.overrides.insert(key.into(), value);
        self
    }
}

/// Identifying parameters of a configured model endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentifyingParams {
    /// Model identifier, e.g. `google/flan-t5-xl`.
    pub model_id: String,
    /// Configured model parameters.
    pub model_params: Map<String, Value>,
}

/// Per-chunk observer invoked with each chunk's text (empty string when the
/// event carried none) before the chunk is handed to the caller. An error
/// return ends the stream and propagates to the caller.
pub type TokenObserver = Arc<dyn Fn(&str) -> Result<(), LlmError> + Send + Sync>;

/// Async token stream: a pinned, boxed [`Stream`] of chunk results.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<TokenChunk, LlmError>> + Send>>;

/// Blocking token iterator.
pub type TokenIterator = Box<dyn Iterator<Item = Result<TokenChunk, LlmError>> + Send>;
