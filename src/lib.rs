//! deepinfra
//!
//! Client for the DeepInfra hosted-model inference API, exposing the four
//! call modes a generic text-generation caller expects: blocking and async,
//! single-shot and incremental token streaming.
//!
//! The API key comes from the builder or from the `DEEPINFRA_API_TOKEN`
//! environment variable (the builder wins).
//!
//! ```rust,no_run
//! use deepinfra::{CompletionRequest, DeepInfraClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = DeepInfraClient::builder()
//!         .api_key("my-api-key")
//!         .model("google/flan-t5-xl")
//!         .build()?;
//!
//!     let text = client
//!         .complete(&CompletionRequest::new("Tell me a joke."))
//!         .await?;
//!     println!("{text}");
//!     Ok(())
//! }
//! ```
//!
//! Streaming delivers [`TokenChunk`]s as the server emits them:
//!
//! ```rust,no_run
//! use deepinfra::{CompletionRequest, DeepInfraClient};
//! use futures_util::StreamExt;
//!
//! # async fn demo(client: DeepInfraClient) -> Result<(), deepinfra::LlmError> {
//! let mut stream = client
//!     .complete_stream(&CompletionRequest::new("Count to ten."), None)
//!     .await?;
//! while let Some(chunk) = stream.next().await {
//!     if let Some(text) = chunk?.text {
//!         print!("{text}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```
#![deny(unsafe_code)]

pub mod builder;
pub mod client;
pub mod config;
pub mod error;
mod sse;
pub mod traits;
pub mod types;

pub use builder::DeepInfraBuilder;
pub use client::DeepInfraClient;
pub use config::{DEFAULT_BASE_URL, DEFAULT_MODEL_ID, DeepInfraConfig};
pub use error::{LlmError, StatusOutcome, classify_status};
pub use traits::TextCompletionModel;
pub use types::{
    CompletionRequest, IdentifyingParams, TokenChunk, TokenIterator, TokenObserver, TokenStream,
};
