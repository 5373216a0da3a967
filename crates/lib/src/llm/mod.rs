//! Completion service abstraction and the OpenAI-compatible client.
//!
//! The relay depends only on [`CompletionBackend`]; [`OpenAiClient`] is the production implementation.

mod openai;

use async_trait::async_trait;

pub use openai::{OpenAiClient, DEFAULT_BASE_URL, DEFAULT_MODEL};

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("completion api error: {0}")]
    Api(String),
    #[error("completion response had no message content")]
    EmptyResponse,
}

/// Produces one completion for a fully rendered prompt.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}
