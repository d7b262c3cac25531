//! Inference abstraction and OpenAI-compatible client.
//!
//! The dispatcher only needs a narrow chat-completion capability, so it talks
//! to the `ChatCompleter` trait and tests can substitute the backend.

mod openai;

pub use openai::{OpenAiClient, OpenAiError};

use async_trait::async_trait;

/// Narrow chat-completion capability: one system instruction, one user message,
/// one generated text back.
#[async_trait]
pub trait ChatCompleter: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, String>;
}
