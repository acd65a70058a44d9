//! Chat model trait for answer synthesis.

use async_trait::async_trait;

use crate::error::ChatError;

/// A hosted chat model that turns a single user-role prompt into text.
///
/// Failures come back as a typed [`ChatError`] so callers can tell quota
/// exhaustion, transport failures, and bad responses apart.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// The model identifier (e.g. `gemini-1.5-flash`).
    fn name(&self) -> &str;

    /// Send `prompt` as one user message and return the raw completion text.
    async fn generate(&self, prompt: &str) -> std::result::Result<String, ChatError>;
}
