//! Deterministic embedding provider and chat model for tests and offline demos.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::chat::ChatModel;
use crate::embedding::EmbeddingProvider;
use crate::error::{ChatError, RagError, Result};

/// Hash-seeded embeddings: identical text always maps to the identical
/// L2-normalised vector, different text almost always to a different one.
pub struct HashEmbeddingProvider {
    dimensions: usize,
    reported_dimensions: Option<usize>,
    calls: AtomicUsize,
    fail_on_call: Option<usize>,
}

impl HashEmbeddingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            reported_dimensions: None,
            calls: AtomicUsize::new(0),
            fail_on_call: None,
        }
    }

    /// Report `n` from [`dimensions`](EmbeddingProvider::dimensions) while
    /// still returning vectors of the constructed size.
    pub fn reporting_dimensions(mut self, n: usize) -> Self {
        self.reported_dimensions = Some(n);
        self
    }

    /// Make the `n`-th call to [`embed`](EmbeddingProvider::embed) (1-based) fail.
    pub fn failing_on_call(mut self, n: usize) -> Self {
        self.fail_on_call = Some(n);
        self
    }

    /// Number of `embed` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The vector this provider returns for `text`.
    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let mut emb = vec![0.0f32; self.dimensions];
        for (i, v) in emb.iter_mut().enumerate() {
            // splitmix64 finaliser, top 24 bits mapped onto [-1, 1)
            let mut z = hash ^ (i as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
            z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
            z ^= z >> 31;
            *v = (z >> 40) as f32 / (1u64 << 23) as f32 - 1.0;
        }
        let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            emb.iter_mut().for_each(|x| *x /= norm);
        }
        emb
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbeddingProvider {
    fn name(&self) -> &str {
        "Hash"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_call == Some(call) {
            return Err(RagError::EmbeddingError {
                provider: "Hash".into(),
                message: format!("scripted failure on call {call}"),
            });
        }
        Ok(self.vector_for(text))
    }

    fn dimensions(&self) -> usize {
        self.reported_dimensions.unwrap_or(self.dimensions)
    }
}

/// A chat model that replays one scripted outcome and records every prompt.
pub struct MockChatModel {
    reply: std::result::Result<String, ChatError>,
    prompts: Mutex<Vec<String>>,
}

impl MockChatModel {
    pub fn replying(text: impl Into<String>) -> Self {
        Self { reply: Ok(text.into()), prompts: Mutex::new(Vec::new()) }
    }

    pub fn failing(error: ChatError) -> Self {
        Self { reply: Err(error), prompts: Mutex::new(Vec::new()) }
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    fn name(&self) -> &str {
        "mock-chat"
    }

    async fn generate(&self, prompt: &str) -> std::result::Result<String, ChatError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.reply.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_text_same_vector() {
        let provider = HashEmbeddingProvider::new(16);
        let a = provider.embed("starship").await.unwrap();
        let b = provider.embed("starship").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
        assert_eq!(provider.calls(), 2);
    }

    #[test]
    fn different_text_different_direction() {
        let provider = HashEmbeddingProvider::new(32);
        let a = provider.vector_for("rocket launch");
        let b = provider.vector_for("stock market");
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
        assert!(crate::similarity::cosine_similarity(&a, &b) < 0.9);
    }

    #[tokio::test]
    async fn scripted_failure_hits_the_right_call() {
        let provider = HashEmbeddingProvider::new(4).failing_on_call(2);
        assert!(provider.embed("a").await.is_ok());
        assert!(provider.embed("b").await.is_err());
        assert!(provider.embed("c").await.is_ok());
    }
}
