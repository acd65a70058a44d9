//! Configuration for the RAG pipeline and the question-answering run.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::chunking::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::error::{RagError, Result};

/// Default number of chunks retrieved per question.
pub const DEFAULT_TOP_K: usize = 5;

/// Default collection name.
pub const DEFAULT_COLLECTION: &str = "document_qa_collection";

/// Default directory scanned for documents.
pub const DEFAULT_DOCUMENTS_DIR: &str = "./news_articles";

/// Default directory holding the persistent vector store.
pub const DEFAULT_VECTOR_DB_PATH: &str = "./vector_db";

/// Configuration parameters for the RAG pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of top results to return from vector search.
    pub top_k: usize,
    /// Minimum similarity score for results. `None` keeps everything the store returns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_threshold: Option<f32>,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            top_k: DEFAULT_TOP_K,
            similarity_threshold: None,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Check the invariants enforced by [`RagConfigBuilder::build`].
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of top results to return from vector search.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the minimum similarity threshold for filtering results.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = Some(threshold);
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// The hosted API family used for both embeddings and chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Google,
    OpenAI,
}

impl Provider {
    /// Environment variable holding this provider's API key.
    pub fn api_key_var(self) -> &'static str {
        match self {
            Provider::Google => "GOOGLE_API_KEY",
            Provider::OpenAI => "OPENAI_API_KEY",
        }
    }

    pub fn default_embedding_model(self) -> &'static str {
        match self {
            Provider::Google => "models/embedding-001",
            Provider::OpenAI => "text-embedding-3-small",
        }
    }

    pub fn default_chat_model(self) -> &'static str {
        match self {
            Provider::Google => "gemini-1.5-flash",
            Provider::OpenAI => "gpt-3.5-turbo",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Google => f.write_str("google"),
            Provider::OpenAI => f.write_str("openai"),
        }
    }
}

impl FromStr for Provider {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" | "gemini" => Ok(Provider::Google),
            "openai" => Ok(Provider::OpenAI),
            other => Err(RagError::ConfigError(format!(
                "unknown provider '{other}' (expected 'google' or 'openai')"
            ))),
        }
    }
}

/// Everything a question-answering run needs, resolved once at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    pub provider: Provider,
    /// Secret for `provider`. Never serialized.
    #[serde(skip)]
    pub api_key: Option<String>,
    pub embedding_model: String,
    pub chat_model: String,
    pub documents_dir: PathBuf,
    pub vector_db_path: PathBuf,
    pub collection: String,
    pub rag: RagConfig,
}

impl Settings {
    /// Defaults for `provider` with no API key set.
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            api_key: None,
            embedding_model: provider.default_embedding_model().to_string(),
            chat_model: provider.default_chat_model().to_string(),
            documents_dir: PathBuf::from(DEFAULT_DOCUMENTS_DIR),
            vector_db_path: PathBuf::from(DEFAULT_VECTOR_DB_PATH),
            collection: DEFAULT_COLLECTION.to_string(),
            rag: RagConfig::default(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// The API key, or a configuration error naming the variable to set.
    pub fn require_api_key(&self) -> Result<&str> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(RagError::ConfigError(format!(
                "{} environment variable not set.",
                self.provider.api_key_var()
            ))),
        }
    }

    /// Fail fast on anything that would only break later in the run.
    pub fn validate(&self) -> Result<()> {
        self.require_api_key()?;
        if self.collection.trim().is_empty() {
            return Err(RagError::ConfigError("collection name must not be empty".to_string()));
        }
        self.rag.validate()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(Provider::default())
    }
}
