//! Error types for the `docqa-rag` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in RAG operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A source directory could not be listed or a document could not be read.
    #[error("Failed to load documents from {}: {source}", path.display())]
    DocumentLoadError {
        /// The directory or file being read.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An error in the RAG pipeline orchestration.
    #[error("Pipeline error: {0}")]
    PipelineError(String),

    /// A chat model call failed.
    #[error(transparent)]
    Chat(#[from] ChatError),
}

/// Coarse classification of a [`ChatError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatErrorKind {
    Network,
    Quota,
    Api,
    MalformedResponse,
}

/// The failure of a single chat model call.
#[derive(Debug, Clone, Error)]
pub enum ChatError {
    /// The request never produced an HTTP response (DNS, TLS, timeout, reset).
    #[error("{provider} request failed: {message}")]
    Network { provider: String, message: String },

    /// The provider rejected the request for rate or quota reasons.
    #[error("{provider} quota exhausted: {message}")]
    Quota { provider: String, message: String },

    /// Any other non-success HTTP status.
    #[error("{provider} returned {status}: {message}")]
    Api { provider: String, status: u16, message: String },

    /// The response body could not be decoded or carried no text.
    #[error("{provider} returned a malformed response: {message}")]
    MalformedResponse { provider: String, message: String },
}

impl ChatError {
    pub fn kind(&self) -> ChatErrorKind {
        match self {
            ChatError::Network { .. } => ChatErrorKind::Network,
            ChatError::Quota { .. } => ChatErrorKind::Quota,
            ChatError::Api { .. } => ChatErrorKind::Api,
            ChatError::MalformedResponse { .. } => ChatErrorKind::MalformedResponse,
        }
    }

    pub fn provider(&self) -> &str {
        match self {
            ChatError::Network { provider, .. }
            | ChatError::Quota { provider, .. }
            | ChatError::Api { provider, .. }
            | ChatError::MalformedResponse { provider, .. } => provider,
        }
    }

    /// Classify a non-success HTTP status into a [`ChatError`].
    ///
    /// `429` is always a quota failure. Gemini also reports quota problems
    /// as `RESOURCE_EXHAUSTED` in the error body, sometimes with other codes.
    pub fn from_status(provider: &str, status: u16, detail: String) -> Self {
        if status == 429 || detail.contains("RESOURCE_EXHAUSTED") {
            ChatError::Quota { provider: provider.to_string(), message: detail }
        } else {
            ChatError::Api { provider: provider.to_string(), status, message: detail }
        }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_many_requests_is_quota() {
        let err = ChatError::from_status("OpenAI", 429, "rate limited".into());
        assert_eq!(err.kind(), ChatErrorKind::Quota);
        assert_eq!(err.provider(), "OpenAI");
    }

    #[test]
    fn resource_exhausted_body_is_quota() {
        let err = ChatError::from_status("Gemini", 403, "status: RESOURCE_EXHAUSTED".into());
        assert_eq!(err.kind(), ChatErrorKind::Quota);
    }

    #[test]
    fn other_status_is_api_error() {
        let err = ChatError::from_status("Gemini", 500, "internal".into());
        assert_eq!(err.kind(), ChatErrorKind::Api);
        assert_eq!(err.to_string(), "Gemini returned 500: internal");
    }
}
