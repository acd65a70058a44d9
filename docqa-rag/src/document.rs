//! Data types for documents, chunks, and search results.

use serde::{Deserialize, Serialize};

/// A source document read from disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document (the source file name).
    pub id: String,
    /// The full text content of the document.
    pub text: String,
    /// Optional path or URI pointing to the original source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<String>,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), source_uri: None }
    }
}

/// A window of a [`Document`] with its vector embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// `<document_id>_chunk_<index>`, unique within a run.
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// The vector embedding for this chunk's text. Empty until embedded.
    pub embedding: Vec<f32>,
    /// The ID of the parent [`Document`].
    pub document_id: String,
    /// Position of the chunk within its document, starting at 0.
    pub chunk_index: usize,
}

impl Chunk {
    /// Build the chunk id for a document and position.
    pub fn make_id(document_id: &str, chunk_index: usize) -> String {
        format!("{document_id}_chunk_{chunk_index}")
    }
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}
