//! Document chunking.
//!
//! This module provides the [`Chunker`] trait, the [`split_text_into_chunks`]
//! sliding-window slicer, and [`FixedSizeChunker`] which applies it to
//! [`Document`]s.

use crate::document::{Chunk, Document};

/// Default window length in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default number of characters shared by consecutive windows.
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with text but no embeddings.
/// Embeddings are attached later by the pipeline.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has empty text.
    /// Each returned chunk has an empty embedding vector.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Split `text` into fixed-size windows of `chunk_size` characters, each
/// starting `chunk_size - overlap` characters after the previous one.
///
/// Positions are counted in `char`s, so a window never splits a code point,
/// but it may split a word or sentence. The last window is clipped to the end
/// of the text and can be shorter than `overlap`. If the step would be zero
/// (`overlap >= chunk_size`) only the first window is returned.
///
/// # Example
///
/// ```rust
/// use docqa_rag::split_text_into_chunks;
///
/// let chunks = split_text_into_chunks("abcdefghij", 4, 1);
/// assert_eq!(chunks, ["abcd", "defg", "ghij", "j"]);
/// ```
pub fn split_text_into_chunks(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    if text.is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    // Byte offset of every char start, plus the end of the string.
    let offsets: Vec<usize> =
        text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
    let char_len = offsets.len() - 1;
    let step = chunk_size.saturating_sub(overlap);

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < char_len {
        let end = (start + chunk_size).min(char_len);
        chunks.push(text[offsets[start]..offsets[end]].to_string());
        if step == 0 {
            break;
        }
        start += step;
    }

    chunks
}

/// Splits text into fixed-size chunks by character count with configurable overlap.
///
/// Chunk IDs are generated as `{document_id}_chunk_{chunk_index}`.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::FixedSizeChunker;
///
/// let chunker = FixedSizeChunker::new(1000, 50);
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` - maximum number of characters per chunk
    /// * `chunk_overlap` - number of overlapping characters between consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }
}

impl Default for FixedSizeChunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        split_text_into_chunks(&document.text, self.chunk_size, self.chunk_overlap)
            .into_iter()
            .enumerate()
            .map(|(chunk_index, text)| Chunk {
                id: Chunk::make_id(&document.id, chunk_index),
                text,
                embedding: Vec::new(),
                document_id: document.id.clone(),
                chunk_index,
            })
            .collect()
    }
}
