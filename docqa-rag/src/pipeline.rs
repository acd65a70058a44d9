//! RAG pipeline orchestrator.
//!
//! The [`RagPipeline`] coordinates the ingest-and-query workflow by composing
//! an [`EmbeddingProvider`], a [`VectorStore`], and a [`Chunker`].
//!
//! # Example
//!
//! ```rust,ignore
//! use docqa_rag::{RagPipeline, RagConfig, InMemoryVectorStore, FixedSizeChunker};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .chunker(Arc::new(FixedSizeChunker::new(1000, 50)))
//!     .build()?;
//!
//! pipeline.create_collection("docs").await?;
//! pipeline.ingest("docs", &documents).await?;
//! let results = pipeline.query("docs", "search query", 5).await?;
//! ```

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info};

use crate::chunking::Chunker;
use crate::config::RagConfig;
use crate::document::{Chunk, Document, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::loader::load_documents_from_directory;
use crate::vectorstore::VectorStore;

/// The RAG pipeline orchestrator.
///
/// Coordinates document ingestion (chunk → embed → store) and query
/// execution (embed → search → filter). Construct one via
/// [`RagPipeline::builder()`].
pub struct RagPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    chunker: Arc<dyn Chunker>,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Create a named collection in the vector store.
    ///
    /// The collection is created with the dimensionality reported by the
    /// configured [`EmbeddingProvider`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] if the vector store operation fails.
    pub async fn create_collection(&self, name: &str) -> Result<()> {
        let dimensions = self.embedding_provider.dimensions();
        self.vector_store.create_collection(name, dimensions).await.map_err(|e| {
            error!(collection = name, error = %e, "failed to create collection");
            RagError::PipelineError(format!("failed to create collection '{name}': {e}"))
        })
    }

    /// Delete a named collection from the vector store.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] if the vector store operation fails.
    pub async fn delete_collection(&self, name: &str) -> Result<()> {
        self.vector_store.delete_collection(name).await.map_err(|e| {
            error!(collection = name, error = %e, "failed to delete collection");
            RagError::PipelineError(format!("failed to delete collection '{name}': {e}"))
        })
    }

    /// Split every document into chunks, in document order.
    pub fn chunk_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        let mut all_chunks = Vec::new();
        for document in documents {
            let chunks = self.chunker.chunk(document);
            info!(document.id = %document.id, chunk_count = chunks.len(), "split document");
            all_chunks.extend(chunks);
        }
        all_chunks
    }

    /// Ingest documents: chunk all of them, embed every chunk, then upsert.
    ///
    /// Each chunk is embedded with its own single-text request and stored
    /// with its own upsert. The first failure aborts the run; chunks already
    /// upserted stay in the store.
    ///
    /// Returns the chunks that were stored (with embeddings attached).
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] if embedding or storage fails,
    /// including the chunk ID in the error message.
    pub async fn ingest(&self, collection: &str, documents: &[Document]) -> Result<Vec<Chunk>> {
        let mut chunks = self.chunk_documents(documents);
        if chunks.is_empty() {
            info!(collection, chunk_count = 0, "nothing to ingest");
            return Ok(chunks);
        }

        for chunk in chunks.iter_mut() {
            let embedding = self.embedding_provider.embed(&chunk.text).await.map_err(|e| {
                error!(chunk.id = %chunk.id, error = %e, "embedding failed during ingestion");
                RagError::PipelineError(format!("embedding failed for chunk '{}': {e}", chunk.id))
            })?;
            chunk.embedding = embedding;
        }
        info!(
            provider = self.embedding_provider.name(),
            chunk_count = chunks.len(),
            "generated embeddings"
        );

        for chunk in &chunks {
            self.vector_store.upsert(collection, std::slice::from_ref(chunk)).await.map_err(
                |e| {
                    error!(chunk.id = %chunk.id, error = %e, "upsert failed during ingestion");
                    RagError::PipelineError(format!("upsert failed for chunk '{}': {e}", chunk.id))
                },
            )?;
        }

        info!(
            collection,
            document_count = documents.len(),
            chunk_count = chunks.len(),
            "ingested documents"
        );
        Ok(chunks)
    }

    /// Load every matching file in `dir` and [`ingest`](Self::ingest) it.
    pub async fn ingest_directory(
        &self,
        collection: &str,
        dir: impl AsRef<Path>,
        extensions: &[&str],
    ) -> Result<Vec<Chunk>> {
        let documents = load_documents_from_directory(dir, extensions)?;
        self.ingest(collection, &documents).await
    }

    /// Query the pipeline: embed → search → filter by threshold.
    ///
    /// The question is embedded with the same provider used for ingestion.
    /// Returns at most `top_k` results ordered by descending relevance score.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] if embedding or search fails.
    pub async fn query(
        &self,
        collection: &str,
        question: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedding_provider.embed(question).await.map_err(|e| {
            error!(error = %e, "embedding failed during query");
            RagError::PipelineError(format!("query embedding failed: {e}"))
        })?;

        let results =
            self.vector_store.search(collection, &query_embedding, top_k).await.map_err(|e| {
                error!(collection, error = %e, "vector store search failed");
                RagError::PipelineError(format!("search failed in collection '{collection}': {e}"))
            })?;

        let filtered: Vec<SearchResult> = match self.config.similarity_threshold {
            Some(threshold) => results.into_iter().filter(|r| r.score >= threshold).collect(),
            None => results,
        };

        info!(collection, result_count = filtered.len(), "query completed");
        Ok(filtered)
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// All fields are required. Call [`build()`](RagPipelineBuilder::build)
/// to validate and produce the pipeline.
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`RagPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if any required field is missing or
    /// the config is invalid.
    pub fn build(self) -> Result<RagPipeline> {
        let config =
            self.config.ok_or_else(|| RagError::ConfigError("config is required".to_string()))?;
        config.validate()?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;
        let chunker =
            self.chunker.ok_or_else(|| RagError::ConfigError("chunker is required".to_string()))?;

        Ok(RagPipeline { config, embedding_provider, vector_store, chunker })
    }
}
