//! # docqa-rag
//!
//! Retrieval-augmented question answering over a folder of text documents.
//!
//! ## Overview
//!
//! Documents are read from a directory, split into overlapping fixed-size
//! windows, embedded one chunk at a time, and upserted into a vector store.
//! A question is embedded with the same provider, the nearest chunks are
//! retrieved, and a hosted chat model answers from that context.
//!
//! - [`FixedSizeChunker`] / [`split_text_into_chunks`] - sliding-window chunking
//! - [`EmbeddingProvider`] - Gemini and OpenAI embeddings behind one trait
//! - [`ChatModel`] - Gemini and OpenAI chat behind one trait, typed [`ChatError`]s
//! - [`VectorStore`] - [`InMemoryVectorStore`] and the persistent `SqliteVectorStore`
//! - [`RagPipeline`] - chunk → embed → store, and embed → search
//! - [`DocumentQa`] - the per-run context object tying it all together
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docqa_rag::{Provider, Settings, setup};
//!
//! let settings = Settings::new(Provider::Google).with_api_key(std::env::var("GOOGLE_API_KEY")?);
//! let qa = setup::document_qa(&settings).await?;
//! qa.ingest_directory(&settings.documents_dir, docqa_rag::loader::DEFAULT_EXTENSIONS).await?;
//! let answer = qa.ask("Tell me about the SpaceX Starship launch.", 5).await?;
//! println!("{}", answer.text);
//! ```
//!
//! ## Features
//!
//! | Feature | Enables |
//! |---------|---------|
//! | `gemini` | `gemini::GeminiEmbeddingProvider`, `gemini::GeminiChatModel` |
//! | `openai` | `openai::OpenAIEmbeddingProvider`, `openai::OpenAIChatModel` |
//! | `sqlite` | `sqlite::SqliteVectorStore` |

pub mod chat;
pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod inmemory;
pub mod loader;
pub mod mock;
pub mod pipeline;
pub mod qa;
pub mod setup;
pub mod similarity;
pub mod vectorstore;

#[cfg(feature = "gemini")]
pub mod gemini;
#[cfg(feature = "openai")]
pub mod openai;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use chat::ChatModel;
pub use chunking::{Chunker, FixedSizeChunker, split_text_into_chunks};
pub use config::{Provider, RagConfig, RagConfigBuilder, Settings};
pub use document::{Chunk, Document, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{ChatError, ChatErrorKind, RagError, Result};
pub use inmemory::InMemoryVectorStore;
pub use loader::load_documents_from_directory;
pub use pipeline::{RagPipeline, RagPipelineBuilder};
pub use qa::{Answer, AnswerOutcome, DocumentQa, FALLBACK_ANSWER, build_prompt};
pub use vectorstore::VectorStore;

#[cfg(feature = "gemini")]
pub use gemini::{GeminiChatModel, GeminiEmbeddingProvider};
#[cfg(feature = "openai")]
pub use openai::{OpenAIChatModel, OpenAIEmbeddingProvider};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteVectorStore;
