//! Wiring [`Settings`] into concrete providers and a [`DocumentQa`].

use std::sync::Arc;

use tracing::info;

use crate::chat::ChatModel;
use crate::chunking::FixedSizeChunker;
use crate::config::{Provider, Settings};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::pipeline::RagPipeline;
use crate::qa::DocumentQa;
use crate::vectorstore::VectorStore;

#[allow(dead_code)]
fn feature_disabled(provider: Provider) -> RagError {
    let feature = match provider {
        Provider::Google => "gemini",
        Provider::OpenAI => "openai",
    };
    RagError::ConfigError(format!(
        "provider '{provider}' requires docqa-rag to be built with the '{feature}' feature"
    ))
}

/// The embedding provider selected by `settings`.
pub fn embedding_provider(settings: &Settings) -> Result<Arc<dyn EmbeddingProvider>> {
    let api_key = settings.require_api_key()?;
    match settings.provider {
        #[cfg(feature = "gemini")]
        Provider::Google => Ok(Arc::new(
            crate::gemini::GeminiEmbeddingProvider::new(api_key)?
                .with_model(&settings.embedding_model),
        )),
        #[cfg(feature = "openai")]
        Provider::OpenAI => Ok(Arc::new(
            crate::openai::OpenAIEmbeddingProvider::new(api_key)?
                .with_model(&settings.embedding_model),
        )),
        #[allow(unreachable_patterns)]
        other => Err(feature_disabled(other)),
    }
}

/// The chat model selected by `settings`.
pub fn chat_model(settings: &Settings) -> Result<Arc<dyn ChatModel>> {
    let api_key = settings.require_api_key()?;
    match settings.provider {
        #[cfg(feature = "gemini")]
        Provider::Google => {
            Ok(Arc::new(crate::gemini::GeminiChatModel::new(api_key, &settings.chat_model)))
        }
        #[cfg(feature = "openai")]
        Provider::OpenAI => {
            Ok(Arc::new(crate::openai::OpenAIChatModel::new(api_key, &settings.chat_model)))
        }
        #[allow(unreachable_patterns)]
        other => Err(feature_disabled(other)),
    }
}

/// Open the persistent store at `settings.vector_db_path`.
#[cfg(feature = "sqlite")]
pub async fn open_vector_store(settings: &Settings) -> Result<Arc<dyn VectorStore>> {
    let store = crate::sqlite::SqliteVectorStore::open(&settings.vector_db_path).await?;
    Ok(Arc::new(store))
}

/// Assemble a [`DocumentQa`] around an already-opened vector store.
pub fn document_qa_with_store(
    settings: &Settings,
    vector_store: Arc<dyn VectorStore>,
) -> Result<DocumentQa> {
    settings.validate()?;

    let pipeline = RagPipeline::builder()
        .config(settings.rag.clone())
        .embedding_provider(embedding_provider(settings)?)
        .vector_store(vector_store)
        .chunker(Arc::new(FixedSizeChunker::new(
            settings.rag.chunk_size,
            settings.rag.chunk_overlap,
        )))
        .build()?;

    info!(
        provider = %settings.provider,
        embedding_model = %settings.embedding_model,
        chat_model = %settings.chat_model,
        collection = %settings.collection,
        "document QA ready"
    );

    Ok(DocumentQa::new(Arc::new(pipeline), chat_model(settings)?, settings.collection.clone()))
}

/// Validate `settings`, open the persistent store, and assemble a [`DocumentQa`].
///
/// # Errors
///
/// Returns [`RagError::ConfigError`] before any I/O if the API key is missing.
#[cfg(feature = "sqlite")]
pub async fn document_qa(settings: &Settings) -> Result<DocumentQa> {
    settings.validate()?;
    let store = open_vector_store(settings).await?;
    document_qa_with_store(settings, store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inmemory::InMemoryVectorStore;

    #[test]
    fn missing_key_fails_before_building_anything() {
        let settings = Settings::new(Provider::Google);
        let err = document_qa_with_store(&settings, Arc::new(InMemoryVectorStore::new()))
            .err()
            .unwrap();
        assert!(err.to_string().contains("GOOGLE_API_KEY"));
    }

    #[cfg(all(feature = "gemini", feature = "openai"))]
    #[test]
    fn providers_follow_settings() {
        let google = Settings::new(Provider::Google).with_api_key("g-key");
        assert_eq!(embedding_provider(&google).unwrap().name(), "Gemini");
        assert_eq!(embedding_provider(&google).unwrap().dimensions(), 768);
        assert_eq!(chat_model(&google).unwrap().name(), "gemini-1.5-flash");

        let openai = Settings::new(Provider::OpenAI).with_api_key("sk-key");
        assert_eq!(embedding_provider(&openai).unwrap().name(), "OpenAI");
        assert_eq!(chat_model(&openai).unwrap().name(), "gpt-3.5-turbo");
    }

    #[cfg(all(feature = "gemini", feature = "openai"))]
    #[test]
    fn embedding_model_override_carries_its_size() {
        let mut openai = Settings::new(Provider::OpenAI).with_api_key("sk-key");
        openai.embedding_model = "text-embedding-3-large".to_string();
        assert_eq!(embedding_provider(&openai).unwrap().dimensions(), 3072);

        let mut google = Settings::new(Provider::Google).with_api_key("g-key");
        google.embedding_model = "models/gemini-embedding-001".to_string();
        assert_eq!(embedding_provider(&google).unwrap().dimensions(), 3072);
    }

    #[cfg(feature = "gemini")]
    #[test]
    fn invalid_chunking_is_rejected_at_assembly() {
        let mut settings = Settings::new(Provider::Google).with_api_key("g-key");
        settings.rag.chunk_overlap = settings.rag.chunk_size;
        assert!(document_qa_with_store(&settings, Arc::new(InMemoryVectorStore::new())).is_err());
    }
}
