//! In-memory vector store using cosine similarity.
//!
//! This module provides [`InMemoryVectorStore`], a vector store backed by a
//! `HashMap` protected by a `tokio::sync::RwLock`. Nothing survives the
//! process; it is suitable for tests and throwaway runs.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::similarity::{cosine_similarity, rank};
use crate::vectorstore::VectorStore;

/// An in-memory vector store using cosine similarity for search.
///
/// Collections are stored as nested `HashMap`s: collection name → chunk ID → chunk.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.create_collection("docs", 768).await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, HashMap<String, Chunk>>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a stored chunk by id.
    pub async fn get(&self, collection: &str, id: &str) -> Option<Chunk> {
        self.collections.read().await.get(collection).and_then(|c| c.get(id)).cloned()
    }
}

fn missing_collection(collection: &str) -> RagError {
    RagError::VectorStoreError {
        backend: "InMemory".to_string(),
        message: format!("collection '{collection}' does not exist"),
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn create_collection(&self, name: &str, _dimensions: usize) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.entry(name.to_string()).or_default();
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.remove(name);
        Ok(())
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| missing_collection(collection))?;
        for chunk in chunks {
            store.insert(chunk.id.clone(), chunk.clone());
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, ids: &[&str]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| missing_collection(collection))?;
        for id in ids {
            store.remove(*id);
        }
        Ok(())
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let collections = self.collections.read().await;
        collections.get(collection).map(HashMap::len).ok_or_else(|| missing_collection(collection))
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let collections = self.collections.read().await;
        let store = collections.get(collection).ok_or_else(|| missing_collection(collection))?;
        if let Some(stored) = store.values().find(|c| c.embedding.len() != embedding.len()) {
            return Err(RagError::VectorStoreError {
                backend: "InMemory".to_string(),
                message: format!(
                    "query has {} dimensions, chunk '{}' has {}",
                    embedding.len(),
                    stored.id,
                    stored.embedding.len()
                ),
            });
        }

        let scored: Vec<SearchResult> = store
            .values()
            .map(|chunk| {
                let score = cosine_similarity(&chunk.embedding, embedding);
                SearchResult { chunk: chunk.clone(), score }
            })
            .collect();

        Ok(rank(scored, top_k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, text: &str, embedding: Vec<f32>) -> Chunk {
        Chunk {
            id: id.to_string(),
            text: text.to_string(),
            embedding,
            document_id: "doc".to_string(),
            chunk_index: 0,
        }
    }

    #[tokio::test]
    async fn upsert_overwrites_existing_id() {
        let store = InMemoryVectorStore::new();
        store.create_collection("c", 2).await.unwrap();
        store.upsert("c", &[chunk("a", "old", vec![1.0, 0.0])]).await.unwrap();
        store.upsert("c", &[chunk("a", "new", vec![0.0, 1.0])]).await.unwrap();

        assert_eq!(store.count("c").await.unwrap(), 1);
        let stored = store.get("c", "a").await.unwrap();
        assert_eq!(stored.text, "new");
        assert_eq!(stored.embedding, vec![0.0, 1.0]);
    }

    #[tokio::test]
    async fn search_under_supply_returns_what_exists() {
        let store = InMemoryVectorStore::new();
        store.create_collection("c", 2).await.unwrap();
        store
            .upsert("c", &[chunk("a", "x", vec![1.0, 0.0]), chunk("b", "y", vec![0.0, 1.0])])
            .await
            .unwrap();

        let results = store.search("c", &[1.0, 0.1], 5).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.id, "a");
    }

    #[tokio::test]
    async fn missing_collection_is_an_error() {
        let store = InMemoryVectorStore::new();
        assert!(store.search("nope", &[1.0], 1).await.is_err());
        assert!(store.upsert("nope", &[]).await.is_err());
    }

    #[tokio::test]
    async fn delete_removes_ids() {
        let store = InMemoryVectorStore::new();
        store.create_collection("c", 2).await.unwrap();
        store.upsert("c", &[chunk("a", "x", vec![1.0, 0.0])]).await.unwrap();
        store.delete("c", &["a"]).await.unwrap();
        assert_eq!(store.count("c").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn query_of_another_size_is_rejected() {
        let store = InMemoryVectorStore::new();
        store.create_collection("c", 3).await.unwrap();
        store.upsert("c", &[chunk("a", "x", vec![1.0, 0.0, 0.0])]).await.unwrap();

        assert!(store.search("c", &[1.0, 0.0], 1).await.is_err());
        assert_eq!(store.search("c", &[1.0, 0.0, 0.0], 1).await.unwrap().len(), 1);
    }
}
