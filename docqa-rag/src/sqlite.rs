//! SQLite vector store backend.
//!
//! Provides [`SqliteVectorStore`] which implements [`VectorStore`] on a local
//! database file using [sqlx](https://docs.rs/sqlx). Embeddings are stored as
//! JSON arrays and ranked in-process by cosine similarity, which is fine for
//! the few thousand chunks a local document folder produces.
//!
//! # Example
//!
//! ```rust,ignore
//! use docqa_rag::sqlite::SqliteVectorStore;
//!
//! let store = SqliteVectorStore::open("./vector_db").await?;
//! store.create_collection("docs", 768).await?;
//! store.upsert("docs", &chunks).await?;
//! let results = store.search("docs", &query_embedding, 5).await?;
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tracing::debug;

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::similarity::{cosine_similarity, rank};
use crate::vectorstore::VectorStore;

/// File created inside the store directory.
pub const DATABASE_FILE: &str = "vectors.sqlite3";

const BACKEND: &str = "sqlite";

/// A [`VectorStore`] persisted in a SQLite database.
///
/// Each collection is stored as a separate table with columns
/// `id`, `text`, `embedding` (JSON), `document_id`, `chunk_index`. The
/// `rag_collections` table records each collection's dimensionality. The
/// first upsert into an empty collection may change it; after that, upserts
/// and queries with a different vector length are rejected.
pub struct SqliteVectorStore {
    pool: SqlitePool,
    path: Option<PathBuf>,
}

impl SqliteVectorStore {
    /// Open (or create) a store in `dir`, creating the directory if needed.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| RagError::VectorStoreError {
            backend: BACKEND.to_string(),
            message: format!("failed to create store directory {}: {e}", dir.display()),
        })?;

        let path = dir.join(DATABASE_FILE);
        let options = SqliteConnectOptions::new().filename(&path).create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(Self::map_err)?;

        let store = Self { pool, path: Some(path) };
        store.init().await?;
        debug!(path = %dir.display(), "opened sqlite vector store");
        Ok(store)
    }

    /// Create a store that lives only as long as this value.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(Self::map_err)?;
        let store = Self { pool, path: None };
        store.init().await?;
        Ok(store)
    }

    /// The database file, or `None` for an in-memory store.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn init(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS rag_collections (\
                name TEXT PRIMARY KEY, \
                dimensions INTEGER NOT NULL\
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(Self::map_err)?;
        Ok(())
    }

    fn map_err(e: sqlx::Error) -> RagError {
        RagError::VectorStoreError { backend: BACKEND.to_string(), message: e.to_string() }
    }

    fn missing_collection(name: &str) -> RagError {
        RagError::VectorStoreError {
            backend: BACKEND.to_string(),
            message: format!("collection '{name}' does not exist"),
        }
    }

    /// Sanitize a collection name for use as a table name.
    /// Only allows alphanumeric characters and underscores.
    fn sanitize_table_name(name: &str) -> Result<String> {
        let sanitized: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        if sanitized.is_empty() {
            return Err(RagError::VectorStoreError {
                backend: BACKEND.to_string(),
                message: "collection name is empty after sanitization".to_string(),
            });
        }
        Ok(format!("rag_{sanitized}"))
    }

    async fn row_count(&self, table_name: &str) -> Result<usize> {
        let row = sqlx::query(&format!("SELECT COUNT(*) AS n FROM {table_name}"))
            .fetch_one(&self.pool)
            .await
            .map_err(Self::map_err)?;
        let n: i64 = row.try_get("n").map_err(Self::map_err)?;
        Ok(n as usize)
    }

    fn dimension_mismatch(what: &str, found: usize, collection: &str, expected: usize) -> RagError {
        RagError::VectorStoreError {
            backend: BACKEND.to_string(),
            message: format!(
                "'{what}' has {found} dimensions, collection '{collection}' expects {expected}"
            ),
        }
    }

    async fn dimensions_of(&self, name: &str) -> Result<usize> {
        let row = sqlx::query("SELECT dimensions FROM rag_collections WHERE name = ?1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(Self::map_err)?;
        let row = row.ok_or_else(|| Self::missing_collection(name))?;
        let dimensions: i64 = row.try_get("dimensions").map_err(Self::map_err)?;
        Ok(dimensions as usize)
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        let table_name = Self::sanitize_table_name(name)?;

        let create_sql = format!(
            "CREATE TABLE IF NOT EXISTS {table_name} (\
                id TEXT PRIMARY KEY, \
                text TEXT NOT NULL, \
                embedding TEXT NOT NULL, \
                document_id TEXT NOT NULL, \
                chunk_index INTEGER NOT NULL\
            )"
        );
        sqlx::query(&create_sql).execute(&self.pool).await.map_err(Self::map_err)?;

        sqlx::query("INSERT OR IGNORE INTO rag_collections (name, dimensions) VALUES (?1, ?2)")
            .bind(name)
            .bind(dimensions as i64)
            .execute(&self.pool)
            .await
            .map_err(Self::map_err)?;

        debug!(collection = name, table = %table_name, dimensions, "created sqlite table");
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let table_name = Self::sanitize_table_name(name)?;

        let drop_sql = format!("DROP TABLE IF EXISTS {table_name}");
        sqlx::query(&drop_sql).execute(&self.pool).await.map_err(Self::map_err)?;
        sqlx::query("DELETE FROM rag_collections WHERE name = ?1")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(Self::map_err)?;

        debug!(collection = name, table = %table_name, "deleted sqlite table");
        Ok(())
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        let table_name = Self::sanitize_table_name(collection)?;
        let mut dimensions = self.dimensions_of(collection).await?;
        if chunks.is_empty() {
            return Ok(());
        }

        if let Some(bad) = chunks.iter().find(|c| c.embedding.is_empty()) {
            return Err(RagError::VectorStoreError {
                backend: BACKEND.to_string(),
                message: format!("chunk '{}' has no embedding", bad.id),
            });
        }
        let incoming = chunks[0].embedding.len();
        if let Some(bad) = chunks.iter().find(|c| c.embedding.len() != incoming) {
            return Err(RagError::VectorStoreError {
                backend: BACKEND.to_string(),
                message: format!(
                    "chunk '{}' has {} dimensions, batch starts with {incoming}",
                    bad.id,
                    bad.embedding.len()
                ),
            });
        }

        // An empty collection takes the size of the first vectors written to it.
        if incoming != dimensions && self.row_count(&table_name).await? == 0 {
            sqlx::query("UPDATE rag_collections SET dimensions = ?1 WHERE name = ?2")
                .bind(incoming as i64)
                .bind(collection)
                .execute(&self.pool)
                .await
                .map_err(Self::map_err)?;
            debug!(collection, from = dimensions, to = incoming, "resized empty collection");
            dimensions = incoming;
        }

        if incoming != dimensions {
            return Err(Self::dimension_mismatch(&chunks[0].id, incoming, collection, dimensions));
        }

        let upsert_sql = format!(
            "INSERT INTO {table_name} (id, text, embedding, document_id, chunk_index) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT (id) DO UPDATE SET \
                text = excluded.text, \
                embedding = excluded.embedding, \
                document_id = excluded.document_id, \
                chunk_index = excluded.chunk_index"
        );

        let mut tx = self.pool.begin().await.map_err(Self::map_err)?;
        for chunk in chunks {
            let embedding_json = serde_json::to_string(&chunk.embedding).map_err(|e| {
                RagError::VectorStoreError {
                    backend: BACKEND.to_string(),
                    message: format!("failed to encode embedding for '{}': {e}", chunk.id),
                }
            })?;

            sqlx::query(&upsert_sql)
                .bind(&chunk.id)
                .bind(&chunk.text)
                .bind(&embedding_json)
                .bind(&chunk.document_id)
                .bind(chunk.chunk_index as i64)
                .execute(&mut *tx)
                .await
                .map_err(Self::map_err)?;
        }
        tx.commit().await.map_err(Self::map_err)?;

        debug!(collection, count = chunks.len(), "upserted chunks to sqlite");
        Ok(())
    }

    async fn delete(&self, collection: &str, ids: &[&str]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let table_name = Self::sanitize_table_name(collection)?;
        let delete_sql = format!("DELETE FROM {table_name} WHERE id = ?1");

        let mut tx = self.pool.begin().await.map_err(Self::map_err)?;
        for id in ids {
            sqlx::query(&delete_sql).bind(*id).execute(&mut *tx).await.map_err(Self::map_err)?;
        }
        tx.commit().await.map_err(Self::map_err)?;

        debug!(collection, count = ids.len(), "deleted chunks from sqlite");
        Ok(())
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let table_name = Self::sanitize_table_name(collection)?;
        self.dimensions_of(collection).await?;
        self.row_count(&table_name).await
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let table_name = Self::sanitize_table_name(collection)?;
        let dimensions = self.dimensions_of(collection).await?;
        if embedding.len() != dimensions && self.row_count(&table_name).await? > 0 {
            return Err(Self::dimension_mismatch("query", embedding.len(), collection, dimensions));
        }

        let search_sql =
            format!("SELECT id, text, embedding, document_id, chunk_index FROM {table_name}");
        let rows = sqlx::query(&search_sql).fetch_all(&self.pool).await.map_err(Self::map_err)?;

        let mut scored = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: String = row.try_get("id").map_err(Self::map_err)?;
            let text: String = row.try_get("text").map_err(Self::map_err)?;
            let embedding_json: String = row.try_get("embedding").map_err(Self::map_err)?;
            let document_id: String = row.try_get("document_id").map_err(Self::map_err)?;
            let chunk_index: i64 = row.try_get("chunk_index").map_err(Self::map_err)?;

            let stored: Vec<f32> = serde_json::from_str(&embedding_json).map_err(|e| {
                RagError::VectorStoreError {
                    backend: BACKEND.to_string(),
                    message: format!("corrupt embedding for '{id}': {e}"),
                }
            })?;

            let score = cosine_similarity(&stored, embedding);
            scored.push(SearchResult {
                chunk: Chunk {
                    id,
                    text,
                    embedding: stored,
                    document_id,
                    chunk_index: chunk_index as usize,
                },
                score,
            });
        }

        let results = rank(scored, top_k);
        debug!(collection, result_count = results.len(), "searched sqlite collection");
        Ok(results)
    }
}
