//! Persistence behaviour of the SQLite vector store.

#![cfg(feature = "sqlite")]

use docqa_rag::document::Chunk;
use docqa_rag::sqlite::{DATABASE_FILE, SqliteVectorStore};
use docqa_rag::vectorstore::VectorStore;

fn chunk(id: &str, text: &str, embedding: Vec<f32>) -> Chunk {
    Chunk {
        id: id.to_string(),
        text: text.to_string(),
        embedding,
        document_id: "doc.txt".to_string(),
        chunk_index: 0,
    }
}

#[tokio::test]
async fn chunks_survive_reopening_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("vector_db");

    {
        let store = SqliteVectorStore::open(&db_path).await.unwrap();
        store.create_collection("docs", 3).await.unwrap();
        let chunks =
            [chunk("a", "alpha", vec![1.0, 0.0, 0.0]), chunk("b", "beta", vec![0.0, 1.0, 0.0])];
        store.upsert("docs", &chunks).await.unwrap();
    }
    assert!(db_path.join(DATABASE_FILE).exists());

    let store = SqliteVectorStore::open(&db_path).await.unwrap();
    store.create_collection("docs", 3).await.unwrap();
    assert_eq!(store.count("docs").await.unwrap(), 2);

    let results = store.search("docs", &[0.0, 1.0, 0.0], 5).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].chunk.id, "b");
    assert_eq!(results[0].chunk.text, "beta");
    assert!((results[0].score - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn upsert_replaces_existing_ids() {
    let store = SqliteVectorStore::in_memory().await.unwrap();
    store.create_collection("docs", 2).await.unwrap();

    store.upsert("docs", &[chunk("a", "old", vec![1.0, 0.0])]).await.unwrap();
    store.upsert("docs", &[chunk("a", "new", vec![0.0, 1.0])]).await.unwrap();

    assert_eq!(store.count("docs").await.unwrap(), 1);
    let results = store.search("docs", &[0.0, 1.0], 1).await.unwrap();
    assert_eq!(results[0].chunk.text, "new");
}

#[tokio::test]
async fn empty_collection_takes_the_size_of_its_first_vectors() {
    let store = SqliteVectorStore::in_memory().await.unwrap();
    store.create_collection("docs", 3).await.unwrap();

    store.upsert("docs", &[chunk("a", "wide", vec![0.0, 0.0, 0.0, 1.0])]).await.unwrap();
    assert_eq!(store.count("docs").await.unwrap(), 1);

    let results = store.search("docs", &[0.0, 0.0, 0.0, 1.0], 1).await.unwrap();
    assert_eq!(results[0].chunk.id, "a");
}

#[tokio::test]
async fn wrong_dimensions_are_rejected_once_populated() {
    let store = SqliteVectorStore::in_memory().await.unwrap();
    store.create_collection("docs", 3).await.unwrap();
    store.upsert("docs", &[chunk("a", "full", vec![1.0, 0.0, 0.0])]).await.unwrap();

    let err = store.upsert("docs", &[chunk("b", "short", vec![1.0, 0.0])]).await.unwrap_err();
    assert!(err.to_string().contains("expects 3"));
    assert_eq!(store.count("docs").await.unwrap(), 1);
}

#[tokio::test]
async fn mixed_sizes_in_one_batch_are_rejected() {
    let store = SqliteVectorStore::in_memory().await.unwrap();
    store.create_collection("docs", 2).await.unwrap();

    let batch = [chunk("a", "x", vec![1.0, 0.0]), chunk("b", "y", vec![1.0, 0.0, 0.0])];
    assert!(store.upsert("docs", &batch).await.is_err());
    assert!(store.upsert("docs", &[chunk("c", "z", vec![])]).await.is_err());
    assert_eq!(store.count("docs").await.unwrap(), 0);
}

#[tokio::test]
async fn query_of_another_size_is_rejected() {
    let store = SqliteVectorStore::in_memory().await.unwrap();
    store.create_collection("docs", 3).await.unwrap();
    store
        .upsert(
            "docs",
            &[chunk("a", "x", vec![1.0, 0.0, 0.0]), chunk("b", "y", vec![0.0, 0.0, 1.0])],
        )
        .await
        .unwrap();

    let err = store.search("docs", &[1.0, 0.0], 2).await.unwrap_err();
    assert!(err.to_string().contains("'query' has 2 dimensions"));
}

#[tokio::test]
async fn delete_and_drop() {
    let store = SqliteVectorStore::in_memory().await.unwrap();
    store.create_collection("docs", 2).await.unwrap();
    store
        .upsert("docs", &[chunk("a", "x", vec![1.0, 0.0]), chunk("b", "y", vec![0.0, 1.0])])
        .await
        .unwrap();

    store.delete("docs", &["a"]).await.unwrap();
    assert_eq!(store.count("docs").await.unwrap(), 1);

    store.delete_collection("docs").await.unwrap();
    assert!(store.search("docs", &[1.0, 0.0], 1).await.is_err());
}
