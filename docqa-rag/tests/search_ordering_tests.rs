//! Ranking guarantees shared by every vector store backend.

use std::sync::Arc;

use docqa_rag::document::{Chunk, SearchResult};
use docqa_rag::inmemory::InMemoryVectorStore;
use docqa_rag::vectorstore::VectorStore;
use proptest::prelude::*;

const DIM: usize = 8;

/// A handful of directions; chunks reuse them so equal scores are common.
fn arb_directions() -> impl Strategy<Value = Vec<Vec<f32>>> {
    proptest::collection::vec(proptest::collection::vec(-1.0f32..1.0, DIM), 1..4)
}

/// Each entry picks one of the directions; the chunk id is its position.
fn arb_picks() -> impl Strategy<Value = Vec<usize>> {
    proptest::collection::vec(0usize..4, 1..16)
}

fn chunks_from(directions: &[Vec<f32>], picks: &[usize]) -> Vec<Chunk> {
    picks
        .iter()
        .enumerate()
        .map(|(i, pick)| Chunk {
            id: format!("c{i:02}"),
            text: format!("chunk {i}"),
            embedding: directions[pick % directions.len()].clone(),
            document_id: "doc.txt".to_string(),
            chunk_index: i,
        })
        .collect()
}

async fn stores() -> Vec<(&'static str, Arc<dyn VectorStore>)> {
    let mut stores: Vec<(&'static str, Arc<dyn VectorStore>)> =
        vec![("in-memory", Arc::new(InMemoryVectorStore::new()))];
    #[cfg(feature = "sqlite")]
    stores.push(("sqlite", Arc::new(docqa_rag::SqliteVectorStore::in_memory().await.unwrap())));
    stores
}

fn check_ranking(
    store: &str,
    results: &[SearchResult],
    expected_len: usize,
) -> Result<(), TestCaseError> {
    prop_assert_eq!(results.len(), expected_len, "{} returned the wrong count", store);
    for pair in results.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        prop_assert!(
            a.score >= b.score,
            "{store}: {} ({}) ranked above {} ({})",
            a.chunk.id,
            a.score,
            b.chunk.id,
            b.score
        );
        if a.score == b.score {
            prop_assert!(
                a.chunk.id < b.chunk.id,
                "{store}: tie not broken by id, {} before {}",
                a.chunk.id,
                b.chunk.id
            );
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Results come back best first, equal scores in id order, and never
    /// more than `top_k` or than the collection holds.
    #[test]
    fn every_store_ranks_by_score_then_id(
        directions in arb_directions(),
        picks in arb_picks(),
        query in proptest::collection::vec(-1.0f32..1.0, DIM),
        top_k in 1usize..20,
    ) {
        let chunks = chunks_from(&directions, &picks);
        let rt = tokio::runtime::Runtime::new().unwrap();
        let runs = rt.block_on(async {
            let mut runs = Vec::new();
            for (name, store) in stores().await {
                store.create_collection("ranked", DIM).await.unwrap();
                store.upsert("ranked", &chunks).await.unwrap();
                runs.push((name, store.search("ranked", &query, top_k).await.unwrap()));
            }
            runs
        });

        for (name, results) in &runs {
            check_ranking(name, results, top_k.min(chunks.len()))?;
        }

        // Both backends agree on which chunks make the cut.
        let ids: Vec<Vec<&str>> = runs
            .iter()
            .map(|(_, results)| results.iter().map(|r| r.chunk.id.as_str()).collect())
            .collect();
        for other in &ids[1..] {
            prop_assert_eq!(&ids[0], other);
        }
    }
}
