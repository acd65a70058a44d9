//! Property tests for the sliding-window chunker.

use docqa_rag::chunking::{Chunker, FixedSizeChunker, split_text_into_chunks};
use docqa_rag::document::Document;
use proptest::prelude::*;

/// Chunk size and an overlap strictly smaller than it.
fn arb_window() -> impl Strategy<Value = (usize, usize)> {
    (1usize..40).prop_flat_map(|size| (Just(size), 0..size))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Dropping the first `overlap` chars of every chunk after the first and
    /// concatenating gives back the input.
    #[test]
    fn chunks_reassemble_into_the_input(
        text in "\\PC{0,200}",
        (chunk_size, overlap) in arb_window(),
    ) {
        let chunks = split_text_into_chunks(&text, chunk_size, overlap);
        let mut rebuilt = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if i == 0 {
                rebuilt.push_str(chunk);
            } else {
                rebuilt.extend(chunk.chars().skip(overlap));
            }
        }
        prop_assert_eq!(rebuilt, text);
    }

    #[test]
    fn chunk_count_is_ceil_of_length_over_step(
        text in "[a-z ]{1,300}",
        (chunk_size, overlap) in arb_window(),
    ) {
        let len = text.chars().count();
        let step = chunk_size - overlap;
        let chunks = split_text_into_chunks(&text, chunk_size, overlap);
        prop_assert_eq!(chunks.len(), len.div_ceil(step));
        prop_assert!(chunks.iter().all(|c| c.chars().count() <= chunk_size));
    }

    #[test]
    fn consecutive_windows_share_the_overlap(
        text in "[a-z]{1,300}",
        (chunk_size, overlap) in arb_window(),
    ) {
        let step = chunk_size - overlap;
        let chunks = split_text_into_chunks(&text, chunk_size, overlap);
        for pair in chunks.windows(2) {
            let prev: Vec<char> = pair[0].chars().collect();
            let next: Vec<char> = pair[1].chars().collect();
            let tail = &prev[step.min(prev.len())..];
            let shared = tail.len().min(next.len());
            prop_assert_eq!(&tail[..shared], &next[..shared]);
        }
    }

    #[test]
    fn chunk_ids_are_unique_and_sequential(
        id in "[a-z]{1,10}\\.txt",
        text in "[a-z]{1,300}",
        (chunk_size, overlap) in arb_window(),
    ) {
        let doc = Document::new(id.clone(), text);
        let chunks = FixedSizeChunker::new(chunk_size, overlap).chunk(&doc);
        for (i, chunk) in chunks.iter().enumerate() {
            prop_assert_eq!(&chunk.id, &format!("{id}_chunk_{i}"));
            prop_assert_eq!(chunk.chunk_index, i);
        }
        let mut ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(ids.len(), chunks.len());
    }
}
