//! Property tests for in-memory vector index search ordering.

use docqa_rag::document::{Chunk, IndexEntry};
use docqa_rag::inmemory::InMemoryVectorIndex;
use docqa_rag::vectorstore::VectorIndex;
use docqa_rag::RagError;
use proptest::prelude::*;

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-8 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

fn chunk(index: usize, text: String) -> Chunk {
    let len = text.chars().count();
    Chunk { index, text, page: 1, start: 0, end: len, overlap: 0 }
}

fn entries(raw: Vec<(String, Vec<f32>)>) -> Vec<IndexEntry> {
    raw.into_iter()
        .enumerate()
        .map(|(index, (text, embedding))| IndexEntry { chunk: chunk(index, text), embedding })
        .collect()
}

/// *For any* set of entries, searching SHALL return results ordered by
/// descending cosine similarity, at most `k` of them and never more than the
/// number of indexed entries, with no entry repeated.
mod prop_inmemory_search_ordering {
    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_descending_and_bounded_by_k(
            raw in proptest::collection::vec(("[a-z ]{5,30}", arb_normalized_embedding(DIM)), 1..20),
            query in arb_normalized_embedding(DIM),
            k in 0usize..25,
        ) {
            let count = raw.len();
            let index = InMemoryVectorIndex::from_entries(entries(raw)).unwrap();
            let results = index.search(&query, k).unwrap();

            prop_assert_eq!(results.len(), k.min(count));
            for pair in results.windows(2) {
                prop_assert!(
                    pair[0].score >= pair[1].score,
                    "results not in descending order: {} < {}",
                    pair[0].score,
                    pair[1].score,
                );
            }

            let mut seen: Vec<usize> = results.iter().map(|r| r.chunk.index).collect();
            seen.sort_unstable();
            seen.dedup();
            prop_assert_eq!(seen.len(), results.len());

            for result in &results {
                prop_assert!(result.score >= -1.0 - 1e-5 && result.score <= 1.0 + 1e-5);
            }
        }

        #[test]
        fn search_is_repeatable(
            raw in proptest::collection::vec(("[a-z]{3,10}", arb_normalized_embedding(DIM)), 1..12),
            query in arb_normalized_embedding(DIM),
        ) {
            let index = InMemoryVectorIndex::from_entries(entries(raw)).unwrap();
            let first = index.search(&query, 4).unwrap();
            let second = index.search(&query, 4).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}

/// *For any* entries sharing one embedding, ties SHALL be broken by insertion order.
mod prop_inmemory_tie_breaking {
    use super::*;

    const DIM: usize = 8;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn equal_scores_keep_insertion_order(
            embedding in arb_normalized_embedding(DIM),
            count in 1usize..15,
            k in 1usize..15,
        ) {
            let raw = (0..count).map(|i| (format!("chunk {i}"), embedding.clone())).collect();
            let index = InMemoryVectorIndex::from_entries(entries(raw)).unwrap();
            let results = index.search(&embedding, k).unwrap();

            let order: Vec<usize> = results.iter().map(|r| r.chunk.index).collect();
            let expected: Vec<usize> = (0..k.min(count)).collect();
            prop_assert_eq!(order, expected);
        }
    }
}

#[test]
fn search_before_build_is_an_error() {
    let index = InMemoryVectorIndex::new();
    assert!(matches!(index.search(&[1.0, 0.0], 3), Err(RagError::EmptyIndexError)));
}

#[test]
fn rebuild_replaces_prior_content() {
    let mut index = InMemoryVectorIndex::from_entries(entries(vec![
        ("old one".into(), vec![1.0, 0.0]),
        ("old two".into(), vec![0.0, 1.0]),
    ]))
    .unwrap();

    index.build(entries(vec![("new".into(), vec![0.0, 0.0, 1.0])])).unwrap();

    assert_eq!(index.len(), 1);
    assert_eq!(index.dimensions(), Some(3));
    let results = index.search(&[0.0, 0.0, 1.0], 5).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].chunk.text, "new");
}
