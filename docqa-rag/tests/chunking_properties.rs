//! Property tests for sentence chunking.

use docqa_rag::chunking::{Chunker, SentenceChunker};
use proptest::prelude::*;

const DELIMITER: &str = ". ";

/// Text built from `". "`-joined sentences of letters, digits, commas and spaces.
fn arb_text() -> impl Strategy<Value = String> {
    proptest::collection::vec("[a-zA-Z0-9 ,]{0,40}", 0..25).prop_map(|s| s.join(DELIMITER))
}

/// Sentence units with delimiter and surrounding whitespace normalized away.
fn units(text: &str) -> Vec<String> {
    text.split(DELIMITER)
        .map(|u| u.trim().trim_end_matches('.').trim().to_string())
        .filter(|u| !u.is_empty())
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Chunking the same input twice yields the same chunks.
    #[test]
    fn chunking_is_deterministic(text in arb_text(), target in 1usize..200) {
        let chunker = SentenceChunker::new(target).unwrap();
        prop_assert_eq!(chunker.chunk(&text), chunker.chunk(&text));
    }

    /// Every sentence of the input appears, in order, exactly once.
    #[test]
    fn chunks_cover_every_sentence(text in arb_text(), target in 1usize..200) {
        let chunker = SentenceChunker::new(target).unwrap();
        let chunks = chunker.chunk(&text);

        let from_chunks: Vec<String> = chunks.iter().flat_map(|c| units(c)).collect();
        prop_assert_eq!(from_chunks, units(&text));

        for chunk in &chunks {
            prop_assert!(!chunk.is_empty());
            prop_assert_eq!(chunk.trim(), chunk.as_str());
        }
    }

    /// A chunk only exceeds the target when it holds a single oversized sentence.
    #[test]
    fn chunks_respect_soft_bound(text in arb_text(), target in 1usize..200) {
        let chunker = SentenceChunker::new(target).unwrap();
        for chunk in chunker.chunk(&text) {
            let len = chunk.chars().count();
            let sentence_count = units(&chunk).len();
            prop_assert!(
                sentence_count == 1 || len < target + DELIMITER.len(),
                "chunk of {} chars with {} sentences exceeds target {}",
                len,
                sentence_count,
                target,
            );
        }
    }
}
