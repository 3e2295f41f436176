//! Data types for chunks, retrieval results, and pipeline results.

use serde::{Deserialize, Serialize};

/// A passage of the indexed document, the unit of retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Position of the chunk in the corpus, assigned at build time.
    pub id: usize,
    /// The passage text exactly as it was handed to the index.
    pub text: String,
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// `1 / (1 + squared_l2_distance)`, in `(0, 1]`. Higher is closer.
    pub score: f32,
}

/// The outcome of answering one query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineResult {
    /// The query as it was asked.
    pub query: String,
    /// The generated answer.
    pub response: String,
    /// The passages used as context, best first.
    pub retrieved: Vec<RetrievalResult>,
}
