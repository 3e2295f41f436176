//! Exact nearest-neighbor retrieval over chunk embeddings.
//!
//! [`VectorIndex`] is an immutable, flat set of `(chunk, vector)` pairs
//! searched by brute-force squared Euclidean distance. [`Retriever`] owns the
//! current index behind a `tokio::sync::RwLock` and replaces it wholesale on
//! every build. Readers clone the `Arc` and release the lock before doing
//! any work, so queries running during a rebuild see either the old corpus or
//! the new one, never a mix.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::document::{Chunk, RetrievalResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// An immutable corpus of chunks aligned 1:1 with their embeddings.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    chunks: Vec<Chunk>,
    vectors: Vec<Vec<f32>>,
    dimension: usize,
}

impl VectorIndex {
    /// Build an index from chunk texts and their embeddings.
    ///
    /// Chunk ids are assigned from the position in `texts`. The dimension is
    /// taken from the first vector.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IndexError`] if the inputs are empty, differ in
    /// length, or if any vector's dimension differs from the first one.
    pub fn from_embeddings(texts: Vec<String>, vectors: Vec<Vec<f32>>) -> Result<Self> {
        if texts.len() != vectors.len() {
            return Err(RagError::IndexError(format!(
                "received {} embeddings for {} chunks",
                vectors.len(),
                texts.len()
            )));
        }
        let Some(first) = vectors.first() else {
            return Err(RagError::IndexError("cannot index an empty corpus".to_string()));
        };
        let dimension = first.len();
        if dimension == 0 {
            return Err(RagError::IndexError("embeddings must not be empty".to_string()));
        }
        if let Some((position, vector)) =
            vectors.iter().enumerate().find(|(_, v)| v.len() != dimension)
        {
            return Err(RagError::IndexError(format!(
                "embedding {position} has dimension {} but expected {dimension}",
                vector.len()
            )));
        }

        let chunks =
            texts.into_iter().enumerate().map(|(id, text)| Chunk { id, text }).collect();
        Ok(Self { chunks, vectors, dimension })
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Always `false`; an index is never built from an empty corpus.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Length of every stored vector.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// All chunks in id order.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Look up a chunk by id.
    pub fn chunk(&self, id: usize) -> Option<&Chunk> {
        self.chunks.get(id)
    }

    /// Return the `k` chunks closest to `query`, nearest first.
    ///
    /// Distance ties are broken by ascending chunk id. If `k` exceeds the
    /// corpus size, every chunk is returned.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidArgument`] if `k` is zero, and
    /// [`RagError::IndexError`] if `query` has the wrong dimension.
    pub fn search_vector(&self, query: &[f32], k: usize) -> Result<Vec<RetrievalResult>> {
        if k == 0 {
            return Err(RagError::InvalidArgument("k must be greater than zero".to_string()));
        }
        if query.len() != self.dimension {
            return Err(RagError::IndexError(format!(
                "query embedding has dimension {} but the index has {}",
                query.len(),
                self.dimension
            )));
        }

        let mut ranked: Vec<(f32, usize)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(id, vector)| (squared_l2_distance(query, vector), id))
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        ranked.truncate(k);

        Ok(ranked
            .into_iter()
            .map(|(distance, id)| RetrievalResult {
                chunk: self.chunks[id].clone(),
                score: distance_to_score(distance),
            })
            .collect())
    }
}

/// Squared Euclidean distance between two equal-length vectors.
pub fn squared_l2_distance(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same length");
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Map a non-negative distance to a score in `(0, 1]`.
///
/// The score is 1 only at zero distance and strictly decreases as the
/// distance grows. It is a readable relevance indicator, not a probability.
pub fn distance_to_score(distance: f32) -> f32 {
    1.0 / (1.0 + distance)
}

/// Whether an index is currently available for search.
#[derive(Debug, Clone, Default)]
pub enum IndexState {
    /// Nothing has been indexed, or the last build had no chunks.
    #[default]
    Empty,
    /// A corpus is indexed and searchable.
    Built(Arc<VectorIndex>),
}

/// Owns the current [`VectorIndex`] and the embedding backend that feeds it.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use docqa_rag::{HashEmbeddingProvider, Retriever};
///
/// let retriever = Retriever::new(Arc::new(HashEmbeddingProvider::default()));
/// retriever.build(vec!["Cats purr.".into(), "Dogs bark.".into()]).await?;
/// let results = retriever.search("why do dogs bark", 1).await?;
/// assert_eq!(results[0].chunk.text, "Dogs bark.");
/// ```
pub struct Retriever {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    state: RwLock<IndexState>,
}

impl Retriever {
    /// Create a retriever with no index.
    pub fn new(embedding_provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { embedding_provider, state: RwLock::new(IndexState::Empty) }
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Embed `chunks` in one batch and replace the current index with them.
    ///
    /// Returns the number of chunks indexed. An empty `chunks` makes no
    /// embedding call and leaves the retriever unqueryable. If embedding
    /// fails, the previous index stays in place.
    ///
    /// # Errors
    ///
    /// Propagates [`RagError::EmbeddingError`] from the backend, and returns
    /// [`RagError::IndexError`] if the backend breaks its length or
    /// dimension contract.
    pub async fn build(&self, chunks: Vec<String>) -> Result<usize> {
        if chunks.is_empty() {
            *self.state.write().await = IndexState::Empty;
            info!(chunk_count = 0, "index cleared");
            return Ok(0);
        }

        let provider = self.embedding_provider.name();
        let vectors = {
            let texts: Vec<&str> = chunks.iter().map(String::as_str).collect();
            self.embedding_provider.embed_batch(&texts).await.inspect_err(|e| {
                error!(provider, stage = "embedding", error = %e, "embedding failed during build");
            })?
        };

        let index = VectorIndex::from_embeddings(chunks, vectors).inspect_err(|e| {
            error!(provider, stage = "search", error = %e, "embeddings could not be indexed");
        })?;

        let chunk_count = index.len();
        let dimension = index.dimension();
        *self.state.write().await = IndexState::Built(Arc::new(index));
        info!(chunk_count, dimension, provider, "index built");

        Ok(chunk_count)
    }

    /// Return the current index.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::NotIndexed`] if no corpus is indexed.
    pub async fn snapshot(&self) -> Result<Arc<VectorIndex>> {
        match &*self.state.read().await {
            IndexState::Empty => Err(RagError::NotIndexed),
            IndexState::Built(index) => Ok(Arc::clone(index)),
        }
    }

    /// Whether a corpus is indexed.
    pub async fn is_built(&self) -> bool {
        matches!(&*self.state.read().await, IndexState::Built(_))
    }

    /// Number of chunks in the current index, or 0 when empty.
    pub async fn chunk_count(&self) -> usize {
        match &*self.state.read().await {
            IndexState::Empty => 0,
            IndexState::Built(index) => index.len(),
        }
    }

    /// Embed `query` and return the `k` nearest chunks, best first.
    ///
    /// Argument and state checks happen before the embedding backend is
    /// called.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidArgument`] if `k` is zero,
    /// [`RagError::NotIndexed`] if nothing is indexed, and propagates
    /// backend errors unchanged.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievalResult>> {
        if k == 0 {
            return Err(RagError::InvalidArgument("k must be greater than zero".to_string()));
        }
        let index = self.snapshot().await?;

        let query_embedding = self.embedding_provider.embed(query).await.inspect_err(|e| {
            error!(stage = "embedding", error = %e, "embedding failed during search");
        })?;
        let results = index.search_vector(&query_embedding, k)?;

        debug!(k, result_count = results.len(), "search completed");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;

    /// Looks vectors up in a fixed table and counts backend calls.
    #[derive(Default)]
    struct TableEmbedder {
        table: HashMap<String, Vec<f32>>,
        calls: AtomicUsize,
        fail: bool,
    }

    impl TableEmbedder {
        fn new(entries: &[(&str, Vec<f32>)]) -> Self {
            Self {
                table: entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
                ..Default::default()
            }
        }

        fn failing() -> Self {
            Self { fail: true, ..Default::default() }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EmbeddingProvider for TableEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(RagError::EmbeddingError {
                    provider: "table".into(),
                    message: "backend unavailable".into(),
                });
            }
            self.table.get(text).cloned().ok_or_else(|| RagError::EmbeddingError {
                provider: "table".into(),
                message: format!("unknown text '{text}'"),
            })
        }
    }

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn from_embeddings_rejects_misaligned_input() {
        let err = VectorIndex::from_embeddings(texts(&["a", "b"]), vec![vec![1.0]]).unwrap_err();
        assert!(matches!(err, RagError::IndexError(_)));
    }

    #[test]
    fn from_embeddings_rejects_mixed_dimensions() {
        let err =
            VectorIndex::from_embeddings(texts(&["a", "b"]), vec![vec![1.0, 0.0], vec![1.0]])
                .unwrap_err();
        assert!(err.to_string().contains("embedding 1 has dimension 1 but expected 2"));
    }

    #[test]
    fn search_orders_by_distance_and_clamps_k() {
        let index = VectorIndex::from_embeddings(
            texts(&["far", "exact", "near"]),
            vec![vec![0.0, 3.0], vec![1.0, 0.0], vec![1.0, 1.0]],
        )
        .unwrap();

        let results = index.search_vector(&[1.0, 0.0], 10).unwrap();
        let ids: Vec<usize> = results.iter().map(|r| r.chunk.id).collect();
        assert_eq!(ids, vec![1, 2, 0]);
        assert_eq!(results[0].score, 1.0);
        assert!((results[1].score - 0.5).abs() < 1e-6);
        // distance = 1 + 9 = 10
        assert!((results[2].score - 1.0 / 11.0).abs() < 1e-6);

        assert_eq!(index.search_vector(&[1.0, 0.0], 2).unwrap().len(), 2);
    }

    #[test]
    fn distance_ties_break_by_ascending_id() {
        let index = VectorIndex::from_embeddings(
            texts(&["a", "b", "c"]),
            vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![0.0, 1.0]],
        )
        .unwrap();
        let results = index.search_vector(&[0.0, 1.0], 3).unwrap();
        let ids: Vec<usize> = results.iter().map(|r| r.chunk.id).collect();
        assert_eq!(ids, vec![0, 2, 1]);
    }

    #[test]
    fn search_vector_validates_arguments() {
        let index = VectorIndex::from_embeddings(texts(&["a"]), vec![vec![1.0, 0.0]]).unwrap();
        assert!(matches!(index.search_vector(&[1.0, 0.0], 0), Err(RagError::InvalidArgument(_))));
        assert!(matches!(index.search_vector(&[1.0], 1), Err(RagError::IndexError(_))));
    }

    #[test]
    fn score_is_one_only_at_zero_distance() {
        assert_eq!(distance_to_score(0.0), 1.0);
        assert!(distance_to_score(1e-3) < 1.0);
        assert!(distance_to_score(4.0) < distance_to_score(1.0));
    }

    #[tokio::test]
    async fn search_before_build_fails_without_embedding() {
        let embedder = Arc::new(TableEmbedder::default());
        let retriever = Retriever::new(embedder.clone());

        let err = retriever.search("anything", 3).await.unwrap_err();
        assert!(err.is_not_indexed());
        assert_eq!(embedder.calls(), 0);
        assert!(!retriever.is_built().await);
    }

    #[tokio::test]
    async fn zero_k_is_rejected_before_embedding() {
        let embedder = Arc::new(TableEmbedder::new(&[("a", vec![1.0])]));
        let retriever = Retriever::new(embedder.clone());
        retriever.build(texts(&["a"])).await.unwrap();
        let calls_after_build = embedder.calls();

        let err = retriever.search("a", 0).await.unwrap_err();
        assert!(matches!(err, RagError::InvalidArgument(_)));
        assert_eq!(embedder.calls(), calls_after_build);
    }

    #[tokio::test]
    async fn rebuild_replaces_the_whole_corpus() {
        let embedder = Arc::new(TableEmbedder::new(&[
            ("old one", vec![1.0, 0.0]),
            ("old two", vec![0.0, 1.0]),
            ("new", vec![1.0, 1.0]),
        ]));
        let retriever = Retriever::new(embedder);

        assert_eq!(retriever.build(texts(&["old one", "old two"])).await.unwrap(), 2);
        assert_eq!(retriever.build(texts(&["new"])).await.unwrap(), 1);

        let index = retriever.snapshot().await.unwrap();
        assert_eq!(index.chunks(), &[Chunk { id: 0, text: "new".into() }]);
        let results = retriever.search("old one", 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.text, "new");
    }

    #[tokio::test]
    async fn failed_build_keeps_previous_index() {
        let embedder = Arc::new(TableEmbedder::new(&[("kept", vec![1.0])]));
        let retriever = Retriever::new(embedder);
        retriever.build(texts(&["kept"])).await.unwrap();
        let before = retriever.snapshot().await.unwrap();

        assert!(retriever.build(texts(&["unknown"])).await.is_err());
        assert_eq!(*retriever.snapshot().await.unwrap(), *before);
    }

    #[tokio::test]
    async fn failed_first_build_stays_empty() {
        let retriever = Retriever::new(Arc::new(TableEmbedder::failing()));
        let err = retriever.build(texts(&["x"])).await.unwrap_err();
        assert_eq!(err.stage(), crate::error::Stage::Embedding);
        assert!(!retriever.is_built().await);
    }

    #[tokio::test]
    async fn empty_build_makes_index_unqueryable() {
        let embedder = Arc::new(TableEmbedder::new(&[("a", vec![1.0])]));
        let retriever = Retriever::new(embedder.clone());
        retriever.build(texts(&["a"])).await.unwrap();
        let calls = embedder.calls();

        assert_eq!(retriever.build(Vec::new()).await.unwrap(), 0);
        assert_eq!(embedder.calls(), calls);
        assert_eq!(retriever.chunk_count().await, 0);
        assert!(retriever.search("a", 1).await.unwrap_err().is_not_indexed());
    }

    #[tokio::test]
    async fn query_dimension_mismatch_is_an_index_error() {
        let embedder = Arc::new(TableEmbedder::new(&[("doc", vec![1.0, 0.0]), ("q", vec![1.0])]));
        let retriever = Retriever::new(embedder);
        retriever.build(texts(&["doc"])).await.unwrap();

        let err = retriever.search("q", 1).await.unwrap_err();
        assert!(matches!(err, RagError::IndexError(_)));
    }

    #[tokio::test]
    async fn embedding_failure_during_search_propagates_unchanged() {
        let embedder = Arc::new(TableEmbedder::new(&[("doc", vec![1.0])]));
        let retriever = Retriever::new(embedder);
        retriever.build(texts(&["doc"])).await.unwrap();

        let err = retriever.search("not in table", 1).await.unwrap_err();
        match err {
            RagError::EmbeddingError { provider, message } => {
                assert_eq!(provider, "table");
                assert!(message.contains("not in table"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
