//! Offline embedding provider based on feature hashing.
//!
//! [`HashEmbeddingProvider`] needs no model files or network access. Each
//! lowercase alphanumeric token is hashed with FNV-1a into one of
//! `dimensions` buckets with a hash-derived sign, and the resulting
//! term-frequency vector is L2-normalized. Texts sharing more words land
//! closer together, which is enough for demos, tests and keyword-heavy
//! corpora.

use async_trait::async_trait;

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// Default vector length, matching common sentence-transformer models.
pub const DEFAULT_DIMENSIONS: usize = 384;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Deterministic bag-of-words embeddings via the hashing trick.
#[derive(Debug, Clone, Copy)]
pub struct HashEmbeddingProvider {
    dimensions: usize,
}

impl HashEmbeddingProvider {
    /// Create a provider producing vectors of the given length.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `dimensions` is zero.
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(RagError::ConfigError("dimensions must be greater than zero".to_string()));
        }
        Ok(Self { dimensions })
    }

    /// The length of every vector this provider returns.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let hash = fnv1a(token.to_lowercase().as_bytes());
            let bucket = (hash % self.dimensions as u64) as usize;
            let sign = if hash >> 63 == 1 { -1.0 } else { 1.0 };
            vector[bucket] += sign;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

impl Default for HashEmbeddingProvider {
    fn default() -> Self {
        Self { dimensions: DEFAULT_DIMENSIONS }
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, b| (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME))
}

#[async_trait]
impl EmbeddingProvider for HashEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vectorize(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.vectorize(text)).collect())
    }

    fn name(&self) -> &str {
        "hashing"
    }
}
