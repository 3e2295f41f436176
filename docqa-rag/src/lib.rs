//! # docqa-rag
//!
//! Answer questions about a document with retrieval-augmented generation.
//!
//! ```text
//! text ─► SentenceChunker ─► Retriever::build ──► VectorIndex
//!                                 │ EmbeddingProvider  ▲
//! query ─► RagPipeline::process ─► Retriever::search ──┘
//!                │
//!                └─► PromptTemplate ─► Generator ─► PipelineResult
//! ```
//!
//! The index is exact: every query is compared against every chunk by
//! squared Euclidean distance, and scores are `1 / (1 + distance)`.
//! Embedding and generation backends sit behind the [`EmbeddingProvider`]
//! and [`Generator`] traits.
//!
//! ## Features
//!
//! - `openai` - [`openai::OpenAIEmbeddingProvider`] for OpenAI-compatible
//!   embedding servers.

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod hashing;
pub mod index;
#[cfg(feature = "openai")]
pub mod openai;
pub mod pipeline;
pub mod prompt;

pub use chunking::{Chunker, SentenceChunker, chunk_text};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Chunk, PipelineResult, RetrievalResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result, Stage};
pub use generation::Generator;
pub use hashing::HashEmbeddingProvider;
pub use index::{IndexState, Retriever, VectorIndex};
pub use pipeline::{RagPipeline, RagPipelineBuilder};
pub use prompt::PromptTemplate;
