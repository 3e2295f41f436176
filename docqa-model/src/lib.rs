//! # docqa-model
//!
//! Text generation backends implementing [`docqa_rag::Generator`].
//!
//! - [`OpenAICompatibleGenerator`] - any server speaking the OpenAI
//!   completions API (llama.cpp server, vLLM, Ollama, OpenAI)
//! - [`MockGenerator`] - canned, echo or failing replies for tests
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docqa_model::{GenerationConfig, OpenAICompatibleGenerator};
//!
//! let generator = OpenAICompatibleGenerator::new(
//!     docqa_model::openai::LLAMA_CPP_API_BASE,
//!     GenerationConfig::default(),
//! )?;
//! ```
//!
//! ## Features
//!
//! - `openai` (default) - [`OpenAICompatibleGenerator`]

pub mod config;
pub mod mock;
#[cfg(feature = "openai")]
pub mod openai;

pub use config::GenerationConfig;
pub use mock::MockGenerator;
#[cfg(feature = "openai")]
pub use openai::OpenAICompatibleGenerator;
