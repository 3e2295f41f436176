use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use docqa_model::GenerationConfig;
use docqa_server::BackendConfig;

#[derive(Parser, Debug)]
#[command(name = "docqa")]
#[command(about = "Ask questions about a document with retrieval-augmented generation")]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Split a document into chunks and print them
    Chunk {
        /// Document to chunk (.txt, .md, .json or .pdf)
        input: PathBuf,

        /// Target chunk length in characters
        #[arg(long, default_value_t = docqa_rag::chunking::DEFAULT_TARGET_SIZE)]
        size: usize,
    },

    /// Index a document and answer questions about it
    Ask {
        /// Document to index (.txt, .md, .json or .pdf)
        input: PathBuf,

        /// Question to answer; omit for an interactive session
        question: Option<String>,

        /// Number of passages to retrieve
        #[arg(short, long, default_value_t = docqa_rag::config::DEFAULT_TOP_K)]
        k: usize,

        /// Target chunk length in characters
        #[arg(long, default_value_t = docqa_rag::chunking::DEFAULT_TARGET_SIZE)]
        chunk_size: usize,

        /// Use the "Context information is below" prompt instead of the
        /// Llama-2 chat prompt
        #[arg(long)]
        plain_prompt: bool,

        #[command(flatten)]
        backend: BackendArgs,
    },

    /// Run the HTTP API
    Serve {
        #[arg(long, env = "DOCQA_HOST", default_value = "127.0.0.1")]
        host: String,

        #[arg(short, long, env = "DOCQA_PORT", default_value_t = 8000)]
        port: u16,

        /// Document to index before accepting requests
        #[arg(long)]
        preload: Option<PathBuf>,

        #[command(flatten)]
        backend: BackendArgs,
    },
}

/// Embedding and generation backend selection.
#[derive(Args, Debug, Clone)]
pub struct BackendArgs {
    /// OpenAI-compatible embeddings endpoint; local hashing when unset
    #[arg(long, env = "DOCQA_EMBEDDING_URL")]
    pub embedding_url: Option<String>,

    #[arg(long, env = "DOCQA_EMBEDDING_MODEL", default_value = "nomic-embed-text")]
    pub embedding_model: String,

    /// OpenAI-compatible completions endpoint
    #[arg(long, env = "DOCQA_GENERATION_URL", default_value = docqa_model::openai::LLAMA_CPP_API_BASE)]
    pub generation_url: String,

    #[arg(long, env = "DOCQA_GENERATION_MODEL", default_value = "llama-2-7b-chat")]
    pub generation_model: String,

    #[arg(long, default_value_t = 128)]
    pub max_tokens: u32,

    #[arg(long, default_value_t = 0.7)]
    pub temperature: f32,

    /// Skip the model and print the assembled prompt as the answer
    #[arg(long, env = "DOCQA_OFFLINE")]
    pub offline: bool,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

impl BackendArgs {
    pub fn to_config(&self) -> BackendConfig {
        BackendConfig {
            embedding_url: self.embedding_url.clone().filter(|u| !u.is_empty()),
            embedding_model: self.embedding_model.clone(),
            generation_url: self.generation_url.clone(),
            generation: GenerationConfig::new(&self.generation_model)
                .with_max_tokens(self.max_tokens)
                .with_temperature(self.temperature),
            offline: self.offline,
            api_key: self.api_key.clone().filter(|k| !k.is_empty()),
            ..Default::default()
        }
    }
}
