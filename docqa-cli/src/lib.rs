//! # docqa-cli
//!
//! The `docqa` command line tool.
//!
//! ```bash
//! # Show how a document is split
//! docqa chunk report.pdf --size 512
//!
//! # One question, answered by a local llama.cpp server
//! docqa ask report.pdf "What is the main finding?" -k 3
//!
//! # Interactive session, offline (prints the prompt instead of calling a model)
//! docqa ask notes.txt --offline
//!
//! # HTTP API on port 8000
//! docqa serve --preload report.pdf
//! ```

pub mod cli;
pub mod commands;

pub use cli::{BackendArgs, Cli, Commands};
