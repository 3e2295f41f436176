//! # docqa-server
//!
//! HTTP API for asking questions about an uploaded document.
//!
//! | Route | Body | Response |
//! |-------|------|----------|
//! | `POST /documents` | `text/plain`, `application/json` `{text}`, `application/pdf` or a multipart file | `{message, chunks}` |
//! | `POST /upload` | alias of `/documents` | |
//! | `POST /query` | `{text, k?}` | `{query, response, retrieved_documents: [{id, document, score}]}` |
//! | `GET /health` | | `{status, indexed, chunks}` |
//!
//! Errors are JSON `{error, stage, detail}`. Querying before a document is
//! uploaded returns `409 not_indexed`.

pub mod backend;
pub mod error;
pub mod ingest;
pub mod server;

pub use backend::BackendConfig;
pub use error::{ErrorBody, ServerError};
pub use server::{AppState, ServerConfig, app_router, run_server};
