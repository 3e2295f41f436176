//! HTTP error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use docqa_rag::RagError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// Errors returned by request handlers.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A pipeline error, mapped by kind.
    #[error(transparent)]
    Rag(#[from] RagError),

    /// The request body is not a format the server can read.
    #[error("unsupported content type: {0}")]
    UnsupportedMediaType(String),

    /// The document could not be read or contains no text.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// The request body is malformed.
    #[error("invalid request: {0}")]
    BadRequest(String),
}

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    /// Machine readable error code.
    pub error: String,
    /// Stage that failed (`ingest`, `request`, or a pipeline stage).
    pub stage: String,
    /// Human readable message.
    pub detail: String,
}

impl ServerError {
    /// The HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Rag(RagError::NotIndexed) => StatusCode::CONFLICT,
            ServerError::Rag(RagError::InvalidArgument(_) | RagError::ConfigError(_)) => {
                StatusCode::BAD_REQUEST
            }
            ServerError::Rag(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ServerError::InvalidDocument(_) | ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// The response body for this error.
    pub fn body(&self) -> ErrorBody {
        let (code, stage) = match self {
            ServerError::Rag(e @ RagError::NotIndexed) => ("not_indexed".into(), e.stage().to_string()),
            ServerError::Rag(e @ (RagError::InvalidArgument(_) | RagError::ConfigError(_))) => {
                ("invalid_argument".into(), e.stage().to_string())
            }
            ServerError::Rag(e) => (format!("{}_failed", e.stage()), e.stage().to_string()),
            ServerError::UnsupportedMediaType(_) => {
                ("unsupported_media_type".into(), "ingest".into())
            }
            ServerError::InvalidDocument(_) => ("invalid_document".into(), "ingest".into()),
            ServerError::BadRequest(_) => ("invalid_request".into(), "request".into()),
        };
        ErrorBody { error: code, stage, detail: self.to_string() }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(%status, error = %self, "request failed");
        }
        (status, Json(self.body())).into_response()
    }
}
