//! HTTP API: document upload, question answering and health.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::{Json, Router};
use docqa_rag::{PipelineResult, RagPipeline};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::ServerError;
use crate::ingest::{self, DocumentFormat};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RagPipeline>,
}

impl AppState {
    pub fn new(pipeline: RagPipeline) -> Self {
        Self { pipeline: Arc::new(pipeline) }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body.
    pub max_body_bytes: usize,
    /// Browser origins allowed by CORS. `*` allows any origin.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_body_bytes: 20 * 1024 * 1024,
            cors_origins: vec![
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `DOCQA_HOST`, `DOCQA_PORT`,
    /// `DOCQA_MAX_BODY_BYTES` and `DOCQA_CORS_ORIGINS` (comma separated).
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(host) = std::env::var("DOCQA_HOST") {
            config.host = host;
        }
        if let Some(port) = std::env::var("DOCQA_PORT").ok().and_then(|v| v.parse().ok()) {
            config.port = port;
        }
        if let Some(max) =
            std::env::var("DOCQA_MAX_BODY_BYTES").ok().and_then(|v| v.parse().ok())
        {
            config.max_body_bytes = max;
        }
        if let Ok(origins) = std::env::var("DOCQA_CORS_ORIGINS") {
            config.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }
        config
    }

    fn cors_layer(&self) -> CorsLayer {
        let layer = CorsLayer::new().allow_methods([Method::GET, Method::POST]).allow_headers(Any);
        if self.cors_origins.iter().any(|o| o == "*") {
            return layer.allow_origin(Any);
        }
        let origins: Vec<HeaderValue> = self
            .cors_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(%origin, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

// ── wire types ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestResponse {
    pub message: String,
    pub chunks: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub text: String,
    /// Passages to retrieve. Defaults to the pipeline's `top_k`.
    #[serde(default)]
    pub k: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedDocument {
    pub id: usize,
    pub document: String,
    pub score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryResponse {
    pub query: String,
    pub response: String,
    pub retrieved_documents: Vec<RetrievedDocument>,
}

impl From<PipelineResult> for QueryResponse {
    fn from(result: PipelineResult) -> Self {
        Self {
            query: result.query,
            response: result.response,
            retrieved_documents: result
                .retrieved
                .into_iter()
                .map(|r| RetrievedDocument { id: r.chunk.id, document: r.chunk.text, score: r.score })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub indexed: bool,
    pub chunks: usize,
}

// ── router ─────────────────────────────────────────────────────────

/// Build the router with CORS and body limits from `config`.
pub fn app_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/documents", post(upload_document))
        .route("/upload", post(upload_document))
        .route("/query", post(query))
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(config.cors_layer())
        .layer(TraceLayer::new_for_http())
}

/// Bind `config.host:config.port` and serve until the process exits.
pub async fn run_server(config: ServerConfig, pipeline: RagPipeline) -> anyhow::Result<()> {
    let app = app_router(AppState::new(pipeline), &config);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid host/port {}:{}", config.host, config.port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("docqa listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

// ── handlers ───────────────────────────────────────────────────────

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let retriever = state.pipeline.retriever();
    Json(HealthResponse {
        status: "healthy".to_string(),
        indexed: retriever.is_built().await,
        chunks: retriever.chunk_count().await,
    })
}

async fn upload_document(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<IngestResponse>, ServerError> {
    let content_type =
        request.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()).map(str::to_string);

    let text = match content_type.as_deref() {
        Some(ct) if ct.starts_with("multipart/form-data") => {
            let multipart = Multipart::from_request(request, &())
                .await
                .map_err(|e| ServerError::BadRequest(e.body_text()))?;
            text_from_multipart(multipart).await?
        }
        _ => {
            let body = Bytes::from_request(request, &())
                .await
                .map_err(|e| ServerError::BadRequest(e.body_text()))?;
            let format = DocumentFormat::detect(content_type.as_deref(), &body)?;
            ingest::extract_text(format, &body)?
        }
    };

    // Rejected before the retriever is touched so the loaded index survives.
    let chunks = state.pipeline.chunk(&text);
    if !has_words(&chunks) {
        return Err(ServerError::InvalidDocument("document contains no text".into()));
    }

    let chunks = state.pipeline.ingest_chunks(chunks).await?;
    info!(text_len = text.len(), chunks, "document processed");
    Ok(Json(IngestResponse { message: "Document processed successfully".to_string(), chunks }))
}

/// Whether any chunk holds a letter or digit. Delimiter residue such as `"."`
/// does not count.
fn has_words(chunks: &[String]) -> bool {
    chunks.iter().any(|chunk| chunk.chars().any(char::is_alphanumeric))
}

/// Read the first file field of a form upload.
async fn text_from_multipart(mut multipart: Multipart) -> Result<String, ServerError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(e.body_text()))?
        .ok_or_else(|| ServerError::BadRequest("multipart body has no file field".into()))?;

    let file_name = field.file_name().map(str::to_string);
    let field_type = field.content_type().map(str::to_string);
    let body = field.bytes().await.map_err(|e| ServerError::BadRequest(e.body_text()))?;

    let format = match file_name.as_deref() {
        Some(name) if name.to_ascii_lowercase().ends_with(".pdf") => DocumentFormat::Pdf,
        _ => DocumentFormat::detect(field_type.as_deref(), &body)?,
    };
    ingest::extract_text(format, &body)
}

async fn query(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ServerError> {
    let Json(request) = payload.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    let k = request.k.unwrap_or(state.pipeline.config().top_k);
    let result = state.pipeline.process_with_k(&request.text, k).await?;
    Ok(Json(result.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_allows_local_ui() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8000);
        assert!(config.cors_origins.contains(&"http://localhost:5173".to_string()));
    }

    #[test]
    fn delimiter_residue_is_not_text() {
        assert!(!has_words(&[]));
        assert!(!has_words(&[".".to_string(), ". .".to_string()]));
        assert!(has_words(&[".".to_string(), "Paris.".to_string()]));
    }

    #[test]
    fn query_request_k_is_optional() {
        let request: QueryRequest = serde_json::from_str(r#"{"text": "why?"}"#).unwrap();
        assert_eq!(request.k, None);
        let request: QueryRequest = serde_json::from_str(r#"{"text": "why?", "k": 5}"#).unwrap();
        assert_eq!(request.k, Some(5));
    }
}
