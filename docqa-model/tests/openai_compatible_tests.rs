//! Drives `OpenAICompatibleGenerator` against an in-process completions server.

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use docqa_model::{GenerationConfig, OpenAICompatibleGenerator};
use docqa_rag::{Generator, RagError};
use serde_json::{Value, json};

#[derive(Clone, Default)]
struct Captured {
    body: Arc<Mutex<Option<Value>>>,
    auth: Arc<Mutex<Option<String>>>,
}

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/v1")
}

async fn completions(
    State(captured): State<Captured>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    *captured.body.lock().unwrap() = Some(body);
    *captured.auth.lock().unwrap() =
        headers.get("authorization").and_then(|v| v.to_str().ok()).map(str::to_string);
    Json(json!({
        "id": "cmpl-1",
        "object": "text_completion",
        "choices": [{ "index": 0, "text": "  Paris is the capital.\n", "finish_reason": "stop" }]
    }))
}

#[tokio::test]
async fn sends_sampling_parameters_and_trims_reply() {
    let captured = Captured::default();
    let router =
        Router::new().route("/v1/completions", post(completions)).with_state(captured.clone());
    let base_url = spawn(router).await;

    let generator = OpenAICompatibleGenerator::new(&base_url, GenerationConfig::default())
        .unwrap()
        .with_api_key("secret");
    let answer = generator.generate("[INST] capital? [/INST]").await.unwrap();
    assert_eq!(answer, "Paris is the capital.");

    let body = captured.body.lock().unwrap().clone().unwrap();
    assert_eq!(body["prompt"], "[INST] capital? [/INST]");
    assert_eq!(body["max_tokens"], 128);
    assert_eq!(body["top_k"], 40);
    assert_eq!(body["stream"], false);
    assert_eq!(body["stop"], json!(["<s>", "[INST]", "[/INST]"]));
    assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    assert!((body["repeat_penalty"].as_f64().unwrap() - 1.1).abs() < 1e-6);
    assert_eq!(captured.auth.lock().unwrap().as_deref(), Some("Bearer secret"));
}

#[tokio::test]
async fn api_error_message_is_surfaced() {
    let router = Router::new().route(
        "/v1/completions",
        post(|| async {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": { "message": "model is loading" } })),
            )
        }),
    );
    let base_url = spawn(router).await;

    let generator = OpenAICompatibleGenerator::new(&base_url, GenerationConfig::default()).unwrap();
    let err = generator.generate("hi").await.unwrap_err();

    match err {
        RagError::GenerationError { backend, message } => {
            assert_eq!(backend, "openai-compatible:llama-2-7b-chat");
            assert!(message.contains("503"), "{message}");
            assert!(message.contains("model is loading"), "{message}");
        }
        other => panic!("expected GenerationError, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_choices_is_an_error() {
    let router = Router::new()
        .route("/v1/completions", post(|| async { Json(json!({ "choices": [] })) }));
    let base_url = spawn(router).await;

    let generator = OpenAICompatibleGenerator::new(&base_url, GenerationConfig::default()).unwrap();
    let err = generator.generate("hi").await.unwrap_err();
    assert!(matches!(err, RagError::GenerationError { .. }));
}
