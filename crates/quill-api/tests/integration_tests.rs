//! Integration tests for the Quill API.
//!
//! Each test builds its own router over fresh sessions backed by mock
//! generation and embedding services.

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use quill_api::error::ErrorBody;
use quill_api::handlers::{
    ChatResponse, HealthResponse, HistoryResponse, ModelsResponse, QueryResponse,
};
use quill_api::{create_router, AppState};
use quill_chat::ChatSession;
use quill_core::config::QuillConfig;
use quill_core::error::QuillError;
use quill_core::types::{Prompt, Role};
use quill_docs::{
    AnswerAssembler, DocumentSession, DocumentStorage, IngestionPipeline, PdfExtractor,
    TextExtractor, TextSplitter,
};
use quill_llm::MockGeneration;
use quill_vector::{MockEmbedding, SegmentStore};

// =============================================================================
// Helpers
// =============================================================================

const BOUNDARY: &str = "quill-test-boundary";

/// Reads uploads as UTF-8 text so tests need no real PDF files.
struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn check_format(&self, bytes: &[u8]) -> Result<(), QuillError> {
        std::str::from_utf8(bytes)
            .map(|_| ())
            .map_err(|_| QuillError::UnsupportedFormat("not UTF-8 text".into()))
    }

    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>, QuillError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| QuillError::ExtractionFailed(e.to_string()))?;
        Ok(vec![text.to_string()])
    }
}

struct TestApp {
    state: AppState,
    generation: Arc<MockGeneration>,
    _storage: tempfile::TempDir,
}

impl TestApp {
    fn router(&self) -> axum::Router {
        create_router(self.state.clone())
    }
}

fn make_app_with(generation: MockGeneration, extractor: Arc<dyn TextExtractor>) -> TestApp {
    let storage = tempfile::tempdir().unwrap();
    let config = QuillConfig::default();
    let generation = Arc::new(generation);

    let chat = ChatSession::from_config(&config.chat, generation.clone());
    let docs = make_docs(&config, storage.path(), generation.clone(), extractor);

    TestApp {
        state: AppState::new(config, chat, docs),
        generation,
        _storage: storage,
    }
}

fn make_docs(
    config: &QuillConfig,
    dir: &Path,
    generation: Arc<MockGeneration>,
    extractor: Arc<dyn TextExtractor>,
) -> DocumentSession {
    let store = SegmentStore::new(Arc::new(MockEmbedding::new()));
    let pipeline = IngestionPipeline::new(
        DocumentStorage::new(dir),
        extractor,
        TextSplitter::new(config.documents.chunk_size, config.documents.chunk_overlap).unwrap(),
        store.clone(),
    );
    let answerer = AnswerAssembler::from_config(&config.documents, store, generation);
    DocumentSession::new(pipeline, answerer)
}

fn make_app() -> TestApp {
    make_app_with(
        MockGeneration::replying("mock reply"),
        Arc::new(PlainTextExtractor),
    )
}

fn post_json(uri: &str, json: &str) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

/// Build a multipart upload with a single field.
fn upload(field: &str, filename: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/pdf\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::post("/api/documents")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Read full response body bytes.
async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap()
        .to_vec()
}

// =============================================================================
// Health and configuration
// =============================================================================

#[tokio::test]
async fn test_health_happy_path() {
    let app = make_app();
    let resp = app.router().oneshot(get("/health")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let health: HealthResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.model, "deepseek-r1:8b");
}

#[tokio::test]
async fn test_models_lists_active_and_available() {
    let app = make_app();
    let resp = app.router().oneshot(get("/api/config/models")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let models: ModelsResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(models.active, "deepseek-r1:8b");
    assert!(models.available.contains(&models.active));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = make_app();
    let resp = app.router().oneshot(get("/api/nope")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Chat
// =============================================================================

#[tokio::test]
async fn test_history_starts_with_greeting() {
    let app = make_app();
    let resp = app.router().oneshot(get("/api/chat/history")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let history: HistoryResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(history.turns.len(), 1);
    assert_eq!(history.turns[0].role, Role::Assistant);
    assert_eq!(history.turns[0].text, "Hello, how can I help?");
}

#[tokio::test]
async fn test_chat_reply_and_history() {
    let app = make_app();
    let resp = app
        .router()
        .oneshot(post_json(
            "/api/chat",
            r#"{"message": "Write a function that adds two numbers"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let chat: ChatResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(chat.reply.as_deref(), Some("mock reply"));

    match app.generation.last_prompt() {
        Some(Prompt::Messages(messages)) => {
            assert_eq!(messages.len(), 3);
            assert_eq!(messages[0].role, Role::System);
            assert_eq!(messages[2].content, "Write a function that adds two numbers");
        }
        other => panic!("expected a message prompt, got {other:?}"),
    }

    let resp = app.router().oneshot(get("/api/chat/history")).await.unwrap();
    let history: HistoryResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(history.turns.len(), 3);
    assert_eq!(history.turns[2].text, "mock reply");
}

#[tokio::test]
async fn test_empty_chat_message_returns_null_reply() {
    let app = make_app();
    let resp = app
        .router()
        .oneshot(post_json("/api/chat", r#"{"message": "   "}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert!(body["reply"].is_null());
    assert_eq!(app.generation.call_count(), 0);
}

#[tokio::test]
async fn test_chat_endpoint_down_is_503_and_history_unchanged() {
    let app = make_app_with(MockGeneration::unavailable(), Arc::new(PlainTextExtractor));
    let resp = app
        .router()
        .oneshot(post_json("/api/chat", r#"{"message": "hello"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let err: ErrorBody = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(err.error, "service_unavailable");

    let resp = app.router().oneshot(get("/api/chat/history")).await.unwrap();
    let history: HistoryResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(history.turns.len(), 1);
}

#[tokio::test]
async fn test_chat_timeout_is_504() {
    let app = make_app_with(MockGeneration::timing_out(300), Arc::new(PlainTextExtractor));
    let resp = app
        .router()
        .oneshot(post_json("/api/chat", r#"{"message": "hello"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn test_chat_malformed_json_is_client_error() {
    let app = make_app();
    let resp = app
        .router()
        .oneshot(post_json("/api/chat", r#"{"text": "wrong field"}"#))
        .await
        .unwrap();
    assert!(resp.status().is_client_error());
}

// =============================================================================
// Documents
// =============================================================================

#[tokio::test]
async fn test_query_before_ingestion_is_409() {
    let app = make_app();
    let resp = app
        .router()
        .oneshot(post_json(
            "/api/documents/query",
            r#"{"query": "What is the refund policy?"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(app.generation.call_count(), 0);
}

#[tokio::test]
async fn test_upload_then_query() {
    let app = make_app_with(
        MockGeneration::replying("Within 30 days."),
        Arc::new(PlainTextExtractor),
    );

    let resp = app
        .router()
        .oneshot(upload(
            "file",
            "policy.pdf",
            b"Refunds are processed within 30 days.",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let report: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(report["document_id"], "policy.pdf");
    assert_eq!(report["pages"], 1);
    assert_eq!(report["segments"], 1);

    let resp = app
        .router()
        .oneshot(post_json(
            "/api/documents/query",
            r#"{"query": "What is the refund policy?"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let answer: QueryResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(answer.answer.as_deref(), Some("Within 30 days."));
    assert_eq!(answer.sources.len(), 1);
    assert_eq!(answer.sources[0].source_document_id, "policy.pdf");

    match app.generation.last_prompt() {
        Some(Prompt::Text(text)) => {
            assert!(text.contains("What is the refund policy?"));
            assert!(text.contains("Refunds are processed within 30 days."));
        }
        other => panic!("expected a text prompt, got {other:?}"),
    }
}

#[tokio::test]
async fn test_list_documents_counts_repeats() {
    let app = make_app();
    for _ in 0..2 {
        let resp = app
            .router()
            .oneshot(upload("file", "same.pdf", b"identical contents"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = app.router().oneshot(get("/api/documents")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(body["documents_ingested"], 2);
    assert_eq!(body["segments"], 2);
    assert_eq!(body["documents"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_empty_query_returns_null_answer() {
    let app = make_app();
    let resp = app
        .router()
        .oneshot(post_json("/api/documents/query", r#"{"query": ""}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert!(body["answer"].is_null());
}

#[tokio::test]
async fn test_non_pdf_upload_is_415() {
    let app = make_app_with(MockGeneration::default(), Arc::new(PdfExtractor::new()));
    let resp = app
        .router()
        .oneshot(upload("file", "notes.pdf", b"just some plain notes"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let err: ErrorBody = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(err.error, "unsupported_media_type");

    let resp = app.router().oneshot(get("/api/documents")).await.unwrap();
    let body: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(body["documents_ingested"], 0);
}

#[tokio::test]
async fn test_corrupt_pdf_is_422() {
    let app = make_app_with(MockGeneration::default(), Arc::new(PdfExtractor::new()));
    let resp = app
        .router()
        .oneshot(upload("file", "broken.pdf", b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_upload_without_file_field_is_400() {
    let app = make_app();
    let resp = app
        .router()
        .oneshot(upload("attachment", "policy.pdf", b"text"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
