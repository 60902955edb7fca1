//! Route handlers for the Quill API.

use axum::extract::{Multipart, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use quill_core::types::{Segment, Turn};
use quill_docs::IngestReport;

use crate::error::ApiError;
use crate::state::AppState;

/// Multipart field that carries the uploaded document.
const UPLOAD_FIELD: &str = "file";

// =============================================================================
// Request / response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub model: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub active: String,
    pub available: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub turns: Vec<Turn>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    /// `None` when the message was blank and nothing was sent.
    pub reply: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DocumentsResponse {
    pub documents_ingested: usize,
    pub segments: usize,
    pub documents: Vec<IngestReport>,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    /// `None` when the query was blank.
    pub answer: Option<String>,
    pub sources: Vec<Segment>,
}

// =============================================================================
// Handler functions
// =============================================================================

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        model: state.config.model.name.clone(),
    })
}

/// GET /api/config/models
pub async fn models(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        active: state.config.model.name.clone(),
        available: state.config.model.available_models.clone(),
    })
}

/// GET /api/chat/history
pub async fn chat_history(State(state): State<AppState>) -> Json<HistoryResponse> {
    let chat = state.chat.lock().await;
    Json(HistoryResponse {
        turns: chat.history().to_vec(),
    })
}

/// POST /api/chat
pub async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let mut chat = state.chat.lock().await;
    let reply = chat.send(&body.message).await?;
    Ok(Json(ChatResponse { reply }))
}

/// POST /api/documents - multipart upload with a single `file` field.
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IngestReport>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {}", e)))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!(field = ?field.name(), "Skipping multipart field");
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ApiError::BadRequest("'file' field has no file name".to_string()))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {}", e)))?;

        let mut docs = state.docs.lock().await;
        let report = docs.ingest(&bytes, &filename).await?;
        info!(
            document_id = %report.document_id,
            segments = report.segments,
            "Upload ingested"
        );
        return Ok(Json(report));
    }

    Err(ApiError::BadRequest(format!(
        "multipart body has no '{}' field",
        UPLOAD_FIELD
    )))
}

/// GET /api/documents
pub async fn list_documents(State(state): State<AppState>) -> Json<DocumentsResponse> {
    let docs = state.docs.lock().await;
    Json(DocumentsResponse {
        documents_ingested: docs.documents_ingested(),
        segments: docs.segment_count(),
        documents: docs.documents().to_vec(),
    })
}

/// POST /api/documents/query
///
/// Refused with 409 until at least one document has been ingested.
pub async fn query_documents(
    State(state): State<AppState>,
    Json(body): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    let docs = state.docs.lock().await;
    if body.query.trim().is_empty() {
        return Ok(Json(QueryResponse {
            answer: None,
            sources: Vec::new(),
        }));
    }
    if docs.documents_ingested() == 0 {
        return Err(ApiError::Conflict(
            "upload a PDF document before asking questions".to_string(),
        ));
    }

    let response = match docs.ask(&body.query).await? {
        Some(answer) => QueryResponse {
            answer: Some(answer.text),
            sources: answer.sources,
        },
        None => QueryResponse {
            answer: None,
            sources: Vec::new(),
        },
    };
    Ok(Json(response))
}
