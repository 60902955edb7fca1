//! Router setup with all API routes and middleware.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use quill_core::config::QuillConfig;
use quill_core::error::QuillError;

use crate::handlers;
use crate::state::AppState;

/// Body limit for JSON endpoints.
const JSON_BODY_LIMIT: usize = 1024 * 1024;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS: only pages served from the local server's own origin.
    let port = state.config.server.port;
    let origins: Vec<HeaderValue> = [
        format!("http://127.0.0.1:{}", port),
        format!("http://localhost:{}", port),
    ]
    .iter()
    .filter_map(|o| HeaderValue::from_str(o).ok())
    .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let upload_limit = state.config.server.max_upload_mb.saturating_mul(1024 * 1024);

    let upload_routes = Router::new().route(
        "/api/documents",
        post(handlers::upload_document)
            .get(handlers::list_documents)
            .layer(DefaultBodyLimit::max(upload_limit)),
    );

    let json_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/api/config/models", get(handlers::models))
        .route("/api/chat", post(handlers::chat))
        .route("/api/chat/history", get(handlers::chat_history))
        .route("/api/documents/query", post(handlers::query_documents))
        .layer(DefaultBodyLimit::max(JSON_BODY_LIMIT));

    json_routes
        .merge(upload_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve the API on `server.host:server.port` until the process exits.
pub async fn start_server(config: &QuillConfig, state: AppState) -> Result<(), QuillError> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Starting API server on {}", addr);

    axum::serve(listener, router).await?;
    Ok(())
}
