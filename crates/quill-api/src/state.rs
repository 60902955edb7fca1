//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;

use quill_chat::ChatSession;
use quill_core::config::QuillConfig;
use quill_docs::DocumentSession;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks. Each session
/// sits behind an async mutex, so requests against the same session run one
/// at a time, including while the model is generating.
#[derive(Clone)]
pub struct AppState {
    /// Configuration the server was started with.
    pub config: Arc<QuillConfig>,
    pub chat: Arc<Mutex<ChatSession>>,
    pub docs: Arc<Mutex<DocumentSession>>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: QuillConfig, chat: ChatSession, docs: DocumentSession) -> Self {
        Self {
            config: Arc::new(config),
            chat: Arc::new(Mutex::new(chat)),
            docs: Arc::new(Mutex::new(docs)),
            start_time: Instant::now(),
        }
    }
}
