//! Quill API crate - axum HTTP server and route handlers.
//!
//! Exposes one chat session and one document session over a local REST API:
//! chat, PDF upload, document questions, configuration, and health.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
