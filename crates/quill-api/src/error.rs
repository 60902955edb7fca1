//! API error types and JSON error response formatting.
//!
//! ApiError provides a consistent JSON error response format across all
//! endpoints, mapping internal errors to HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::warn;

use quill_core::error::QuillError;

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request", "conflict").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 400 - missing or invalid parameters.
    #[error("{0}")]
    BadRequest(String),
    /// 409 - the session is not ready for this request.
    #[error("{0}")]
    Conflict(String),
    /// 415 - uploaded file is not a supported document.
    #[error("{0}")]
    UnsupportedMediaType(String),
    /// 422 - document could not be processed.
    #[error("{0}")]
    UnprocessableEntity(String),
    /// 500
    #[error("{0}")]
    Internal(String),
    /// 502 - the model server answered with an error.
    #[error("{0}")]
    BadGateway(String),
    /// 503 - the model server cannot be reached.
    #[error("{0}")]
    ServiceUnavailable(String),
    /// 504 - the model server did not answer in time.
    #[error("{0}")]
    GatewayTimeout(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Conflict(_) => "conflict",
            ApiError::UnsupportedMediaType(_) => "unsupported_media_type",
            ApiError::UnprocessableEntity(_) => "unprocessable_entity",
            ApiError::Internal(_) => "internal_error",
            ApiError::BadGateway(_) => "bad_gateway",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
            ApiError::GatewayTimeout(_) => "gateway_timeout",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(status = status.as_u16(), error = %self, "Request failed");
        }

        let body = ErrorBody {
            error: self.code().to_string(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<QuillError> for ApiError {
    fn from(err: QuillError) -> Self {
        let message = err.to_string();
        match err {
            QuillError::EndpointUnavailable(_) => ApiError::ServiceUnavailable(message),
            QuillError::GenerationTimeout(_) => ApiError::GatewayTimeout(message),
            QuillError::UnsupportedFormat(_) => ApiError::UnsupportedMediaType(message),
            QuillError::ExtractionFailed(_) => ApiError::UnprocessableEntity(message),
            QuillError::Generation(_) => ApiError::BadGateway(message),
            _ => ApiError::Internal(message),
        }
    }
}
