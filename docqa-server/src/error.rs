//! Mapping of core errors onto HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use docqa_rag::RagError;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    pub retryable: bool,
}

/// A request-scoped failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub retryable: bool,
}

impl ApiError {
    /// A 400 response for a malformed request.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into(), retryable: false }
    }
}

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        let status = match &err {
            e if e.is_invalid_input() => StatusCode::BAD_REQUEST,
            RagError::EmbeddingError { retryable: true, .. }
            | RagError::SynthesisError { .. }
            | RagError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            RagError::EmbeddingError { .. } => StatusCode::BAD_GATEWAY,
            RagError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let retryable = err.is_retryable() || matches!(err, RagError::NotReady);
        Self { status, message: err.to_string(), retryable }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, error = %self.message, "request failed");
        } else {
            warn!(status = %self.status, error = %self.message, "request rejected");
        }
        let body = ErrorBody { error: self.message, retryable: self.retryable };
        (self.status, Json(body)).into_response()
    }
}
