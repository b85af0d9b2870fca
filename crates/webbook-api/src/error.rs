//! Webbook: API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use webbook_core::error::IngestError;
use webbook_event_store::StoreError;

/// Startup errors for the listener. Any of these stops the process.
#[derive(Debug, Error)]
pub enum AppError {
    /// An environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The delivery store could not be opened or initialized.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The log file could not be opened for appending.
    #[error("cannot open log file {path}: {source}")]
    LogSink {
        /// The configured log file path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A metric could not be registered.
    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP status and machine-readable code for an ingestion error.
#[must_use]
pub fn classify_error(err: &IngestError) -> (StatusCode, &'static str) {
    match err {
        IngestError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token"),
        IngestError::MissingHeaders => (StatusCode::BAD_REQUEST, "missing_gitlab_headers"),
        IngestError::InvalidHeader { .. } => (StatusCode::BAD_REQUEST, "invalid_header"),
        IngestError::UnreadableBody(_) => (StatusCode::BAD_REQUEST, "body_unreadable"),
        IngestError::PayloadTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"),
        IngestError::MalformedPayload(_) => (StatusCode::BAD_REQUEST, "malformed_payload"),
        IngestError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
    }
}

/// HTTP-layer wrapper around `IngestError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub IngestError);

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = classify_error(&self.0);

        let body = ErrorBody {
            error: error_code,
            message: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
