//! Ingestion error types.

use thiserror::Error;

/// Per-request error raised anywhere along the ingestion pipeline.
///
/// None of these are fatal to the listener: the offending request is logged
/// and answered, and the next request is served normally.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The `X-Gitlab-Token` header was absent or did not match the secret.
    #[error("invalid or missing gitlab token")]
    InvalidToken,

    /// None of the required GitLab headers were present.
    #[error("request carries none of the required gitlab headers")]
    MissingHeaders,

    /// A header value was not valid UTF-8 text.
    #[error("header {name} is not valid UTF-8")]
    InvalidHeader {
        /// The offending header name.
        name: String,
    },

    /// The body could not be read from the transport.
    #[error("request body could not be read: {0}")]
    UnreadableBody(String),

    /// The body exceeded the configured size limit.
    #[error("request body exceeds the {limit} byte limit")]
    PayloadTooLarge {
        /// The configured limit in bytes.
        limit: usize,
    },

    /// The body was not valid JSON, or a typed event did not match its shape.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The store rejected or failed the write.
    #[error("storage error: {0}")]
    Storage(String),
}
