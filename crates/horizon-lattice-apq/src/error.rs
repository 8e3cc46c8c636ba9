//! Error types for the persisted query pipeline.

/// A specialized Result type for persisted query operations.
pub type Result<T> = std::result::Result<T, NetworkError>;

/// Errors raised while executing a GraphQL request through the pipeline.
///
/// `Configuration` and `ProtocolMisuse` are raised by the persisted query
/// transform before any network I/O. The remaining variants come from the
/// transport and pass through every middleware unchanged.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NetworkError {
    /// The operation has no identity: no id and no hash function plus query text.
    #[error("{0}")]
    Configuration(String),

    /// The request shape is not supported by a pipeline stage (e.g. batching).
    #[error("{0}")]
    ProtocolMisuse(String),

    /// HTTP request failed.
    #[error("HTTP request error: {0}")]
    Request(String),

    /// Invalid or missing URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Request timed out.
    #[error("Request timed out")]
    Timeout,

    /// Connection refused or failed.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Invalid header name or value.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// Invalid response body.
    #[error("Invalid response body: {0}")]
    InvalidBody(String),

    /// HTTP error status (4xx or 5xx).
    #[error("HTTP {status}{}", status_suffix(.message))]
    HttpStatus {
        /// The HTTP status code.
        status: u16,
        /// Optional error message from the response body.
        message: Option<String>,
    },
}

fn status_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|msg| format!(": {msg}"))
        .unwrap_or_default()
}

impl NetworkError {
    /// Check if this is a configuration error raised before any network call.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Check if this error rejects an unsupported request shape.
    pub fn is_protocol_misuse(&self) -> bool {
        matches!(self, Self::ProtocolMisuse(_))
    }
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else if err.is_decode() {
            Self::InvalidBody(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

impl From<url::ParseError> for NetworkError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl From<serde_json::Error> for NetworkError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<http::header::InvalidHeaderName> for NetworkError {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

impl From<http::header::InvalidHeaderValue> for NetworkError {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}
