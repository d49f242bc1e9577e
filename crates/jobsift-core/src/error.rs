use thiserror::Error;

/// Application-wide error types for jobsift.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// The source answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Response body did not have the expected shape.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A CSS selector could not be compiled.
    #[error("Selector error: {0}")]
    SelectorError(String),

    /// Caller broke a precondition (e.g. empty query).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Requested record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or malformed configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Writing an export file failed.
    #[error("Export error: {0}")]
    ExportError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Returns true if this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::NetworkError(_) | AppError::Timeout(_) => true,
            AppError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            AppError::HttpError(msg) => {
                msg.contains("timeout") || msg.contains("connect") || msg.contains("reset")
            }
            _ => false,
        }
    }

    /// Returns true for failures of the transport or of the remote response,
    /// as opposed to caller or local environment mistakes.
    pub fn is_source_failure(&self) -> bool {
        matches!(
            self,
            AppError::HttpError(_)
                | AppError::HttpStatus { .. }
                | AppError::Timeout(_)
                | AppError::NetworkError(_)
                | AppError::ParseError(_)
                | AppError::SerializationError(_)
        )
    }
}
