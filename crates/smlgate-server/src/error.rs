//! Error types for the smlgate server.

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Gateway core error.
    #[error("core error: {0}")]
    Core(#[from] smlgate_core::Error),

    /// Bind address could not be parsed.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// JSON configuration error.
    #[error("config error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
