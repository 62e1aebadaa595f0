use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration loading or validation failed.
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong.
        message: String,
    },

    /// A link store operation failed.
    #[error("Link store error: {0}")]
    LinkStore(#[from] LinkStoreError),

    /// Unexpected internal failure.
    #[error("Internal error: {message}")]
    Internal {
        /// What went wrong.
        message: String,
    },
}

/// Remote link store errors
#[derive(Debug, Error)]
pub enum LinkStoreError {
    /// The store stayed unreachable after exhausting retries.
    #[error("Link store unavailable: {message} (retries: {retries})")]
    Unavailable {
        /// Last underlying error.
        message: String,
        /// How many retries were attempted.
        retries: u32,
    },

    /// The store answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, if any.
        message: String,
    },

    /// The store answered with a body we could not parse.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Parse failure detail.
        message: String,
    },

    /// The request exceeded the configured timeout.
    #[error("Request timeout after {timeout_ms}ms")]
    Timeout {
        /// Configured timeout in milliseconds.
        timeout_ms: u64,
    },

    /// The referenced link does not exist in the store.
    #[error("Link not found: {link_id}")]
    LinkNotFound {
        /// The missing link id.
        link_id: String,
    },

    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encoding of a request payload failed.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for link store operations
pub type LinkStoreResult<T> = Result<T, LinkStoreError>;
