//! Error types for the voice assistant.

/// Top-level error type for the assistant and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    /// Speech recognition capability failure.
    #[error("recognition error: {0}")]
    Recognition(String),

    /// Speech synthesis capability failure.
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// A recognition session is already running.
    #[error("recognition session already active")]
    AlreadyActive,

    /// The platform capability is absent.
    #[error("{0} unavailable")]
    Unavailable(&'static str),

    /// AI completion collaborator failure.
    #[error("AI error: {0}")]
    Ai(String),

    /// Document read failure.
    #[error("document error: {0}")]
    Document(String),

    /// Key-value store failure.
    #[error("store error: {0}")]
    Store(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Channel send/receive error.
    #[error("channel error: {0}")]
    Channel(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AssistantError>;
