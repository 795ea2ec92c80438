use thiserror::Error;

/// Result type alias for teamskills-core
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types shared by the team skills crates
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error for file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Tool execution errors
    #[error("tool error: {0}")]
    Tool(String),

    /// Validation errors (bad arguments, unknown levels)
    #[error("validation error: {0}")]
    Validation(String),

    /// Store/query errors surfaced to callers that asked for them
    #[error("query error: {0}")]
    Query(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn tool(msg: impl Into<String>) -> Self {
        Self::Tool(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }
}
