//! Error types for the query executor

use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reaching or querying the store
#[derive(Error, Debug)]
pub enum Error {
    /// SQLite database error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The pool has not been connected, or was disconnected
    #[error("Database not connected")]
    NotConnected,

    /// A row could not be decoded into the expected shape
    #[error("Failed to decode row: {0}")]
    Decode(String),

    /// Database corruption or schema mismatch
    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    ConnectionError(#[from] tokio_rusqlite::Error),
}

impl Error {
    /// Create a database error with a message
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a row decoding error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }
}

impl From<Error> for teamskills_core::Error {
    fn from(err: Error) -> Self {
        teamskills_core::Error::Query(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(Error::NotConnected.to_string(), "Database not connected");
        assert_eq!(Error::database("locked").to_string(), "Database error: locked");
        assert_eq!(Error::decode("missing column").to_string(), "Failed to decode row: missing column");
    }

    #[test]
    fn test_error_from_sqlite() {
        let sqlite_err = rusqlite::Error::InvalidPath("test path".into());
        let err: Error = sqlite_err.into();
        assert!(matches!(err, Error::Sqlite(_)));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_into_core_error() {
        let err: teamskills_core::Error = Error::NotConnected.into();
        assert!(matches!(err, teamskills_core::Error::Query(_)));
        assert!(err.to_string().contains("not connected"));
    }
}
