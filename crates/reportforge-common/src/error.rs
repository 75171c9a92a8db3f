//! Common error types used throughout reportforge.
//!
//! This module provides a unified error type that covers the failure cases of
//! the persistence layer: missing documents, database failures, exhausted
//! local storage quota, and unreachable remote stores.

/// Common error type for reportforge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested document or record was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A bounded store has no room left for the write.
    ///
    /// Kept distinct from [`Error::Database`] so callers can react to a full
    /// store (by evicting) without treating every failure as a capacity issue.
    #[error("Capacity exceeded: {0}")]
    CapacityExceeded(String),

    /// A remote store could not be reached or answered with a failure.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new Database error.
    pub fn database<S: Into<String>>(msg: S) -> Self {
        Self::Database(msg.into())
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new CapacityExceeded error.
    pub fn capacity<S: Into<String>>(msg: S) -> Self {
        Self::CapacityExceeded(msg.into())
    }

    /// Create a new Unavailable error.
    pub fn unavailable<S: Into<String>>(msg: S) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns `true` for [`Error::CapacityExceeded`].
    pub fn is_capacity(&self) -> bool {
        matches!(self, Self::CapacityExceeded(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::not_found("laporan/abc");
        assert_eq!(err.to_string(), "Not found: laporan/abc");

        let err = Error::database("connection failed");
        assert_eq!(err.to_string(), "Database error: connection failed");

        let err = Error::invalid_input("bad format");
        assert_eq!(err.to_string(), "Invalid input: bad format");

        let err = Error::capacity("quota of 10 bytes");
        assert_eq!(err.to_string(), "Capacity exceeded: quota of 10 bytes");

        let err = Error::unavailable("503 from legacy store");
        assert_eq!(err.to_string(), "Store unavailable: 503 from legacy store");

        let err = Error::internal("unexpected state");
        assert_eq!(err.to_string(), "Internal error: unexpected state");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = Error::from(json_err);
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_is_capacity() {
        assert!(Error::capacity("full").is_capacity());
        assert!(!Error::database("locked").is_capacity());
        assert!(!Error::unavailable("down").is_capacity());
    }
}
