//! Cache Error Types
//!
//! Structured errors using `exn` for automatic location tracking, matching the
//! decoder crate.

use derive_more::{Display, Error};

/// A cache error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, PartialEq, Eq)]
pub enum ErrorKind {
    /// The store could not be opened, queried or written.
    #[display("database error")]
    Database,
    #[display("database migration error")]
    Migration,
    /// A value could not be converted between its record and row representation.
    #[display("invalid cache data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    ///
    /// Database errors are usually lock contention (`SQLITE_BUSY`) from another
    /// session writing to the same file.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_database_errors_are_retryable() {
        assert!(ErrorKind::Database.is_retryable());
        assert!(!ErrorKind::Migration.is_retryable());
        assert!(!ErrorKind::InvalidData("origin").is_retryable());
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorKind::InvalidData("origin").to_string(), "invalid cache data: origin");
    }
}
