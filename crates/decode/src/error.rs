//! Decode Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A decode error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for decode operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The page envelope is missing its root record; nothing can be decoded.
    #[display("invalid page envelope: missing root record")]
    InvalidEnvelope,
    /// A required field could not be found in a record.
    #[display("missing required field: {_0}")]
    MissingField(#[error(not(source))] &'static str),
    /// A field was found but could not be parsed.
    #[display("failed to parse field '{field}', found value: {value}")]
    ParseError {
        /// The field that failed to parse.
        field: &'static str,
        /// Details about the parsing failure.
        value: String,
    },
    /// The media origin code is not one of the known origins.
    #[display("unknown media origin code: {_0}")]
    UnknownOrigin(#[error(not(source))] i64),
    /// A scaled numeric value does not fit the width of its encoding.
    #[display("value for '{field}' does not fit its encoding: {value}")]
    InvalidWidth {
        /// The field holding the scaled value.
        field: &'static str,
        /// The raw value that was out of range.
        value: i64,
    },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Decoding is pure: the same input always fails the same way.
        false
    }
}
