//! Facade Error Types
//!
//! Each kind names the layer that failed; the underlying crate error is kept
//! as the source in the `exn` error tree.

use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, PartialEq, Eq)]
pub enum ErrorKind {
    /// Configuration could not be loaded or resolved.
    #[display("configuration error")]
    Config,
    /// Opening, reading or writing the cache failed.
    #[display("cache error")]
    Cache,
    /// The page envelope itself could not be decoded.
    #[display("page decode error")]
    Decode,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
