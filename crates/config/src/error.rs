use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, PartialEq, Eq)]
pub enum ErrorKind {
    /// A configuration source could not be read or did not match the schema.
    #[display("could not load configuration")]
    Load,
    /// No cache path was configured and the platform has no cache directory.
    #[display("no cache directory available on this platform")]
    NoCacheDirectory,
}

impl ErrorKind {
    pub fn is_retryable(&self) -> bool {
        false
    }
}
