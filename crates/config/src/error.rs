//! Config Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration loading.
pub type Result<T> = std::result::Result<T, Error>;

/// Every configuration error is fatal before any work starts; the kinds only
/// tell the user where to look.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("config file not found: {}", _0.display())]
    FileNotFound(#[error(not(source))] PathBuf),
    #[display("invalid configuration")]
    Invalid,
    #[display("invalid value for {_0}: {_1}")]
    Validation(#[error(not(source))] &'static str, #[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
