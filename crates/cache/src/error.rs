//! Cache Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A cache error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Reading a snapshot never fails (an unreadable snapshot is an empty cache),
/// so every kind here is about writing one.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("cannot create cache directory: {}", _0.display())]
    CreateDirectory(#[error(not(source))] PathBuf),
    #[display("cannot serialize cache snapshot")]
    Serialize,
    #[display("cannot write cache snapshot: {}", _0.display())]
    Write(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Write(_))
    }
}
