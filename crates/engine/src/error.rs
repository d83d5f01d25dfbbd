//! Engine Error Types
//!
//! Per-file failures are reported alongside the file they belong to and never
//! stop a run; only [`ErrorKind::Filter`] and [`ErrorKind::DeleteRefused`] are
//! raised before any work starts.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An engine error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// An include or exclude pattern is not a valid glob.
    #[display("invalid glob pattern: {_0:?}")]
    Filter(#[error(not(source))] String),
    /// Remote state for a key could not be determined.
    #[display("cannot inspect remote object: {_0}")]
    Probe(#[error(not(source))] String),
    #[display("cannot hash local file: {}", _0.display())]
    Hash(#[error(not(source))] PathBuf),
    /// The remote object carries a content hash but none was computed
    /// locally. A bug in the caller, never a user error.
    #[display("local hash required when the remote object carries one")]
    MissingLocalHash,
    #[display("upload failed: {_0}")]
    Upload(#[error(not(source))] String),
    #[display("cannot list remote objects under {_0:?}")]
    List(#[error(not(source))] String),
    #[display("delete failed: {_0}")]
    Delete(#[error(not(source))] String),
    /// Deletion was requested without any way to confirm it.
    #[display("--delete requires --yes in non-interactive mode")]
    DeleteRefused,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Probe(_) | Self::Upload(_) | Self::List(_) | Self::Delete(_))
    }

    /// Returns `true` if the run must not start.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Filter(_) | Self::DeleteRefused)
    }
}
