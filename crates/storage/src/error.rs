//! Errors raised by object stores and destination parsing.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

/// What went wrong talking to the store, grouped by how a caller reacts.
///
/// A missing object is **not** an error for [`head`](crate::ObjectStore::head);
/// `NotFound` is only raised by operations that require the object to exist.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Object does not exist
    #[display("object not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// Access denied (permissions or credentials)
    #[display("permission denied: {_0}")]
    PermissionDenied(#[error(not(source))] String),
    /// The service asked us to slow down
    #[display("request throttled: {_0}")]
    Throttled(#[error(not(source))] String),
    /// Underlying I/O error (reading the local file being uploaded)
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// Network-related error (connection, timeout, unexpected response)
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// Key contains invalid characters or escapes the prefix
    #[display("invalid key: {}", _0.display())]
    InvalidKey(#[error(not(source))] PathBuf),
    /// Destination URI could not be parsed
    #[display("invalid destination URI: {_0:?}")]
    InvalidDestination(#[error(not(source))] String),
    /// Credentials could not be resolved for the requested profile
    #[display("credentials unavailable for profile {_0:?}")]
    Credentials(#[error(not(source))] String),
    /// Backend-specific error
    #[display("backend error: {_0}")]
    BackendError(#[error(not(source))] String),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Transient failures: another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Network(_) | Self::Throttled(_) | Self::BackendError(_))
    }

    /// Returns `true` if the error is a problem with how the run was set up,
    /// rather than with any particular object.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::InvalidDestination(_) | Self::Credentials(_))
    }
}
