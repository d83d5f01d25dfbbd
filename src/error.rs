//! Application Error Types

use derive_more::{Display, Error};

/// An application error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for a whole run.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors. Per-file and per-object failures are not errors at this
/// level; they are counted and turn into [`Exit::Failures`].
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Bad or missing input; nothing was done.
    #[display("{_0}")]
    Usage(#[error(not(source))] String),
    #[display("invalid configuration")]
    Config,
    #[display("cannot connect to object store")]
    Connect,
    #[display("cannot save hash cache")]
    CacheSave,
}

impl ErrorKind {
    pub fn exit(&self) -> Exit {
        match self {
            Self::Usage(_) | Self::Config | Self::Connect => Exit::Usage,
            Self::CacheSave => Exit::Failures,
        }
    }
}

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Clean = 0,
    /// At least one file or delete failed.
    Failures = 1,
    /// Usage or configuration error.
    Usage = 2,
    /// Interrupted (128 + SIGINT).
    Interrupted = 130,
}

impl From<Exit> for std::process::ExitCode {
    fn from(exit: Exit) -> Self {
        Self::from(exit as u8)
    }
}
