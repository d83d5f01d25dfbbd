//! Local tree scanning.
//!
//! [`scan`] walks a directory and yields one [`ScanEntry`] per regular file it
//! finds, after applying a [`Filter`]. The walk is lazy and sorted by file
//! name so runs over the same tree see the same sequence.

mod filter;
mod walk;

pub use self::filter::{DEFAULT_JUNK, Filter};
pub use self::walk::scan;
use std::path::PathBuf;

/// A regular file selected for syncing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Path relative to the sync root, `/`-separated.
    pub relative: String,
    pub size: u64,
    /// Modification time in whole seconds since the epoch.
    pub mtime: i64,
}

impl LocalFile {
    pub fn new(path: impl Into<PathBuf>, relative: impl Into<String>, size: u64, mtime: i64) -> Self {
        Self { path: path.into(), relative: relative.into(), size, mtime }
    }
}

/// What the scanner found at one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEntry {
    File(LocalFile),
    /// Listed, but gone or unreadable by the time it was inspected. Safe to
    /// ignore.
    Vanished(PathBuf),
    /// Rejected by the filter (or unrepresentable as an object key).
    Filtered(PathBuf),
}

impl ScanEntry {
    pub fn into_file(self) -> Option<LocalFile> {
        match self {
            Self::File(file) => Some(file),
            _ => None,
        }
    }
}
