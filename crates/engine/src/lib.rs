//! The photosync engine.
//!
//! A run is a pipeline over four pieces, all sharing one object-store handle
//! and one [`HashCache`](photosync_cache::HashCache):
//! - [`scan`](scan::scan) lists local files that pass the filter.
//! - [`sync`](sync::sync) takes each file through probe, decision, optional
//!   deduplication and upload on a bounded number of concurrent workers.
//! - [`sweep`](sweep::sweep) optionally removes remote objects that no longer
//!   have a local counterpart, once every upload has settled.
//! - [`Tally`] collects the counters for the final summary.

pub mod decision;
pub mod dedup;
pub mod error;
pub mod remote;
pub mod scan;
mod summary;
pub mod sweep;
pub mod sync;

pub use crate::summary::{Summary, Tally};
use photosync_storage::Destination;

/// Default number of files processed at once.
pub const DEFAULT_WORKERS: usize = 4;

/// Run-wide settings for [`sync`](sync::sync).
#[derive(Debug, Clone)]
pub struct Context {
    pub destination: Destination,
    /// Writes go through a store that drops them; only hashes are cached.
    pub dry_run: bool,
    /// Look for identical content elsewhere in the bucket before uploading.
    pub dedup: bool,
    /// Maximum files in flight; values below 1 are treated as 1.
    pub workers: usize,
}

impl Context {
    pub fn new(destination: Destination) -> Self {
        Self { destination, dry_run: false, dedup: false, workers: DEFAULT_WORKERS }
    }
}
