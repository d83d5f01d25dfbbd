//! Concurrent upload execution.
//!
//! [`sync_file`] takes one [`LocalFile`](crate::scan::LocalFile) through the
//! whole per-file pipeline, strictly in order:
//!
//! 1. Probe the destination key.
//! 2. Hash the local file, only if the remote carries a hash to compare.
//! 3. [Decide](crate::decision::decide) to skip or upload.
//! 4. With deduplication on and nothing at the key, look for the same content
//!    elsewhere in the bucket.
//! 5. Upload with `sha256`/`size`/`mtime` tags.
//! 6. Record the outcome in the cache.
//!
//! [`sync`] streams [`SyncEvent`]s while running up to
//! [`Context::workers`](crate::Context) files at once. A failing file is
//! reported and counted; it never stops its siblings.

mod file;
mod stream;

pub use self::file::{Action, sync_file};
pub use self::stream::{SyncEvent, sync};
