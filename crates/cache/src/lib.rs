//! Persistent content-hash cache.
//!
//! Hashing a multi-gigabyte video on every run is what makes a naive sync
//! slow. This crate remembers, per local file, the SHA-256 computed the last
//! time the file had exactly this size and mtime, and per content hash, the
//! last known object that holds those bytes.
//!
//! # Architecture
//! The cache is not the source of truth; the bucket is. Deleting the snapshot
//! file only costs a re-hash of every file on the next run. Two maps are kept:
//! - **Entries**: resolved absolute path to `{size, mtime, sha256, s3_uri?}`.
//!   An entry is only trusted when size and mtime match the current stat.
//! - **Hash index**: content hash to canonical `s3://bucket/key`. A hint for
//!   deduplication that callers must re-verify against the store.

pub mod error;
mod hash;
mod store;

pub use crate::hash::{HASH_CHUNK_SIZE, hash_file};
pub use crate::store::{CacheEntry, HashCache, SNAPSHOT_VERSION};
