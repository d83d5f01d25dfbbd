//! Object storage for photosync.
//!
//! Everything the sync engine knows about remote storage goes through the
//! [`ObjectStore`] trait: head, list, put and delete against `(bucket, key)`
//! addresses. The S3 implementation lives behind the `s3` feature, and an
//! in-memory implementation for tests lives behind the `mock` feature.

pub mod backend;
mod destination;
pub mod error;
mod models;
mod path;

pub use crate::backend::ObjectStore;
pub use crate::destination::Destination;
pub use crate::models::{ObjectInfo, ObjectTags, RemoteMetadata, content_type_for};
pub use crate::path::validate as validate_key;
use std::sync::Arc;

/// Shared handle to the object store client, constructed once per run.
pub type StoreHandle = Arc<dyn ObjectStore + Send + Sync>;
