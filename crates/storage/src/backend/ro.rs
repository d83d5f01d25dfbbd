//! Dry-run storage decorator.
//!
//! Wraps another store and prevents write operations from executing, while
//! still indicating success on return. Reads go to the real store, so a dry
//! run makes the same decisions a real run would.

use async_trait::async_trait;
use std::path::Path;

use crate::backend::ObjectInfoStream;
use crate::error::Result;
use crate::{ObjectStore, ObjectTags, RemoteMetadata, StoreHandle};

/// Dry-run object store.
///
/// Wraps another store and silently drops all writes and deletes, logging an
/// [`info event`](tracing::Event) for each.
#[derive(Clone)]
pub struct DryRunStore {
    inner: StoreHandle,
}
impl DryRunStore {
    pub fn new(inner: StoreHandle) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ObjectStore for DryRunStore {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn head(&self, bucket: &str, key: &str) -> Result<Option<RemoteMetadata>> {
        self.inner.head(bucket, key).await
    }

    fn list_stream<'a>(&'a self, bucket: &'a str, prefix: &'a str) -> ObjectInfoStream<'a> {
        self.inner.list_stream(bucket, prefix)
    }

    async fn put_file(&self, bucket: &str, key: &str, path: &Path, _tags: &ObjectTags) -> Result<()> {
        tracing::info!(bucket, key, path = %path.display(), "Skipping upload during dry-run");
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        tracing::info!(bucket, key, "Skipping delete during dry-run");
        Ok(())
    }
}
