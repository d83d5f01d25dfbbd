//! Object store trait and implementations.
//!
//! This module defines the [`ObjectStore`] trait, the narrow interface the sync
//! engine needs from an S3-compatible service: head, list, put and delete.
//! Objects are addressed by `(bucket, key)`; the store itself is not bound to
//! a bucket so one client handle can serve a whole run.

#[cfg(any(test, feature = "mock"))]
mod mock;
mod ro;
#[cfg(feature = "s3")]
mod s3;

#[cfg(any(test, feature = "mock"))]
pub use self::mock::MockStore;
pub use self::ro::DryRunStore;
#[cfg(feature = "s3")]
pub use self::s3::{S3Options, S3Store};
use crate::error::Result;
use crate::models::{ObjectInfo, ObjectTags, RemoteMetadata};
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::path::Path;
use std::pin::Pin;

pub type ObjectInfoStream<'a> = Pin<Box<dyn Stream<Item = Result<ObjectInfo>> + Send + 'a>>;

/// Unified interface for object storage.
///
/// All operations are asynchronous; implementations must be safe to call from
/// many workers at once through a shared [`StoreHandle`](crate::StoreHandle).
///
/// # Not Found
/// [`head()`](Self::head) reports a missing object as `Ok(None)`. Every other
/// failure (network, permissions, throttling) **must** be an `Err`, so that a
/// transient failure can never be mistaken for "safe to upload".
///
/// # Examples
///
/// ```
/// use photosync_storage::{ObjectStore, error::Result};
///
/// async fn is_tagged(store: &dyn ObjectStore, bucket: &str, key: &str) -> Result<bool> {
///     Ok(match store.head(bucket, key).await? {
///         Some(metadata) => metadata.contains_key("sha256"),
///         None => false,
///     })
/// }
/// ```
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Name of the store (used for logging only).
    fn name(&self) -> &str;

    /// Fetch an object's custom metadata without downloading it.
    ///
    /// Returns `Ok(None)` if the object does not exist, and `Ok(Some(_))`
    /// (possibly empty) if it does.
    async fn head(&self, bucket: &str, key: &str) -> Result<Option<RemoteMetadata>>;

    /// Check if an object exists.
    async fn exists(&self, bucket: &str, key: &str) -> Result<bool> {
        Ok(self.head(bucket, key).await?.is_some())
    }

    /// List all objects under a prefix.
    ///
    /// Default implementation collects [`list_stream()`](Self::list_stream)
    /// into a [`Vec`].
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectInfo>> {
        self.list_stream(bucket, prefix).try_collect().await
    }

    /// Stream all objects whose key starts with `prefix`, following
    /// pagination transparently.
    ///
    /// # Examples
    ///
    /// ```
    /// use futures::TryStreamExt;
    /// # use photosync_storage::{ObjectStore, error::Result};
    /// # async fn example(store: &dyn ObjectStore) -> Result<()> {
    /// let mut stream = store.list_stream("bucket", "photos/");
    /// while let Some(info) = stream.try_next().await? {
    ///     println!("{}: {} bytes", info.key, info.size);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    fn list_stream<'a>(&'a self, bucket: &'a str, prefix: &'a str) -> ObjectInfoStream<'a>;

    /// Upload a local file, attaching `tags` as custom object metadata.
    ///
    /// Overwrites any existing object at `key`.
    async fn put_file(&self, bucket: &str, key: &str, path: &Path, tags: &ObjectTags) -> Result<()>;

    /// Delete an object.
    async fn delete(&self, bucket: &str, key: &str) -> Result<()>;
}
