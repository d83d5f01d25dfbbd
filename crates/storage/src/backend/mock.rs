//! In-memory object store for testing.

use super::ObjectInfoStream;
use crate::error::{ErrorKind, Result};
use crate::models::{ObjectInfo, ObjectTags, RemoteMetadata};
use crate::path::validate as validate_key;
use crate::ObjectStore;
use async_stream::stream;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

type Address = (String, String);

/// A stored object: its bytes and custom metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockObject {
    pub data: Vec<u8>,
    pub metadata: RemoteMetadata,
}

/// In-memory object store for testing.
///
/// Objects are stored in a `BTreeMap` behind a [`RwLock`], so all trait
/// methods can operate on `&self` without external synchronisation, and
/// listings come back in key order like S3's. Keys can be marked as failing
/// to exercise error paths, and uploads are counted so tests can assert that
/// nothing was transferred.
///
/// # Examples
///
/// ```
/// use photosync_storage::backend::MockStore;
/// use photosync_storage::{ObjectStore, RemoteMetadata};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MockStore::default().with_object("bucket", "photos/a.jpg", b"jpeg", RemoteMetadata::new());
/// assert!(store.exists("bucket", "photos/a.jpg").await?);
/// assert!(!store.exists("bucket", "photos/b.jpg").await?);
/// # Ok(())
/// # }
/// ```
pub struct MockStore {
    name: String,
    storage: RwLock<BTreeMap<Address, MockObject>>,
    failing: HashSet<String>,
    puts: AtomicUsize,
}

impl MockStore {
    /// Add an object to the store.
    ///
    /// Panics if the key fails validation (e.g. path traversal). If test
    /// setup is wrong, then test should not pass.
    pub fn with_object(
        mut self,
        bucket: impl Into<String>,
        key: impl Into<String>,
        data: impl Into<Vec<u8>>,
        metadata: RemoteMetadata,
    ) -> Self {
        let key = key.into();
        let Ok(validated) = validate_key(&key) else {
            // The panic here is DELIBERATE. MockStore is intended to be used
            // in tests; panics are expected. There is no error result.
            panic!("MockStore::with_object: invalid key {key}");
        };
        let object = MockObject { data: data.into(), metadata };
        self.storage.get_mut().insert((bucket.into(), validated), object);
        self
    }

    /// Every operation touching `key` will fail with a network error.
    pub fn with_failing_key(mut self, key: impl Into<String>) -> Self {
        self.failing.insert(key.into());
        self
    }

    /// Number of successful uploads performed through this store.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Snapshot of a stored object.
    pub async fn object(&self, bucket: &str, key: &str) -> Option<MockObject> {
        self.storage.read().await.get(&(bucket.to_string(), key.to_string())).cloned()
    }

    /// All keys in a bucket, in order.
    pub async fn keys(&self, bucket: &str) -> Vec<String> {
        self.storage.read().await.keys().filter(|(b, _)| b == bucket).map(|(_, key)| key.clone()).collect()
    }

    fn check(&self, key: &str) -> Result<String> {
        if self.failing.contains(key) {
            exn::bail!(ErrorKind::Network(format!("injected failure for {key}")));
        }
        validate_key(key)
    }
}
impl Default for MockStore {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            storage: RwLock::new(BTreeMap::new()),
            failing: HashSet::new(),
            puts: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ObjectStore for MockStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn head(&self, bucket: &str, key: &str) -> Result<Option<RemoteMetadata>> {
        let key = self.check(key)?;
        let guard = self.storage.read().await;
        Ok(guard.get(&(bucket.to_string(), key)).map(|object| object.metadata.clone()))
    }

    fn list_stream<'a>(&'a self, bucket: &'a str, prefix: &'a str) -> ObjectInfoStream<'a> {
        Box::pin(stream! {
            // Snapshot matching entries under the read lock, then drop it
            // before yielding to avoid holding the lock across yield points.
            let entries: Vec<ObjectInfo> = {
                let guard = self.storage.read().await;
                guard
                    .iter()
                    .filter(|((b, key), _)| b == bucket && key.starts_with(prefix))
                    .map(|((_, key), object)| ObjectInfo::new(key.clone(), object.data.len() as u64))
                    .collect()
            };
            for info in entries {
                yield Ok(info);
            }
        })
    }

    async fn put_file(&self, bucket: &str, key: &str, path: &Path, tags: &ObjectTags) -> Result<()> {
        let key = self.check(key)?;
        let data = tokio::fs::read(path).await.map_err(ErrorKind::Io)?;
        let object = MockObject { data, metadata: tags.to_metadata() };
        self.storage.write().await.insert((bucket.to_string(), key), object);
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        let key = self.check(key)?;
        // Same as S3: deleting a missing object succeeds.
        self.storage.write().await.remove(&(bucket.to_string(), key));
        Ok(())
    }
}
