use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use photosync_storage::{ObjectStore, ObjectTags, RemoteMetadata};

/// What the store knows about one destination key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteState {
    pub exists: bool,
    /// Custom metadata, present whenever the object exists (possibly empty).
    pub metadata: Option<RemoteMetadata>,
}

impl RemoteState {
    pub fn missing() -> Self {
        Self::default()
    }

    pub fn found(metadata: RemoteMetadata) -> Self {
        Self { exists: true, metadata: Some(metadata) }
    }

    /// A custom metadata value, treating empty strings as absent.
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.metadata.as_ref()?.get(name).map(String::as_str).filter(|value| !value.is_empty())
    }

    pub fn sha256(&self) -> Option<&str> {
        self.tag(ObjectTags::SHA256)
    }

    /// Deciding on this object requires hashing the local file.
    pub fn needs_local_hash(&self) -> bool {
        self.exists && self.sha256().is_some()
    }
}

/// Look up `key` without downloading it. A missing object is a normal
/// outcome; anything else the store reports is an error.
pub async fn probe(store: &dyn ObjectStore, bucket: &str, key: &str) -> Result<RemoteState> {
    let metadata = store.head(bucket, key).await.or_raise(|| ErrorKind::Probe(key.to_string()))?;
    tracing::trace!(bucket, key, exists = metadata.is_some(), "probed");
    Ok(metadata.map_or_else(RemoteState::missing, RemoteState::found))
}
