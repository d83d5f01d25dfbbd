use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::instrument;

/// Snapshot format version; anything else is discarded on load.
pub const SNAPSHOT_VERSION: u32 = 1;

/// What is known about one local file.
///
/// Fields are declared in key order so the snapshot is written sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub mtime: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3_uri: Option<String>,
    pub sha256: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    entries: BTreeMap<String, CacheEntry>,
    #[serde(default)]
    hash_index: BTreeMap<String, String>,
    #[serde(default)]
    version: u32,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self { entries: BTreeMap::new(), hash_index: BTreeMap::new(), version: SNAPSHOT_VERSION }
    }
}

/// Thread-safe content-hash cache backed by a single JSON snapshot file.
///
/// All mutation happens in memory; nothing touches the disk until
/// [`HashCache::save`] atomically replaces the snapshot.
#[derive(Debug)]
pub struct HashCache {
    path: PathBuf,
    state: Mutex<Snapshot>,
}

impl HashCache {
    /// Load the snapshot at `path`.
    ///
    /// Never fails: a missing, unreadable, malformed or foreign-version
    /// snapshot yields an empty cache that will overwrite it on save.
    #[instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let snapshot = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Snapshot>(&raw) {
                Ok(snapshot) if snapshot.version == SNAPSHOT_VERSION => snapshot,
                Ok(snapshot) => {
                    tracing::warn!(version = snapshot.version, "ignoring cache snapshot with unknown version");
                    Snapshot::default()
                },
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring malformed cache snapshot");
                    Snapshot::default()
                },
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Snapshot::default(),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable cache snapshot");
                Snapshot::default()
            },
        };
        tracing::debug!(entries = snapshot.entries.len(), indexed = snapshot.hash_index.len(), "cache loaded");
        Self { path, state: Mutex::new(snapshot) }
    }

    /// An empty cache that will be written to `path` on save.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), state: Mutex::new(Snapshot::default()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A panic while holding the lock can't leave the maps half-updated, so
    /// a poisoned lock is still usable.
    fn state(&self) -> MutexGuard<'_, Snapshot> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn entry_key(path: &Path) -> String {
        std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf()).to_string_lossy().into_owned()
    }

    /// The cached hash for `path`, if one was recorded at exactly this size
    /// and mtime.
    pub fn get_hash(&self, path: &Path, size: u64, mtime: i64) -> Option<String> {
        let key = Self::entry_key(path);
        let state = self.state();
        state
            .entries
            .get(&key)
            .filter(|entry| entry.size == size && entry.mtime == mtime)
            .map(|entry| entry.sha256.clone())
    }

    /// The full entry for `path`, regardless of whether it is still fresh.
    pub fn entry(&self, path: &Path) -> Option<CacheEntry> {
        let key = Self::entry_key(path);
        self.state().entries.get(&key).cloned()
    }

    /// Record the hash for `path`, replacing any previous entry. A canonical
    /// URI, when given, also becomes the hash index entry for `sha256`.
    pub fn set_hash(&self, path: &Path, size: u64, mtime: i64, sha256: &str, uri: Option<&str>) {
        let key = Self::entry_key(path);
        let mut state = self.state();
        if let Some(uri) = uri {
            state.hash_index.insert(sha256.to_string(), uri.to_string());
        }
        let entry = CacheEntry { mtime, s3_uri: uri.map(str::to_string), sha256: sha256.to_string(), size };
        state.entries.insert(key, entry);
    }

    /// The last known object holding content `sha256`. A hint, not a fact.
    pub fn get_canonical(&self, sha256: &str) -> Option<String> {
        self.state().hash_index.get(sha256).cloned()
    }

    /// Point `sha256` at `uri`, or forget it when `uri` is `None`.
    pub fn set_canonical(&self, sha256: &str, uri: Option<&str>) {
        let mut state = self.state();
        match uri {
            Some(uri) => {
                state.hash_index.insert(sha256.to_string(), uri.to_string());
            },
            None => {
                state.hash_index.remove(sha256);
            },
        }
    }

    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Atomically replace the snapshot file with the in-memory state.
    ///
    /// The snapshot is written to a temporary file in the same directory and
    /// renamed over the target, so readers see either the old or the new
    /// snapshot and never a partial one.
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    pub fn save(&self) -> Result<()> {
        let bytes = serde_json::to_vec(&*self.state()).or_raise(|| ErrorKind::Serialize)?;
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).or_raise(|| ErrorKind::CreateDirectory(parent.clone()))?;
        let prefix = self.path.file_name().map(|name| name.to_os_string()).unwrap_or_default();
        let mut temp = tempfile::Builder::new()
            .prefix(&prefix)
            .tempfile_in(&parent)
            .or_raise(|| ErrorKind::Write(self.path.clone()))?;
        temp.write_all(&bytes).or_raise(|| ErrorKind::Write(self.path.clone()))?;
        temp.as_file().sync_all().or_raise(|| ErrorKind::Write(self.path.clone()))?;
        temp.persist(&self.path).or_raise(|| ErrorKind::Write(self.path.clone()))?;
        tracing::debug!(bytes = bytes.len(), "cache saved");
        Ok(())
    }
}
