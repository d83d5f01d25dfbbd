//! Content deduplication within a destination bucket.
//!
//! Before uploading a file whose destination key is empty, the resolver
//! looks for the same content elsewhere: first among objects written or
//! confirmed earlier in this run, then in the cache's hash index from
//! previous runs. A candidate is only trusted after a live `head` confirms it
//! still exists in the destination bucket.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use photosync_cache::HashCache;
use photosync_storage::{Destination, ObjectStore};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Slot = Arc<AsyncMutex<Option<String>>>;

/// Content hash to canonical URI for objects known to exist in this run.
///
/// Each hash has its own async lock. A worker that [claims](Self::claim) a
/// hash holds it across its whole upload, so a second file with the same
/// content waits and then finds the first one's object instead of uploading
/// the same bytes again.
#[derive(Debug, Default)]
pub struct RunIndex {
    slots: Mutex<HashMap<String, Slot>>,
}

/// Exclusive access to one hash's entry in a [`RunIndex`].
pub type Claim = OwnedMutexGuard<Option<String>>;

impl RunIndex {
    fn slot(&self, hash: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(hash.to_string()).or_default())
    }

    /// Lock `hash`, waiting for any in-flight upload of the same content.
    pub async fn claim(&self, hash: &str) -> Claim {
        self.slot(hash).lock_owned().await
    }

    /// Record that `uri` holds `hash`. Must not be called while holding a
    /// claim on the same hash; write through the claim instead.
    pub async fn record(&self, hash: &str, uri: &str) {
        *self.claim(hash).await = Some(uri.to_string());
    }

    pub async fn get(&self, hash: &str) -> Option<String> {
        self.claim(hash).await.clone()
    }
}

/// Find a live object in `destination`'s bucket holding `hash`.
///
/// `claimed` is the run-scoped candidate (from an already held [`Claim`]) and
/// is tried before the cache's hash index. Candidates in another bucket are
/// ignored. An index entry that turns out to be gone is scrubbed so it isn't
/// tried again.
pub async fn resolve(
    store: &dyn ObjectStore,
    cache: &HashCache,
    destination: &Destination,
    hash: &str,
    claimed: Option<&str>,
) -> Result<Option<String>> {
    let indexed = cache.get_canonical(hash);
    let candidates = claimed
        .into_iter()
        .chain(indexed.as_deref().filter(|uri| Some(*uri) != claimed));
    for candidate in candidates {
        let Some(key) = destination.key_from_uri(candidate) else {
            // Written by a run against another bucket; still true there.
            tracing::trace!(hash, candidate, "canonical location outside destination bucket");
            continue;
        };
        if store.exists(destination.bucket(), key).await.or_raise(|| ErrorKind::Probe(key.to_string()))? {
            return Ok(Some(candidate.to_string()));
        }
        if indexed.as_deref() == Some(candidate) {
            tracing::debug!(hash, candidate, "dropping stale canonical location");
            cache.set_canonical(hash, None);
        }
    }
    Ok(None)
}
