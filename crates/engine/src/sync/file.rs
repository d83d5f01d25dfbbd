use crate::Context;
use crate::decision::{Reason, Verdict, decide};
use crate::dedup::{RunIndex, resolve};
use crate::error::{ErrorKind, Result};
use crate::remote::probe;
use crate::scan::LocalFile;
use exn::ResultExt;
use photosync_cache::{HashCache, hash_file};
use photosync_storage::{ObjectStore, ObjectTags};
use std::path::{Path, PathBuf};

/// The outcome of successfully syncing a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// The remote copy is already up to date.
    Skipped { path: PathBuf, reason: Reason },
    /// The file was written to `uri` (or would have been, in a dry run).
    Uploaded { path: PathBuf, uri: String, size: u64, reason: Reason },
    /// Identical content already lives at `canonical`; nothing was written.
    Duplicate { path: PathBuf, canonical: String },
}

impl Action {
    pub fn path(&self) -> &Path {
        match self {
            Self::Skipped { path, .. } | Self::Uploaded { path, .. } | Self::Duplicate { path, .. } => path,
        }
    }
}

/// Sync one file to its destination key.
///
/// `run_index` must be shared by every file of the run; it is what lets
/// identical files processed concurrently resolve to a single upload.
pub async fn sync_file(
    store: &dyn ObjectStore,
    cache: &HashCache,
    ctx: &Context,
    run_index: &RunIndex,
    file: &LocalFile,
) -> Result<Action> {
    let destination = &ctx.destination;
    let key = destination.key_for(&file.relative);
    let uri = destination.uri_for_key(&key);

    let remote = probe(store, destination.bucket(), &key).await?;
    let local_hash = match remote.needs_local_hash() {
        true => Some(hash_local(cache, file).await?),
        false => None,
    };
    let reason = match decide(&remote, file, local_hash.as_deref())? {
        Verdict::Skip(reason) => {
            if let Some(remote_hash) = remote.sha256() {
                cache.set_hash(&file.path, file.size, file.mtime, remote_hash, Some(&uri));
                run_index.record(remote_hash, &uri).await;
            }
            tracing::debug!(path = %file.path.display(), %reason, "skipping");
            return Ok(Action::Skipped { path: file.path.clone(), reason });
        },
        Verdict::Upload(reason) => reason,
    };
    let hash = match local_hash {
        Some(hash) => hash,
        None => hash_local(cache, file).await?,
    };

    // Held until this file's outcome is recorded, so a concurrent file with
    // the same content waits for it instead of racing it.
    let mut claim = None;
    if ctx.dedup && !remote.exists {
        let mut held = run_index.claim(&hash).await;
        if let Some(canonical) = resolve(store, cache, destination, &hash, held.as_deref()).await? {
            cache.set_hash(&file.path, file.size, file.mtime, &hash, Some(&canonical));
            *held = Some(canonical.clone());
            tracing::debug!(path = %file.path.display(), %canonical, "duplicate content");
            return Ok(Action::Duplicate { path: file.path.clone(), canonical });
        }
        claim = Some(held);
    }

    let tags = ObjectTags::new(&hash, file.size, file.mtime);
    store
        .put_file(destination.bucket(), &key, &file.path, &tags)
        .await
        .or_raise(|| ErrorKind::Upload(key.clone()))?;

    if ctx.dry_run {
        // Nothing was written, so there is no canonical location to remember.
        cache.set_hash(&file.path, file.size, file.mtime, &hash, None);
    } else {
        cache.set_hash(&file.path, file.size, file.mtime, &hash, Some(&uri));
        match claim.as_mut() {
            Some(held) => **held = Some(uri.clone()),
            None => run_index.record(&hash, &uri).await,
        }
    }
    tracing::debug!(path = %file.path.display(), %uri, %reason, "uploaded");
    Ok(Action::Uploaded { path: file.path.clone(), uri, size: file.size, reason })
}

/// Cached hash if the file is unchanged since it was recorded, otherwise hash
/// it on a blocking thread and remember the result.
async fn hash_local(cache: &HashCache, file: &LocalFile) -> Result<String> {
    if let Some(hash) = cache.get_hash(&file.path, file.size, file.mtime) {
        return Ok(hash);
    }
    let path = file.path.clone();
    let hash = tokio::task::spawn_blocking(move || hash_file(path))
        .await
        .or_raise(|| ErrorKind::Hash(file.path.clone()))?
        .or_raise(|| ErrorKind::Hash(file.path.clone()))?;
    cache.set_hash(&file.path, file.size, file.mtime, &hash, None);
    Ok(hash)
}
