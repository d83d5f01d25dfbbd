use crate::dedup::RunIndex;
use crate::error::Error;
use crate::scan::LocalFile;
use crate::summary::Tally;
use crate::sync::file::{Action, sync_file};
use crate::Context;
use async_stream::stream;
use futures::stream::FuturesUnordered;
use futures::{Stream, StreamExt};
use photosync_cache::HashCache;
use photosync_storage::ObjectStore;
use std::collections::VecDeque;
use std::path::PathBuf;

/// Progress events emitted by [`sync`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started): exactly once.
/// 2. [`DiscoveryComplete`](Self::DiscoveryComplete): exactly once, with the
///    total file count.
/// 3. [`Synced`](Self::Synced) or [`Failed`](Self::Failed): once per file, in
///    completion order.
/// 4. [`Complete`](Self::Complete): exactly once.
#[derive(Debug)]
pub enum SyncEvent {
    Started,
    DiscoveryComplete(u64),
    Synced(Action),
    /// The file could not be synced. Already counted as an error.
    Failed(PathBuf, Error),
    Complete,
}

/// Streams [`SyncEvent`]s for every file in `files`, syncing up to
/// `ctx.workers` of them concurrently. Additional files are promoted as
/// in-flight ones complete.
///
/// Every outcome is counted in `tally` as it happens, so the tally is
/// accurate even if the consumer stops polling early.
pub fn sync<'a>(
    store: &'a dyn ObjectStore,
    cache: &'a HashCache,
    ctx: &'a Context,
    tally: &'a Tally,
    files: Vec<LocalFile>,
) -> impl Stream<Item = SyncEvent> + 'a {
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        yield SyncEvent::Started;
        // usize always fits in u64 on supported targets.
        let total = u64::try_from(files.len()).unwrap_or(u64::MAX);
        tally.scanned(total);
        yield SyncEvent::DiscoveryComplete(total);

        let run_index = RunIndex::default();
        let run_index = &run_index;
        let mut pending: VecDeque<_> = files
            .into_iter()
            .map(move |file| async move {
                match sync_file(store, cache, ctx, run_index, &file).await {
                    Ok(action) => {
                        count(tally, &action);
                        SyncEvent::Synced(action)
                    },
                    Err(error) => {
                        tally.error();
                        tracing::debug!(path = %file.path.display(), error = ?error, "sync failed");
                        SyncEvent::Failed(file.path, error)
                    },
                }
            })
            .collect();
        let mut processing = FuturesUnordered::new();
        processing.extend(pending.drain(..ctx.workers.max(1).min(pending.len())));
        while let Some(event) = processing.next().await {
            yield event;
            if let Some(next) = pending.pop_front() {
                processing.push(next);
            }
        }

        yield SyncEvent::Complete;
    })
}

fn count(tally: &Tally, action: &Action) {
    match action {
        Action::Skipped { .. } => tally.skipped(),
        Action::Uploaded { size, .. } => tally.uploaded(*size),
        Action::Duplicate { .. } => tally.duplicate(),
    }
}
