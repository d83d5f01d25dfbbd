//! Deletion sweep.
//!
//! After every upload has settled, [`sweep`] lists the destination prefix and
//! removes each object whose key was not produced by a local file in this
//! run. What "removes" means is decided once, up front, by a
//! [`DeletePolicy`].

use crate::error::{Error, ErrorKind, Result};
use crate::summary::Tally;
use async_stream::stream;
use async_trait::async_trait;
use exn::ResultExt;
use futures::{Stream, StreamExt};
use photosync_storage::{Destination, ObjectStore};
use std::collections::HashSet;
use std::fmt;

/// Asks whether a single object may be deleted.
///
/// Answering may take as long as a person needs, so implementations must not
/// block the calling task; anything that waits on a terminal belongs on a
/// blocking thread.
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, uri: &str) -> bool;
}

/// How deletions are gated, in order of precedence.
pub enum DeletePolicy {
    /// Report what would be deleted; touch nothing.
    DryRun,
    /// Delete without asking.
    PreConfirmed,
    /// Ask for every object.
    Interactive(Box<dyn Confirm>),
}

impl fmt::Debug for DeletePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::DryRun => "DryRun",
            Self::PreConfirmed => "PreConfirmed",
            Self::Interactive(_) => "Interactive",
        })
    }
}

impl DeletePolicy {
    /// Pick the policy for a run. `prompt` is only available when there is
    /// someone to answer it.
    ///
    /// # Errors
    /// [`ErrorKind::DeleteRefused`] when the run is neither a dry run nor
    /// pre-confirmed and there is no prompt.
    pub fn resolve(dry_run: bool, yes: bool, prompt: Option<Box<dyn Confirm>>) -> Result<Self> {
        Ok(match (dry_run, yes, prompt) {
            (true, _, _) => Self::DryRun,
            (false, true, _) => Self::PreConfirmed,
            (false, false, Some(prompt)) => Self::Interactive(prompt),
            (false, false, None) => exn::bail!(ErrorKind::DeleteRefused),
        })
    }
}

#[derive(Debug)]
pub enum SweepEvent {
    /// Removed (or, in a dry run, would have been).
    Deleted { uri: String, dry_run: bool },
    /// The prompt said no.
    Declined(String),
    /// Delete request failed. Already counted as an error.
    Failed(String, Error),
}

/// Streams one [`SweepEvent`] per remote object under the destination prefix
/// that is absent from `local_keys`.
///
/// A listing failure ends the stream with an `Err` item; a failure to delete
/// one object does not.
pub fn sweep<'a>(
    store: &'a dyn ObjectStore,
    destination: &'a Destination,
    local_keys: &'a HashSet<String>,
    policy: &'a DeletePolicy,
    tally: &'a Tally,
) -> impl Stream<Item = Result<SweepEvent>> + 'a {
    stream!({
        let bucket = destination.bucket();
        let mut listing = store.list_stream(bucket, destination.prefix());
        while let Some(item) = listing.next().await {
            let info = match item.or_raise(|| ErrorKind::List(destination.prefix().to_string())) {
                Ok(info) => info,
                Err(e) => {
                    tally.error();
                    yield Err(e);
                    return;
                },
            };
            if local_keys.contains(&info.key) {
                continue;
            }
            let uri = destination.uri_for_key(&info.key);
            let confirmed = match policy {
                DeletePolicy::DryRun => {
                    tally.deleted();
                    yield Ok(SweepEvent::Deleted { uri, dry_run: true });
                    continue;
                },
                DeletePolicy::PreConfirmed => true,
                DeletePolicy::Interactive(prompt) => prompt.confirm(&uri).await,
            };
            if !confirmed {
                yield Ok(SweepEvent::Declined(uri));
                continue;
            }
            match store.delete(bucket, &info.key).await.or_raise(|| ErrorKind::Delete(info.key.clone())) {
                Ok(()) => {
                    tally.deleted();
                    tracing::info!(%uri, "deleted");
                    yield Ok(SweepEvent::Deleted { uri, dry_run: false });
                },
                Err(e) => {
                    tally.error();
                    yield Ok(SweepEvent::Failed(uri, e));
                },
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use photosync_storage::RemoteMetadata;
    use photosync_storage::backend::MockStore;
    use proptest::prelude::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn destination() -> Destination {
        "s3://bucket/photos/".parse().unwrap()
    }

    fn store(keys: &[&str]) -> MockStore {
        keys.iter()
            .fold(MockStore::default(), |store, key| store.with_object("bucket", *key, b"x", RemoteMetadata::new()))
    }

    /// Accepts URIs ending in any of `accept` and records every question.
    #[derive(Default)]
    struct Scripted {
        accept: Vec<&'static str>,
        asked: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Confirm for Scripted {
        async fn confirm(&self, uri: &str) -> bool {
            self.asked.lock().unwrap().push(uri.to_string());
            self.accept.iter().any(|suffix| uri.ends_with(suffix))
        }
    }

    /// Never answers.
    struct Silent;

    #[async_trait]
    impl Confirm for Silent {
        async fn confirm(&self, _uri: &str) -> bool {
            std::future::pending().await
        }
    }

    fn local(keys: &[&str]) -> HashSet<String> {
        keys.iter().map(|key| key.to_string()).collect()
    }

    async fn run(
        store: &MockStore,
        local_keys: &HashSet<String>,
        policy: &DeletePolicy,
    ) -> (Vec<Result<SweepEvent>>, crate::Summary) {
        let tally = Tally::default();
        let destination = destination();
        let events = sweep(store, &destination, local_keys, policy, &tally).collect().await;
        (events, tally.snapshot())
    }

    #[rstest::rstest]
    #[case::dry_run_wins(true, true, true, "DryRun")]
    #[case::dry_run_without_terminal(true, false, false, "DryRun")]
    #[case::yes(false, true, false, "PreConfirmed")]
    #[case::yes_beats_prompt(false, true, true, "PreConfirmed")]
    #[case::prompt(false, false, true, "Interactive")]
    fn test_resolve_policy(#[case] dry_run: bool, #[case] yes: bool, #[case] terminal: bool, #[case] expected: &str) {
        let prompt = terminal.then(|| Box::new(Scripted::default()) as Box<dyn Confirm>);
        let policy = DeletePolicy::resolve(dry_run, yes, prompt).unwrap();
        assert_eq!(format!("{policy:?}"), expected);
    }

    #[test]
    fn test_resolve_refuses_without_confirmation() {
        let err = DeletePolicy::resolve(false, false, None).unwrap_err();
        assert!(matches!(&*err, ErrorKind::DeleteRefused));
    }

    #[tokio::test]
    async fn test_sweep_deletes_only_orphans() {
        let store = store(&["photos/a.jpg", "photos/gone.jpg", "elsewhere/x.jpg"]);
        let (events, summary) = run(&store, &local(&["photos/a.jpg"]), &DeletePolicy::PreConfirmed).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            Ok(SweepEvent::Deleted { uri, dry_run: false }) if uri == "s3://bucket/photos/gone.jpg"
        ));
        assert_eq!(summary.deleted, 1);
        assert_eq!(store.keys("bucket").await, ["elsewhere/x.jpg", "photos/a.jpg"]);
    }

    #[tokio::test]
    async fn test_dry_run_counts_but_keeps() {
        let store = store(&["photos/gone.jpg"]);
        let (events, summary) = run(&store, &local(&[]), &DeletePolicy::DryRun).await;
        assert!(matches!(&events[0], Ok(SweepEvent::Deleted { dry_run: true, .. })));
        assert_eq!(summary.deleted, 1);
        assert_eq!(store.keys("bucket").await, ["photos/gone.jpg"]);
    }

    #[tokio::test]
    async fn test_interactive_asks_per_object() {
        let store = store(&["photos/keep.jpg", "photos/drop.jpg"]);
        let prompt = Scripted { accept: vec!["drop.jpg"], ..Scripted::default() };
        let asked = Arc::clone(&prompt.asked);
        let policy = DeletePolicy::Interactive(Box::new(prompt));
        let (events, summary) = run(&store, &local(&[]), &policy).await;
        assert_eq!(asked.lock().unwrap().len(), 2);
        assert_eq!(summary.deleted, 1);
        assert!(events.iter().any(|e| matches!(e, Ok(SweepEvent::Declined(uri)) if uri.ends_with("keep.jpg"))));
        assert_eq!(store.keys("bucket").await, ["photos/keep.jpg"]);
    }

    #[tokio::test]
    async fn test_pending_prompt_can_be_abandoned() {
        let store = store(&["photos/gone.jpg"]);
        let policy = DeletePolicy::Interactive(Box::new(Silent));
        let waited = tokio::time::timeout(Duration::from_millis(20), run(&store, &local(&[]), &policy)).await;
        assert!(waited.is_err());
        assert_eq!(store.keys("bucket").await, ["photos/gone.jpg"]);
    }

    #[tokio::test]
    async fn test_delete_failure_continues() {
        let store = store(&["photos/a.jpg", "photos/b.jpg"]).with_failing_key("photos/a.jpg");
        let (events, summary) = run(&store, &local(&[]), &DeletePolicy::PreConfirmed).await;
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], Ok(SweepEvent::Failed(uri, _)) if uri.ends_with("a.jpg")));
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.deleted, 1);
    }

    proptest! {
        #[test]
        fn prop_sweep_never_deletes_local_keys(
            local_names in prop::collection::hash_set("[a-d]{1,2}\\.jpg", 0..8),
            remote_names in prop::collection::hash_set("[a-d]{1,2}\\.jpg", 0..8),
        ) {
            let destination = destination();
            let local_keys: HashSet<String> = local_names.iter().map(|name| destination.key_for(name)).collect();
            let store = local_names
                .iter()
                .chain(remote_names.iter())
                .map(|name| destination.key_for(name))
                .fold(MockStore::default(), |store, key| store.with_object("bucket", key, b"x", RemoteMetadata::new()));
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let remaining: HashSet<String> = runtime.block_on(async {
                run(&store, &local_keys, &DeletePolicy::PreConfirmed).await;
                store.keys("bucket").await.into_iter().collect()
            });
            prop_assert_eq!(remaining, local_keys);
        }
    }
}
