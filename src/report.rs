//! User-facing lines on stdout. Logging goes to stderr separately.

use bytesize::ByteSize;
use photosync_engine::Summary;
use photosync_engine::sweep::SweepEvent;
use photosync_engine::sync::{Action, SyncEvent};
use std::time::Duration;

const DRY_RUN: &str = " (dry-run)";

pub fn action_line(action: &Action, dry_run: bool) -> String {
    match action {
        Action::Skipped { path, reason } => format!("SKIP  {}  ({reason})", path.display()),
        Action::Uploaded { path, uri, size, .. } => format!(
            "UPLOAD {} -> {uri} ({}){}",
            path.display(),
            ByteSize::b(*size),
            if dry_run { DRY_RUN } else { "" }
        ),
        Action::Duplicate { path, canonical } => format!("DUPLICATE {} (same as {canonical})", path.display()),
    }
}

/// The line for a sync event, if it has one.
pub fn sync_line(event: &SyncEvent, dry_run: bool) -> Option<String> {
    match event {
        SyncEvent::Synced(action) => Some(action_line(action, dry_run)),
        SyncEvent::Failed(path, error) => Some(format!("ERROR {} ({error})", path.display())),
        SyncEvent::Started | SyncEvent::DiscoveryComplete(_) | SyncEvent::Complete => None,
    }
}

pub fn sweep_line(event: &SweepEvent) -> Option<String> {
    match event {
        SweepEvent::Deleted { uri, dry_run } => Some(format!("DELETE {uri}{}", if *dry_run { DRY_RUN } else { "" })),
        SweepEvent::Failed(uri, error) => Some(format!("ERROR deleting {uri} ({error})")),
        SweepEvent::Declined(_) => None,
    }
}

pub fn summary_line(summary: &Summary, elapsed: Duration) -> String {
    format!(
        "Summary: scanned={} uploaded={} skipped={} duplicates={} errors={} bytes_uploaded={} deleted={} elapsed={:.1}s",
        summary.scanned,
        summary.uploaded,
        summary.skipped,
        summary.duplicates,
        summary.errors,
        ByteSize::b(summary.uploaded_bytes),
        summary.deleted,
        elapsed.as_secs_f64(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use photosync_engine::decision::Reason;
    use rstest::rstest;
    use std::path::PathBuf;

    #[test]
    fn test_skip_line() {
        let action = Action::Skipped { path: PathBuf::from("/p/a.jpg"), reason: Reason::HashMatch };
        assert_eq!(action_line(&action, false), "SKIP  /p/a.jpg  (remote hash match)");
    }

    #[rstest]
    #[case::real(false, "UPLOAD /p/a.jpg -> s3://b/a.jpg (10 B)")]
    #[case::dry_run(true, "UPLOAD /p/a.jpg -> s3://b/a.jpg (10 B) (dry-run)")]
    fn test_upload_line(#[case] dry_run: bool, #[case] expected: &str) {
        let action = Action::Uploaded {
            path: PathBuf::from("/p/a.jpg"),
            uri: "s3://b/a.jpg".to_string(),
            size: 10,
            reason: Reason::RemoteMissing,
        };
        assert_eq!(action_line(&action, dry_run), expected);
    }

    #[test]
    fn test_duplicate_line() {
        let action = Action::Duplicate { path: PathBuf::from("/p/b.jpg"), canonical: "s3://b/a.jpg".to_string() };
        assert_eq!(action_line(&action, false), "DUPLICATE /p/b.jpg (same as s3://b/a.jpg)");
    }

    #[rstest]
    #[case::real(false, "DELETE s3://b/x.jpg")]
    #[case::dry_run(true, "DELETE s3://b/x.jpg (dry-run)")]
    fn test_delete_line(#[case] dry_run: bool, #[case] expected: &str) {
        let event = SweepEvent::Deleted { uri: "s3://b/x.jpg".to_string(), dry_run };
        assert_eq!(sweep_line(&event).as_deref(), Some(expected));
        assert_eq!(sweep_line(&SweepEvent::Declined("s3://b/x.jpg".to_string())), None);
    }

    #[test]
    fn test_summary_line() {
        let summary = Summary { scanned: 3, uploaded: 1, uploaded_bytes: 10, skipped: 2, ..Summary::default() };
        assert_eq!(
            summary_line(&summary, Duration::from_millis(1300)),
            "Summary: scanned=3 uploaded=1 skipped=2 duplicates=0 errors=0 bytes_uploaded=10 B deleted=0 elapsed=1.3s"
        );
    }
}
