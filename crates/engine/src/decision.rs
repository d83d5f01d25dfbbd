//! Skip-or-upload decisions.
//!
//! [`decide`] is a pure function of the remote state, the local file and
//! (only when the remote carries one) the local content hash. Rules are
//! evaluated in order and the first match wins:
//!
//! 1. No remote object: upload.
//! 2. Remote `sha256` tag: skip when it equals the local hash, else upload.
//! 3. Remote `size` and `mtime` tags both equal the local values: skip.
//! 4. Anything else: upload.

use crate::error::{ErrorKind, Result};
use crate::remote::RemoteState;
use crate::scan::LocalFile;
use derive_more::Display;
use photosync_storage::ObjectTags;

/// Why a file was skipped or uploaded, in the words printed to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Reason {
    #[display("remote missing")]
    RemoteMissing,
    #[display("remote hash match")]
    HashMatch,
    #[display("remote hash mismatch")]
    HashMismatch,
    #[display("remote size+mtime match")]
    SizeMtimeMatch,
    #[display("remote metadata mismatch")]
    MetadataMismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Upload(Reason),
    Skip(Reason),
}

impl Verdict {
    pub fn reason(&self) -> Reason {
        match self {
            Self::Upload(reason) | Self::Skip(reason) => *reason,
        }
    }
}

/// # Errors
/// [`ErrorKind::MissingLocalHash`] if the remote object carries a content
/// hash and `local_hash` is `None`; see [`RemoteState::needs_local_hash`].
pub fn decide(remote: &RemoteState, file: &LocalFile, local_hash: Option<&str>) -> Result<Verdict> {
    if !remote.exists {
        return Ok(Verdict::Upload(Reason::RemoteMissing));
    }
    if let Some(remote_hash) = remote.sha256() {
        let Some(local_hash) = local_hash else {
            exn::bail!(ErrorKind::MissingLocalHash);
        };
        return Ok(if remote_hash == local_hash {
            Verdict::Skip(Reason::HashMatch)
        } else {
            Verdict::Upload(Reason::HashMismatch)
        });
    }
    // Metadata values are strings; compare in that domain.
    let size = file.size.to_string();
    let mtime = file.mtime.to_string();
    if remote.tag(ObjectTags::SIZE) == Some(size.as_str()) && remote.tag(ObjectTags::MTIME) == Some(mtime.as_str()) {
        return Ok(Verdict::Skip(Reason::SizeMtimeMatch));
    }
    Ok(Verdict::Upload(Reason::MetadataMismatch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use photosync_storage::RemoteMetadata;
    use proptest::prelude::*;
    use rstest::rstest;

    fn file(size: u64, mtime: i64) -> LocalFile {
        LocalFile::new("/photos/a.jpg", "a.jpg", size, mtime)
    }

    fn remote(tags: &[(&str, &str)]) -> RemoteState {
        RemoteState::found(tags.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect::<RemoteMetadata>())
    }

    #[rstest]
    #[case::hash_match(&[("sha256", "abc")], Some("abc"), Verdict::Skip(Reason::HashMatch))]
    #[case::hash_mismatch(&[("sha256", "abc")], Some("def"), Verdict::Upload(Reason::HashMismatch))]
    #[case::hash_beats_size_mtime(
        &[("sha256", "abc"), ("size", "10"), ("mtime", "20")],
        Some("def"),
        Verdict::Upload(Reason::HashMismatch)
    )]
    #[case::size_mtime_match(&[("size", "10"), ("mtime", "20")], None, Verdict::Skip(Reason::SizeMtimeMatch))]
    #[case::size_differs(&[("size", "11"), ("mtime", "20")], None, Verdict::Upload(Reason::MetadataMismatch))]
    #[case::mtime_differs(&[("size", "10"), ("mtime", "21")], None, Verdict::Upload(Reason::MetadataMismatch))]
    #[case::size_only(&[("size", "10")], None, Verdict::Upload(Reason::MetadataMismatch))]
    #[case::untagged(&[], None, Verdict::Upload(Reason::MetadataMismatch))]
    #[case::not_string_equal(&[("size", "010"), ("mtime", "20")], None, Verdict::Upload(Reason::MetadataMismatch))]
    fn test_decide(#[case] tags: &[(&str, &str)], #[case] local_hash: Option<&str>, #[case] expected: Verdict) {
        assert_eq!(decide(&remote(tags), &file(10, 20), local_hash).unwrap(), expected);
    }

    #[test]
    fn test_missing_local_hash_is_an_error() {
        let err = decide(&remote(&[("sha256", "abc")]), &file(1, 1), None).unwrap_err();
        assert!(matches!(&*err, ErrorKind::MissingLocalHash));
    }

    #[rstest]
    #[case(Reason::RemoteMissing, "remote missing")]
    #[case(Reason::HashMatch, "remote hash match")]
    #[case(Reason::HashMismatch, "remote hash mismatch")]
    #[case(Reason::SizeMtimeMatch, "remote size+mtime match")]
    #[case(Reason::MetadataMismatch, "remote metadata mismatch")]
    fn test_reason_wording(#[case] reason: Reason, #[case] expected: &str) {
        assert_eq!(reason.to_string(), expected);
    }

    fn any_metadata() -> impl Strategy<Value = RemoteMetadata> {
        prop::collection::hash_map(
            prop::sample::select(vec!["sha256", "size", "mtime", "other"]).prop_map(String::from),
            "[0-9a-f]{0,8}",
            0..4,
        )
    }

    proptest! {
        #[test]
        fn prop_equal_hash_always_skips(
            hash in "[0-9a-f]{64}",
            size in any::<u64>(),
            mtime in any::<i64>(),
            mut extra in any_metadata(),
        ) {
            extra.insert("sha256".to_string(), hash.clone());
            let verdict = decide(&RemoteState::found(extra), &file(size, mtime), Some(&hash)).unwrap();
            prop_assert_eq!(verdict, Verdict::Skip(Reason::HashMatch));
        }

        #[test]
        fn prop_missing_remote_always_uploads(
            size in any::<u64>(),
            mtime in any::<i64>(),
            metadata in proptest::option::of(any_metadata()),
            local_hash in proptest::option::of("[0-9a-f]{64}"),
        ) {
            let remote = RemoteState { exists: false, metadata };
            let verdict = decide(&remote, &file(size, mtime), local_hash.as_deref()).unwrap();
            prop_assert_eq!(verdict, Verdict::Upload(Reason::RemoteMissing));
        }
    }
}
