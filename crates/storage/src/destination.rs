//! Destination addressing: a bucket plus a normalized key prefix.

use crate::error::{ErrorKind, Result};
use std::fmt;
use std::str::FromStr;

const SCHEME: &str = "s3://";

/// Where a sync run writes to.
///
/// The prefix is either empty or terminated by exactly one `/`, so keys are
/// derived by plain concatenation.
///
/// ```
/// use photosync_storage::Destination;
///
/// let dest: Destination = "s3://bucket/photos/2025".parse().unwrap();
/// assert_eq!(dest.prefix(), "photos/2025/");
/// assert_eq!(dest.key_for("trip/img.jpg"), "photos/2025/trip/img.jpg");
/// assert_eq!(dest.uri_for_key("photos/2025/trip/img.jpg"), "s3://bucket/photos/2025/trip/img.jpg");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Destination {
    bucket: String,
    prefix: String,
}

impl Destination {
    pub fn new(bucket: impl Into<String>, prefix: impl AsRef<str>) -> Result<Self> {
        let bucket = bucket.into();
        if bucket.is_empty() || bucket.contains('/') {
            exn::bail!(ErrorKind::InvalidDestination(bucket));
        }
        let prefix = prefix.as_ref().trim_start_matches('/');
        let prefix = match prefix.is_empty() || prefix.ends_with('/') {
            true => prefix.to_string(),
            false => format!("{prefix}/"),
        };
        Ok(Self { bucket, prefix })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Destination key for a POSIX-style path relative to the sync root.
    pub fn key_for(&self, relative: &str) -> String {
        format!("{}{relative}", self.prefix)
    }

    /// Canonical URI of a key inside this destination's bucket.
    pub fn uri_for_key(&self, key: &str) -> String {
        format!("{SCHEME}{}/{key}", self.bucket)
    }

    /// Reverse of [`uri_for_key()`](Self::uri_for_key): the key addressed by
    /// `uri`, if and only if it lives in this destination's bucket.
    pub fn key_from_uri<'a>(&self, uri: &'a str) -> Option<&'a str> {
        uri.strip_prefix(SCHEME)?
            .strip_prefix(self.bucket.as_str())?
            .strip_prefix('/')
            .filter(|key| !key.is_empty())
    }
}

impl FromStr for Destination {
    type Err = crate::error::Error;

    fn from_str(value: &str) -> Result<Self> {
        let Some(rest) = value.strip_prefix(SCHEME) else {
            exn::bail!(ErrorKind::InvalidDestination(value.to_string()));
        };
        let (bucket, prefix) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() {
            exn::bail!(ErrorKind::InvalidDestination(value.to_string()));
        }
        Self::new(bucket, prefix)
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SCHEME}{}/{}", self.bucket, self.prefix)
    }
}
