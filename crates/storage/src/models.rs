//! Storage models.
//!
//! These types describe objects as the store reports them (listing), and the
//! custom tags photosync attaches to every object it uploads.

use std::collections::HashMap;
use std::path::Path;

/// Custom metadata on a remote object, exactly as the store returned it.
///
/// Objects written by other tools (or by older versions of this one) may
/// carry none of the tags photosync knows about. That is a valid state.
pub type RemoteMetadata = HashMap<String, String>;

/// Object metadata returned by listing operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Full key, including the destination prefix
    pub key: String,
    /// Object size in bytes
    pub size: u64,
    /// Last modified timestamp (Unix epoch seconds), if the store reported one
    pub last_modified: Option<i64>,
}
impl ObjectInfo {
    pub fn new(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size,
            last_modified: None,
        }
    }

    pub fn with_last_modified(mut self, last_modified: i64) -> Self {
        self.last_modified = Some(last_modified);
        self
    }
}

/// The tags photosync writes on upload, so that future runs can decide
/// whether an object is up to date without downloading it.
///
/// All values are serialized as strings; the decision engine compares them as
/// strings too, so `mtime` must always be integer seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectTags {
    pub sha256: String,
    pub size: u64,
    pub mtime: i64,
}
impl ObjectTags {
    pub const SHA256: &'static str = "sha256";
    pub const SIZE: &'static str = "size";
    pub const MTIME: &'static str = "mtime";

    pub fn new(sha256: impl Into<String>, size: u64, mtime: i64) -> Self {
        Self {
            sha256: sha256.into(),
            size,
            mtime,
        }
    }

    pub fn to_metadata(&self) -> RemoteMetadata {
        HashMap::from([
            (Self::SHA256.to_string(), self.sha256.clone()),
            (Self::SIZE.to_string(), self.size.to_string()),
            (Self::MTIME.to_string(), self.mtime.to_string()),
        ])
    }
}

/// Guess a `Content-Type` from the file extension.
///
/// Only covers what tends to live in a photo library; everything else is left
/// for the store to default.
pub fn content_type_for(path: impl AsRef<Path>) -> Option<&'static str> {
    let extension = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
    Some(match extension.as_str() {
        "jpg" | "jpeg" | "jpe" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "avif" => "image/avif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        "mp4" | "m4v" => "video/mp4",
        "mov" | "qt" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "3gp" => "video/3gpp",
        "json" => "application/json",
        "txt" => "text/plain",
        "html" | "htm" => "text/html",
        _ => return None,
    })
}
