//! Key validation utilities.
//!
//! Object keys are derived from local relative paths, so this module makes
//! sure a relative path can never produce a key that escapes the destination
//! prefix, and that the key always uses `/` separators.

use std::path::{Component, Path};

use crate::error::{ErrorKind, Result};

/// Validates a relative path and renders it as a POSIX-style object key.
///
/// > **Note:** Non-UTF8 paths are rejected rather than lossily converted,
/// >           otherwise two different local files could map onto one key.
///
/// # Examples
///
/// ```
/// use photosync_storage::validate_key;
/// assert_eq!(validate_key("2024/trip/img.jpg").unwrap(), "2024/trip/img.jpg");
/// assert_eq!(validate_key("a/./b//c.jpg").unwrap(), "a/b/c.jpg");
/// assert_eq!(validate_key("a/../b.jpg").unwrap(), "b.jpg"); // (never leaves prefix)
/// assert!(validate_key("../etc/passwd").is_err());
/// assert!(validate_key("a\0b").is_err());
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let mut components: Vec<&str> = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(s) => {
                // Null bytes pass through Path::components() on Unix but cause
                // truncation in C-based syscalls; reject them explicitly.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidKey(path.to_path_buf()));
                }
                let Some(s) = s.to_str() else {
                    exn::bail!(ErrorKind::InvalidKey(path.to_path_buf()));
                };
                components.push(s);
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidKey(path.to_path_buf())),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidKey(path.to_path_buf()));
                }
            },
        }
    }
    match components.is_empty() {
        true => exn::bail!(ErrorKind::InvalidKey(path.to_path_buf())),
        false => Ok(components.join("/")),
    }
}
