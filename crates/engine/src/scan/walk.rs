use crate::scan::{Filter, LocalFile, ScanEntry};
use filetime::FileTime;
use photosync_storage::validate_key;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Walk `root` and yield every regular file beneath it.
///
/// Directories are never yielded. Symlinked directories are only descended
/// into when `follow_symlinks` is set, but a symlink to a regular file is
/// always treated as that file. Walk errors (permission denied, symlink
/// loops, entries deleted mid-walk) surface as [`ScanEntry::Vanished`].
///
/// The returned iterator blocks on filesystem I/O; async callers should drive
/// it from a blocking thread.
pub fn scan<'a>(root: &'a Path, filter: &'a Filter, follow_symlinks: bool) -> impl Iterator<Item = ScanEntry> + 'a {
    WalkDir::new(root).min_depth(1).follow_links(follow_symlinks).sort_by_file_name().into_iter().filter_map(
        move |entry| match entry {
            Ok(entry) => inspect(root, filter, &entry),
            Err(err) => {
                let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                tracing::warn!(path = %path.display(), error = %err, "skipping unreadable path");
                Some(ScanEntry::Vanished(path))
            },
        },
    )
}

fn inspect(root: &Path, filter: &Filter, entry: &DirEntry) -> Option<ScanEntry> {
    if entry.file_type().is_dir() {
        return None;
    }
    let path = entry.path().to_path_buf();
    let relative = match entry.path().strip_prefix(root).map(validate_key) {
        Ok(Ok(relative)) => relative,
        _ => {
            tracing::warn!(path = %path.display(), "skipping path that cannot be used as an object key");
            return Some(ScanEntry::Filtered(path));
        },
    };
    if !filter.matches(&relative) {
        tracing::trace!(path = %relative, "filtered");
        return Some(ScanEntry::Filtered(path));
    }
    stat(path, relative)
}

fn stat(path: PathBuf, relative: String) -> Option<ScanEntry> {
    // Follows symlinks, so a dangling link shows up as vanished.
    let metadata = match std::fs::metadata(&path) {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "file vanished before stat");
            return Some(ScanEntry::Vanished(path));
        },
    };
    if !metadata.is_file() {
        // Sockets, FIFOs, devices, and directory symlinks we aren't following.
        return None;
    }
    let mtime = FileTime::from_last_modification_time(&metadata).unix_seconds();
    Some(ScanEntry::File(LocalFile::new(path, relative, metadata.len(), mtime)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::set_file_mtime;
    use std::fs;

    fn tree(files: &[(&str, &[u8])]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (relative, content) in files {
            let path = dir.path().join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, content).unwrap();
        }
        dir
    }

    fn files(root: &Path, filter: &Filter, follow: bool) -> Vec<LocalFile> {
        scan(root, filter, follow).filter_map(ScanEntry::into_file).collect()
    }

    #[test]
    fn test_scan_relative_paths_and_order() {
        let dir = tree(&[("b/c.jpg", b"cc"), ("a.jpg", b"a"), ("b/a.png", b"")]);
        let found = files(dir.path(), &Filter::default(), false);
        let relative: Vec<_> = found.iter().map(|f| f.relative.as_str()).collect();
        assert_eq!(relative, ["a.jpg", "b/a.png", "b/c.jpg"]);
        assert_eq!(found[2].size, 2);
        assert_eq!(found[2].path, dir.path().join("b").join("c.jpg"));
    }

    #[test]
    fn test_scan_truncates_mtime() {
        let dir = tree(&[("a.jpg", b"a")]);
        set_file_mtime(dir.path().join("a.jpg"), FileTime::from_unix_time(1_700_000_000, 999_999_999)).unwrap();
        let found = files(dir.path(), &Filter::default(), false);
        assert_eq!(found[0].mtime, 1_700_000_000);
    }

    #[test]
    fn test_scan_applies_filter() {
        let dir = tree(&[("a.jpg", b""), (".DS_Store", b""), ("notes.txt", b""), ("raw/b.jpg", b"")]);
        let filter = Filter::new(["*.jpg"], ["raw/*"]).unwrap();
        let entries: Vec<_> = scan(dir.path(), &filter, false).collect();
        let kept: Vec<_> = entries.iter().filter_map(|e| e.clone().into_file()).map(|f| f.relative).collect();
        assert_eq!(kept, ["a.jpg"]);
        let filtered = entries.iter().filter(|e| matches!(e, ScanEntry::Filtered(_))).count();
        assert_eq!(filtered, 3);
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_symlinks() {
        let dir = tree(&[("real/a.jpg", b"a")]);
        let outside = tree(&[("b.jpg", b"b")]);
        std::os::unix::fs::symlink(outside.path(), dir.path().join("linked")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("real/a.jpg"), dir.path().join("alias.jpg")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("missing.jpg"), dir.path().join("dangling.jpg")).unwrap();

        let relative = |follow| {
            files(dir.path(), &Filter::default(), follow).into_iter().map(|f| f.relative).collect::<Vec<_>>()
        };
        assert_eq!(relative(false), ["alias.jpg", "real/a.jpg"]);
        assert_eq!(relative(true), ["alias.jpg", "linked/b.jpg", "real/a.jpg"]);

        let vanished: Vec<_> = scan(dir.path(), &Filter::default(), false)
            .filter_map(|e| match e {
                ScanEntry::Vanished(path) => Some(path),
                _ => None,
            })
            .collect();
        assert_eq!(vanished, [dir.path().join("dangling.jpg")]);
    }

    #[test]
    fn test_scan_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("empty")).unwrap();
        assert_eq!(scan(dir.path(), &Filter::default(), false).count(), 0);
    }
}
