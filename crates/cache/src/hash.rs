use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Files are streamed through the hasher in chunks of this size.
pub const HASH_CHUNK_SIZE: usize = 8 * 1024 * 1024;

/// Lowercase hex SHA-256 of the file's full contents.
///
/// Blocking; async callers should run this on a blocking thread.
pub fn hash_file(path: impl AsRef<Path>) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; HASH_CHUNK_SIZE];
    loop {
        let read = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    #[rstest]
    #[case::empty(b"", "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")]
    #[case::abc(b"abc", "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")]
    fn test_known_digests(#[case] content: &[u8], #[case] expected: &str) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        assert_eq!(hash_file(file.path()).unwrap(), expected);
    }

    #[test]
    fn test_hash_spans_multiple_chunks() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let block = vec![7u8; HASH_CHUNK_SIZE];
        file.write_all(&block).unwrap();
        file.write_all(b"tail").unwrap();

        let mut hasher = Sha256::new();
        hasher.update(&block);
        hasher.update(b"tail");
        assert_eq!(hash_file(file.path()).unwrap(), format!("{:x}", hasher.finalize()));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = hash_file(dir.path().join("nope.jpg")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
