//! Bounded whole-file reads.
//!
//! Files are loaded into a single buffer only when their size is within the
//! configured limit, so an oversized file can never exhaust memory.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use bytes::Bytes;

use crate::error::ReadError;

/// Reads the whole file at `path` if it is no larger than `max_bytes`.
///
/// The size is taken from the open file's metadata before reading, and the
/// returned buffer is exactly that long. A zero-length file is a successful,
/// empty read. Failures are logged here and returned as [`ReadError`].
pub fn read(path: &Path, max_bytes: u64) -> Result<Bytes, ReadError> {
    let result = read_bounded(path, max_bytes);

    match &result {
        Ok(content) => {
            tracing::debug!(path = %path.display(), bytes = content.len(), "Read file");
        }
        Err(err @ ReadError::TooLarge { .. }) => {
            tracing::warn!(path = %path.display(), error = %err, "Refusing oversized file");
        }
        Err(err) => {
            tracing::error!(path = %path.display(), error = %err, "Failed to read file");
        }
    }

    result
}

fn read_bounded(path: &Path, max_bytes: u64) -> Result<Bytes, ReadError> {
    let file = File::open(path).map_err(|source| ReadError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let size = file
        .metadata()
        .map_err(|source| ReadError::Metadata {
            path: path.to_path_buf(),
            source,
        })?
        .len();

    if size > max_bytes {
        return Err(ReadError::TooLarge {
            path: path.to_path_buf(),
            size,
            max: max_bytes,
        });
    }

    let capacity = usize::try_from(size).map_err(|_| ReadError::TooLarge {
        path: path.to_path_buf(),
        size,
        max: max_bytes,
    })?;

    let mut buffer = Vec::with_capacity(capacity);
    let read = file
        .take(size)
        .read_to_end(&mut buffer)
        .map_err(|source| ReadError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    // The file shrank between stat and read.
    if read != capacity {
        return Err(ReadError::Read {
            path: path.to_path_buf(),
            source: io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("expected {size} bytes, read {read}"),
            ),
        });
    }

    Ok(Bytes::from(buffer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_read_text_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hello.txt");
        fs::write(&path, "héllo wörld ✓").unwrap();

        let content = read(&path, 1024).unwrap();
        assert_eq!(&content[..], "héllo wörld ✓".as_bytes());
    }

    #[test]
    fn test_read_every_byte_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("all.bin");
        let data: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        fs::write(&path, &data).unwrap();

        let content = read(&path, 4096).unwrap();
        assert_eq!(content.len(), data.len());
        assert_eq!(&content[..], &data[..]);
    }

    #[test]
    fn test_read_at_exact_limit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("exact.bin");
        fs::write(&path, [7u8; 100]).unwrap();

        assert_eq!(read(&path, 100).unwrap().len(), 100);
    }

    #[test]
    fn test_read_oversized_refused_and_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("huge.bin");
        fs::write(&path, [1u8; 101]).unwrap();

        let err = read(&path, 100).unwrap_err();
        assert!(matches!(err, ReadError::TooLarge { size: 101, max: 100, .. }));
        assert_eq!(fs::read(&path).unwrap(), vec![1u8; 101]);
    }

    #[test]
    fn test_read_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = read(&dir.path().join("nope.txt"), 1024).unwrap_err();
        assert!(matches!(err, ReadError::Open { .. }));
    }

    #[test]
    fn test_read_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.txt");
        fs::write(&path, "").unwrap();

        assert!(read(&path, 1024).unwrap().is_empty());
    }
}
