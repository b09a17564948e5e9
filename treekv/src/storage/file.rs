//! File-backed storage.
//!
//! This module handles reading and writing byte ranges of one on-disk file.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::storage::io::{Storage, StorageError, check_bounds};

/// A file opened in read/write binary mode.
pub struct FileStorage {
    file: File,
    path: PathBuf,
    size: u64,
}

impl FileStorage {
    /// Open the file at `path`, creating it empty if it does not exist.
    pub fn open_or_create(path: &Path) -> Result<Self, StorageError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let size = file.metadata()?.len();

        tracing::debug!("opened {} ({size} bytes)", path.display());

        Ok(Self {
            file,
            path: path.to_path_buf(),
            size,
        })
    }

    /// Path this storage was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Storage for FileStorage {
    fn size(&self) -> u64 {
        self.size
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<(), StorageError> {
        check_bounds(offset, buf.len(), self.size)?;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(buf)?;
        Ok(())
    }

    fn write_at(&mut self, offset: u64, data: &[u8]) -> Result<(), StorageError> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(data)?;
        self.size = self.size.max(offset + data.len() as u64);
        Ok(())
    }

    fn sync(&mut self) -> Result<(), StorageError> {
        self.file.flush()?;
        self.file.sync_data()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_create_and_reopen() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("index.txt");

        {
            let mut storage = FileStorage::open_or_create(&path).expect("create");
            assert!(storage.is_empty());
            let offset = storage.append(b"hello").expect("append");
            assert_eq!(offset, 0);
            storage.sync().expect("sync");
        }

        {
            let mut storage = FileStorage::open_or_create(&path).expect("reopen");
            assert_eq!(storage.size(), 5);
            let mut buf = [0u8; 5];
            storage.read_at(0, &mut buf).expect("read");
            assert_eq!(&buf, b"hello");
        }
    }

    #[test]
    fn test_existing_file_is_not_truncated() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("data.txt");
        fs::write(&path, b"existing").expect("write file");

        let storage = FileStorage::open_or_create(&path).expect("open");
        assert_eq!(storage.size(), 8);
        assert_eq!(storage.path(), path.as_path());
    }

    #[test]
    fn test_overwrite_in_place() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("data.txt");
        let mut storage = FileStorage::open_or_create(&path).expect("create");

        storage.append(b"abcdef").expect("append");
        storage.write_at(2, b"XY").expect("write");

        let mut buf = [0u8; 6];
        storage.read_at(0, &mut buf).expect("read");
        assert_eq!(&buf, b"abXYef");
        assert_eq!(storage.size(), 6);
    }

    #[test]
    fn test_read_past_end() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("data.txt");
        let mut storage = FileStorage::open_or_create(&path).expect("create");
        storage.append(b"abc").expect("append");

        let mut buf = [0u8; 4];
        let result = storage.read_at(0, &mut buf);
        assert!(matches!(result, Err(StorageError::OutOfBounds { .. })));
    }
}
