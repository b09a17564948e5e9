//! Storage abstraction for deterministic simulation testing.
//!
//! The Index Store and the Value Heap are both plain byte stores addressed by
//! offset. This module provides a `Storage` trait over that shape, so the
//! tree can run against real files in production and against simulated
//! in-memory storage in tests.
//!
//! Implementations must ensure:
//! - `read_at` returns the last bytes written at those offsets
//! - `read_at` never returns fewer bytes than requested; short reads are
//!   reported as `OutOfBounds`
//! - `sync` makes all previous writes durable

/// Errors that can occur during storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// I/O error.
    Io(std::io::Error),
    /// Read past the end of the store.
    OutOfBounds { offset: u64, len: u64, size: u64 },
    /// Injected fault for simulation.
    InjectedFault(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::OutOfBounds { offset, len, size } => write!(
                f,
                "read of {len} bytes at offset {offset} out of bounds (size: {size})"
            ),
            Self::InjectedFault(msg) => write!(f, "injected fault: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::OutOfBounds { .. } | Self::InjectedFault(_) => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Abstraction over an offset-addressed byte store.
pub trait Storage {
    /// Current size of the store in bytes.
    fn size(&self) -> u64;

    /// Whether the store holds no bytes.
    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Fill `buf` with the bytes starting at `offset`.
    ///
    /// Returns `OutOfBounds` if the store ends before `buf` is full.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<(), StorageError>;

    /// Write `data` starting at `offset`, growing the store if needed.
    ///
    /// The write may be buffered until `sync` is called.
    fn write_at(&mut self, offset: u64, data: &[u8]) -> Result<(), StorageError>;

    /// Sync all pending writes to durable storage.
    fn sync(&mut self) -> Result<(), StorageError>;

    /// Write `data` at the current end of the store.
    ///
    /// Returns the offset the data was written at.
    fn append(&mut self, data: &[u8]) -> Result<u64, StorageError> {
        let offset = self.size();
        self.write_at(offset, data)?;
        Ok(offset)
    }
}

/// Bounds check shared by implementations of `read_at`.
pub(crate) const fn check_bounds(offset: u64, len: usize, size: u64) -> Result<(), StorageError> {
    let len = len as u64;
    match offset.checked_add(len) {
        Some(end) if end <= size => Ok(()),
        _ => Err(StorageError::OutOfBounds { offset, len, size }),
    }
}
