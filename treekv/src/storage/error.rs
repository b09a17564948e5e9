//! Errors surfaced by the store.

use crate::storage::io::StorageError;

/// Errors that can occur during store operations.
///
/// A missing key is not an error: lookups return `Ok(None)`.
#[derive(Debug)]
pub enum StoreError {
    /// The Index Store has an impossible length or a record failed to decode.
    StorageCorrupt(String),
    /// A stored value is not valid UTF-8 or the heap is shorter than its length.
    Decode(String),
    /// A write, append or sync failed.
    StorageWrite(StorageError),
    /// A read failed for a reason other than corruption.
    StorageRead(StorageError),
    /// The value cannot be stored (it contains the record separator).
    InvalidValue(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StorageCorrupt(msg) => write!(f, "storage corrupt: {msg}"),
            Self::Decode(msg) => write!(f, "decode error: {msg}"),
            Self::StorageWrite(e) => write!(f, "storage write error: {e}"),
            Self::StorageRead(e) => write!(f, "storage read error: {e}"),
            Self::InvalidValue(msg) => write!(f, "invalid value: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::StorageWrite(e) | Self::StorageRead(e) => Some(e),
            Self::StorageCorrupt(_) | Self::Decode(_) | Self::InvalidValue(_) => None,
        }
    }
}

impl StoreError {
    /// Wrap a failed write-side storage operation.
    #[must_use]
    pub const fn write(e: StorageError) -> Self {
        Self::StorageWrite(e)
    }

    /// Wrap a failed read of the Index Store.
    ///
    /// A read past the end means a record pointer leads outside the file,
    /// which is corruption rather than an I/O fault.
    #[must_use]
    pub fn index_read(e: StorageError) -> Self {
        match e {
            StorageError::OutOfBounds { offset, len, size } => Self::StorageCorrupt(format!(
                "node record at offset {offset} ({len} bytes) lies beyond the index store (size: {size})"
            )),
            other => Self::StorageRead(other),
        }
    }

    /// Wrap a failed read of the Value Heap.
    #[must_use]
    pub fn heap_read(e: StorageError) -> Self {
        match e {
            StorageError::OutOfBounds { offset, len, size } => Self::Decode(format!(
                "value heap truncated: need {len} bytes at offset {offset}, heap size is {size}"
            )),
            other => Self::StorageRead(other),
        }
    }
}
