//! Index Store header.
//!
//! The header occupies bytes `0..128` of the Index Store. It is reserved:
//! it is zero-filled on creation and nothing reads meaning out of it yet.

use crate::storage::error::StoreError;
use crate::storage::io::Storage;
use crate::storage::layout::HEADER_SIZE;

/// The reserved block at the start of the Index Store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    bytes: [u8; HEADER_SIZE],
}

impl Header {
    /// Create a zero-filled header for a fresh store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bytes: [0u8; HEADER_SIZE],
        }
    }

    /// Raw header bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; HEADER_SIZE] {
        &self.bytes
    }

    /// Whether every reserved byte is still zero.
    #[must_use]
    pub fn is_zeroed(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0)
    }

    /// Read the header from offset 0.
    pub fn read_from<S: Storage>(storage: &mut S) -> Result<Self, StoreError> {
        let mut bytes = [0u8; HEADER_SIZE];
        storage
            .read_at(0, &mut bytes)
            .map_err(StoreError::index_read)?;
        Ok(Self { bytes })
    }

    /// Write the header to offset 0 and sync.
    pub fn write_to<S: Storage>(&self, storage: &mut S) -> Result<(), StoreError> {
        storage
            .write_at(0, &self.bytes)
            .map_err(StoreError::write)?;
        storage.sync().map_err(StoreError::write)
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::new()
    }
}
