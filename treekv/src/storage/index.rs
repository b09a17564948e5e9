//! Index Store: the header followed by fixed-size node records.
//!
//! Records are only ever appended or rewritten in place, so a node keeps
//! its offset for the lifetime of the file and record order reflects
//! insertion order.

use crate::storage::error::StoreError;
use crate::storage::header::Header;
use crate::storage::io::Storage;
use crate::storage::layout::{HEADER_SIZE_U64, NODE_SIZE, is_valid_index_len, record_count};
use crate::storage::node::{Node, NodeOffset};

/// Node record storage on top of a byte store.
pub struct IndexStore<S> {
    storage: S,
    header: Header,
}

impl<S: Storage> IndexStore<S> {
    /// Open an Index Store, writing a fresh header if the store is empty.
    ///
    /// Fails with `StorageCorrupt` unless the store holds exactly a header
    /// plus a whole number of records.
    pub fn open(mut storage: S) -> Result<Self, StoreError> {
        if storage.is_empty() {
            Header::new().write_to(&mut storage)?;
            tracing::info!("initialized empty index store");
        }

        let size = storage.size();
        if !is_valid_index_len(size) {
            return Err(StoreError::StorageCorrupt(format!(
                "index store is {size} bytes, expected a {HEADER_SIZE_U64}-byte header plus {NODE_SIZE}-byte records"
            )));
        }

        let header = Header::read_from(&mut storage)?;
        if !header.is_zeroed() {
            tracing::warn!("index store header has non-zero reserved bytes");
        }

        tracing::debug!("index store holds {} node records", record_count(size));

        Ok(Self { storage, header })
    }

    /// The reserved header read at open.
    #[must_use]
    pub const fn header(&self) -> &Header {
        &self.header
    }

    /// Current size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.storage.size()
    }

    /// Number of node records.
    #[must_use]
    pub fn record_count(&self) -> u64 {
        record_count(self.storage.size())
    }

    /// Whether a root record exists.
    #[must_use]
    pub fn has_root(&self) -> bool {
        self.storage.size() > HEADER_SIZE_U64
    }

    /// Offset the next created node will occupy (the current end of file).
    pub fn next_offset(&self) -> Result<NodeOffset, StoreError> {
        let size = self.storage.size();
        NodeOffset::new(size).ok_or_else(|| {
            StoreError::StorageCorrupt(format!("index store end {size} is not a record boundary"))
        })
    }

    /// Read and decode the record at `offset`.
    pub fn read_node(&mut self, offset: NodeOffset) -> Result<Node, StoreError> {
        let mut buf = [0u8; NODE_SIZE];
        self.storage
            .read_at(offset.get(), &mut buf)
            .map_err(StoreError::index_read)?;
        Node::decode(offset, &buf, self.storage.size())
    }

    /// Encode and write `node` at its own offset, then sync.
    ///
    /// The offset must be an existing record or the current end of file.
    pub fn write_node(&mut self, node: &Node) -> Result<(), StoreError> {
        let size = self.storage.size();
        if node.offset.get() > size {
            return Err(StoreError::StorageCorrupt(format!(
                "node offset {} lies past the end of the index store (size: {size})",
                node.offset
            )));
        }

        self.storage
            .write_at(node.offset.get(), &node.encode())
            .map_err(StoreError::write)?;
        self.storage.sync().map_err(StoreError::write)?;

        tracing::debug!("wrote node {} at offset {}", node.key, node.offset);
        Ok(())
    }

    /// Mutable access to the underlying storage.
    pub const fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }
}
