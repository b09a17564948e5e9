//! High-level store interface.
//!
//! Provides a clean API for opening a store on disk and running
//! lookups and inserts against it.

use std::path::Path;

use crate::config::StoreConfig;
use crate::storage::error::StoreError;
use crate::storage::file::FileStorage;
use crate::storage::heap::ValueHeap;
use crate::storage::index::IndexStore;
use crate::storage::node::Key;
use crate::storage::tree::BinaryTree;

/// A key-value store backed by an Index Store file and a Value Heap file.
///
/// This is the main entry point for working with the storage engine. It
/// owns both file handles for its whole lifetime; every write is synced
/// before the call returns, so there is nothing to flush on drop.
pub struct Store {
    tree: BinaryTree<FileStorage, FileStorage>,
}

impl Store {
    /// Open the store described by `config`, creating missing files.
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        std::fs::create_dir_all(&config.data_directory)
            .map_err(|e| StoreError::StorageWrite(e.into()))?;

        let index_path = config.index_path();
        let heap_path = config.heap_path();
        let created = !index_path.exists();

        let index_file = FileStorage::open_or_create(&index_path).map_err(StoreError::StorageRead)?;
        let heap_file = FileStorage::open_or_create(&heap_path).map_err(StoreError::StorageRead)?;

        let index = IndexStore::open(index_file)?;
        let heap = ValueHeap::new(heap_file);

        if created {
            tracing::info!("created store at {}", config.data_directory.display());
        } else {
            tracing::info!(
                "opened store at {} ({} keys)",
                config.data_directory.display(),
                index.record_count()
            );
        }

        Ok(Self {
            tree: BinaryTree::new(index, heap),
        })
    }

    /// Open the store with default file names in `dir`.
    pub fn open_in(dir: &Path) -> Result<Self, StoreError> {
        Self::open(&StoreConfig::new(dir))
    }

    /// Look up the value for `key`.
    pub fn get(&mut self, key: Key) -> Result<Option<String>, StoreError> {
        self.tree.get(key)
    }

    /// All pairs in ascending key order.
    pub fn get_all(&mut self) -> Result<Vec<(Key, String)>, StoreError> {
        self.tree.get_all()
    }

    /// Insert or overwrite `key`.
    pub fn put(&mut self, key: Key, value: &str) -> Result<(), StoreError> {
        self.tree.put(key, value)
    }

    /// Number of node records; see [`BinaryTree::len`].
    #[must_use]
    pub fn len(&self) -> u64 {
        self.tree.len()
    }

    /// Whether the store holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Height of the underlying tree.
    pub fn depth(&mut self) -> Result<usize, StoreError> {
        self.tree.depth()
    }
}
