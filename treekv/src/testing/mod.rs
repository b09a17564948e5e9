use tempfile::TempDir;

use crate::storage::Store;

/// Create a new store in a fresh temporary directory.
///
/// The directory is removed when the returned `TempDir` is dropped, so
/// keep it alive for as long as the store is used.
pub fn new_test_store() -> (TempDir, Store) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let store = Store::open_in(dir.path()).expect("create test store");
    (dir, store)
}
