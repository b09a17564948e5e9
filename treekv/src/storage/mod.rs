//! Persistent binary search tree storage engine.
//!
//! # File Format
//!
//! The store is two files:
//!
//! - Index Store: a 128-byte reserved header, then 260-byte node records.
//!   The root record is at offset 128; every later node is appended.
//! - Value Heap: newline-terminated UTF-8 values, referenced from node
//!   records by offset and length.
//!
//! See [`layout`] for the byte-exact format.
//!
//! # Usage
//!
//! ```no_run
//! use std::path::Path;
//! use treekv::storage::Store;
//!
//! let mut store = Store::open_in(Path::new("."))?;
//! store.put(5, "a")?;
//! assert_eq!(store.get(5)?, Some("a".to_string()));
//! # Ok::<(), treekv::storage::StoreError>(())
//! ```

mod database;
mod error;
mod file;
mod header;
mod heap;
mod index;
pub mod io;
pub mod layout;
mod node;
mod tree;

pub use database::Store;
pub use error::StoreError;
pub use file::FileStorage;
pub use header::Header;
pub use heap::ValueHeap;
pub use index::IndexStore;
pub use io::{Storage, StorageError};
pub use node::{Key, Node, NodeOffset, ValueSlot};
pub use tree::BinaryTree;
