//! Unbalanced binary search tree over the Index Store and Value Heap.
//!
//! - Key: non-negative 64-bit integer
//! - Value: newline-free UTF-8 text, stored in the heap
//!
//! The root record is fixed at the first offset after the header. New nodes
//! are appended at the end of the Index Store and linked into their parent,
//! so tree shape depends only on insertion order; nothing ever rebalances.
//!
//! Nodes are materialized lazily: a record is read only when a traversal
//! reaches it, then kept in an in-memory cache keyed by offset. Every save
//! refreshes the cache and a failed save evicts the node, so cached nodes
//! always match the file.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::storage::error::StoreError;
use crate::storage::heap::{ValueHeap, encode_payload};
use crate::storage::index::IndexStore;
use crate::storage::io::Storage;
use crate::storage::node::{Key, Node, NodeOffset};

/// A binary search tree backed by an Index Store and a Value Heap.
pub struct BinaryTree<I, H> {
    index: IndexStore<I>,
    heap: ValueHeap<H>,
    cache: HashMap<NodeOffset, Node>,
}

impl<I: Storage, H: Storage> BinaryTree<I, H> {
    /// Create a tree over already-opened stores.
    pub fn new(index: IndexStore<I>, heap: ValueHeap<H>) -> Self {
        Self {
            index,
            heap,
            cache: HashMap::new(),
        }
    }

    /// Root offset, or `None` for an empty tree.
    #[must_use]
    pub fn root(&self) -> Option<NodeOffset> {
        self.index.has_root().then_some(NodeOffset::ROOT)
    }

    /// Whether the tree holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.index.has_root()
    }

    /// Number of node records in the Index Store.
    ///
    /// This is one per distinct key, plus any record an interrupted insert
    /// wrote before its parent could be relinked. Such records are never
    /// reachable from the root.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.index.record_count()
    }

    /// Materialize the node at `offset`.
    pub fn node(&mut self, offset: NodeOffset) -> Result<Node, StoreError> {
        if let Some(node) = self.cache.get(&offset) {
            return Ok(*node);
        }
        let node = self.index.read_node(offset)?;
        self.cache.insert(offset, node);
        Ok(node)
    }

    /// Read the value a node points at, or `None` if it has none.
    pub fn value_of(&mut self, node: &Node) -> Result<Option<String>, StoreError> {
        node.value
            .map(|slot| self.heap.read_value(slot))
            .transpose()
    }

    /// Look up the value stored for `key`.
    ///
    /// A key that was never inserted is `Ok(None)`, not an error.
    pub fn get(&mut self, key: Key) -> Result<Option<String>, StoreError> {
        let mut current = self.root();
        let mut steps = 0;

        while let Some(offset) = current {
            steps += 1;
            self.check_steps(steps)?;

            let node = self.node(offset)?;
            current = match key.cmp(&node.key) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return self.value_of(&node),
            };
        }

        Ok(None)
    }

    /// All key-value pairs in ascending key order.
    ///
    /// Nodes without a value are skipped, matching `get`.
    pub fn get_all(&mut self) -> Result<Vec<(Key, String)>, StoreError> {
        let mut entries = Vec::new();
        let mut stack: Vec<Node> = Vec::new();
        let mut current = self.root();
        let mut previous: Option<Key> = None;
        let mut steps = 0;

        loop {
            while let Some(offset) = current {
                steps += 1;
                self.check_steps(steps)?;

                let node = self.node(offset)?;
                current = node.left;
                stack.push(node);
            }

            let Some(node) = stack.pop() else {
                break;
            };

            if previous.is_some_and(|p| p >= node.key) {
                return Err(StoreError::StorageCorrupt(format!(
                    "node at offset {} breaks key order",
                    node.offset
                )));
            }
            previous = Some(node.key);

            if let Some(value) = self.value_of(&node)? {
                entries.push((node.key, value));
            }
            current = node.right;
        }

        Ok(entries)
    }

    /// Insert `key`, or overwrite its value if it already exists.
    ///
    /// Overwriting keeps the node at its offset and leaves the tree shape
    /// unchanged; the new value is appended to the heap and the node is
    /// repointed at it. Inserting appends a node and links it into its parent.
    pub fn put(&mut self, key: Key, value: &str) -> Result<(), StoreError> {
        encode_payload(value)?;

        let Some(mut offset) = self.root() else {
            let root = self.create_node(key, value)?;
            tracing::debug!("created root node {key} at offset {}", root.offset);
            return Ok(());
        };
        let mut steps = 0;

        loop {
            steps += 1;
            self.check_steps(steps)?;

            let mut node = self.node(offset)?;
            match key.cmp(&node.key) {
                Ordering::Less => {
                    if let Some(left) = node.left {
                        offset = left;
                    } else {
                        let child = self.create_node(key, value)?;
                        node.left = Some(child.offset);
                        return self.save(node);
                    }
                }
                Ordering::Greater => {
                    if let Some(right) = node.right {
                        offset = right;
                    } else {
                        let child = self.create_node(key, value)?;
                        node.right = Some(child.offset);
                        return self.save(node);
                    }
                }
                Ordering::Equal => {
                    node.value = Some(self.heap.append_value(value)?);
                    return self.save(node);
                }
            }
        }
    }

    /// Height of the tree: 0 when empty, 1 for a lone root.
    pub fn depth(&mut self) -> Result<usize, StoreError> {
        let mut deepest = 0;
        let mut stack: Vec<(NodeOffset, usize)> =
            self.root().map(|r| (r, 1)).into_iter().collect();
        let mut steps = 0;

        while let Some((offset, depth)) = stack.pop() {
            steps += 1;
            self.check_steps(steps)?;

            let node = self.node(offset)?;
            deepest = deepest.max(depth);
            stack.extend(node.left.map(|c| (c, depth + 1)));
            stack.extend(node.right.map(|c| (c, depth + 1)));
        }

        Ok(deepest)
    }

    /// Mutable access to the Index Store.
    pub const fn index_mut(&mut self) -> &mut IndexStore<I> {
        &mut self.index
    }

    /// Mutable access to the Value Heap.
    pub const fn heap_mut(&mut self) -> &mut ValueHeap<H> {
        &mut self.heap
    }

    /// Append a new childless node holding `value`.
    ///
    /// The value is durable before the record that points at it is written.
    fn create_node(&mut self, key: Key, value: &str) -> Result<Node, StoreError> {
        let offset = self.index.next_offset()?;
        let slot = self.heap.append_value(value)?;
        let node = Node::new(offset, key, Some(slot));
        self.save(node)?;
        Ok(node)
    }

    /// Persist `node` at its offset and refresh the cache.
    ///
    /// On failure the record may or may not have reached the file, so the
    /// cached copy is dropped and the next traversal rereads it.
    fn save(&mut self, node: Node) -> Result<(), StoreError> {
        if let Err(e) = self.index.write_node(&node) {
            self.cache.remove(&node.offset);
            return Err(e);
        }
        self.cache.insert(node.offset, node);
        Ok(())
    }

    /// A traversal can visit each record at most once; any more means the
    /// child pointers form a cycle.
    fn check_steps(&self, steps: u64) -> Result<(), StoreError> {
        if steps > self.index.record_count() {
            return Err(StoreError::StorageCorrupt(
                "child pointers form a cycle".to_string(),
            ));
        }
        Ok(())
    }
}
