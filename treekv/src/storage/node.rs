//! Tree node type and record serialization.
//!
//! On disk, a missing value and a missing child are encoded as the sentinel
//! offsets `-1` and `-2`. In memory they are `None`; the sentinels only exist
//! inside `encode` and `decode`.

#![allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]

use crate::storage::error::StoreError;
use crate::storage::layout::{
    KEY_SIZE, NO_CHILD, NO_VALUE, NODE_ADDRESS_SIZE, NODE_SIZE, NODE_SIZE_U64, ROOT_OFFSET,
    VALUE_ADDR_SIZE, VALUE_LENGTH_SIZE, fields, is_record_boundary,
};

/// Keys are non-negative integers stored in a 64-byte big-endian field.
pub type Key = u64;

/// Byte offset of a node record within the Index Store.
///
/// Assigned once when the node is created and never changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeOffset(u64);

impl NodeOffset {
    /// Fixed location of the root record.
    pub const ROOT: Self = Self(ROOT_OFFSET);

    /// Wrap an offset, rejecting ones that are not on a record boundary.
    #[must_use]
    pub const fn new(offset: u64) -> Option<Self> {
        if is_record_boundary(offset) {
            Some(Self(offset))
        } else {
            None
        }
    }

    /// Raw byte offset.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Whether this is the root record.
    #[must_use]
    pub const fn is_root(self) -> bool {
        self.0 == ROOT_OFFSET
    }

    /// Offset one past the end of this record.
    #[must_use]
    pub const fn end(self) -> u64 {
        self.0 + NODE_SIZE_U64
    }
}

impl std::fmt::Display for NodeOffset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Location of a value payload in the Value Heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueSlot {
    /// Byte offset of the payload.
    pub offset: u64,
    /// Payload length including the trailing separator.
    pub len: u32,
}

/// One tree node as stored in the Index Store.
///
/// Children are referenced by offset only and materialized by the tree
/// when a traversal reaches them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node {
    pub offset: NodeOffset,
    pub key: Key,
    pub value: Option<ValueSlot>,
    pub left: Option<NodeOffset>,
    pub right: Option<NodeOffset>,
}

impl Node {
    /// Create a childless node.
    #[must_use]
    pub const fn new(offset: NodeOffset, key: Key, value: Option<ValueSlot>) -> Self {
        Self {
            offset,
            key,
            value,
            left: None,
            right: None,
        }
    }

    /// Serialize to the fixed-width record format.
    #[must_use]
    pub fn encode(&self) -> [u8; NODE_SIZE] {
        let mut buf = [0u8; NODE_SIZE];

        write_unsigned(&mut buf[fields::KEY..fields::VALUE_LENGTH], self.key);

        let (value_length, value_offset) = match self.value {
            Some(slot) => (slot.len, slot.offset as i64),
            None => (0, NO_VALUE),
        };
        buf[fields::VALUE_LENGTH..fields::VALUE_OFFSET]
            .copy_from_slice(&value_length.to_be_bytes());
        write_signed(
            &mut buf[fields::VALUE_OFFSET..fields::LEFT_OFFSET],
            value_offset,
        );
        write_signed(
            &mut buf[fields::LEFT_OFFSET..fields::RIGHT_OFFSET],
            child_to_raw(self.left),
        );
        write_signed(&mut buf[fields::RIGHT_OFFSET..], child_to_raw(self.right));

        buf
    }

    /// Deserialize a record read from `offset`.
    ///
    /// `index_size` is the current length of the Index Store; child offsets
    /// must point at records that lie entirely inside it.
    pub fn decode(offset: NodeOffset, buf: &[u8], index_size: u64) -> Result<Self, StoreError> {
        if buf.len() != NODE_SIZE {
            return Err(corrupt(
                offset,
                format!("record is {} bytes, expected {NODE_SIZE}", buf.len()),
            ));
        }

        let key = read_unsigned(&buf[fields::KEY..fields::VALUE_LENGTH])
            .ok_or_else(|| corrupt(offset, "key does not fit in 64 bits".to_string()))?;

        let mut len_bytes = [0u8; VALUE_LENGTH_SIZE];
        len_bytes.copy_from_slice(&buf[fields::VALUE_LENGTH..fields::VALUE_OFFSET]);
        let value_length = u32::from_be_bytes(len_bytes);

        let value_offset = read_signed(&buf[fields::VALUE_OFFSET..fields::LEFT_OFFSET])
            .ok_or_else(|| corrupt(offset, "value offset is not a 64-bit integer".to_string()))?;
        let value = match value_offset {
            NO_VALUE => None,
            o if o < 0 => {
                return Err(corrupt(offset, format!("invalid value offset {o}")));
            }
            _ if value_length == 0 => {
                return Err(corrupt(offset, "value has zero length".to_string()));
            }
            o => Some(ValueSlot {
                offset: o as u64,
                len: value_length,
            }),
        };

        let left = decode_child(
            offset,
            &buf[fields::LEFT_OFFSET..fields::RIGHT_OFFSET],
            index_size,
        )?;
        let right = decode_child(offset, &buf[fields::RIGHT_OFFSET..], index_size)?;

        Ok(Self {
            offset,
            key,
            value,
            left,
            right,
        })
    }
}

fn corrupt(offset: NodeOffset, msg: String) -> StoreError {
    StoreError::StorageCorrupt(format!("node at offset {offset}: {msg}"))
}

fn child_to_raw(child: Option<NodeOffset>) -> i64 {
    child.map_or(NO_CHILD, |c| c.get() as i64)
}

fn decode_child(
    parent: NodeOffset,
    field: &[u8],
    index_size: u64,
) -> Result<Option<NodeOffset>, StoreError> {
    let raw = read_signed(field)
        .ok_or_else(|| corrupt(parent, "child offset is not a 64-bit integer".to_string()))?;
    if raw == NO_CHILD {
        return Ok(None);
    }
    if raw < 0 {
        return Err(corrupt(parent, format!("invalid child offset {raw}")));
    }

    let child = NodeOffset::new(raw as u64).ok_or_else(|| {
        corrupt(parent, format!("child offset {raw} is not on a record boundary"))
    })?;
    if child.is_root() || child == parent {
        return Err(corrupt(parent, format!("child offset {raw} forms a cycle")));
    }
    if child.end() > index_size {
        return Err(corrupt(
            parent,
            format!("child offset {raw} lies beyond the index store (size: {index_size})"),
        ));
    }
    Ok(Some(child))
}

// The wide fields hold a 64-bit integer in their last 8 bytes; the leading
// bytes are the zero or sign extension.

fn write_unsigned(field: &mut [u8], value: u64) {
    let (pad, tail) = field.split_at_mut(field.len() - 8);
    pad.fill(0);
    tail.copy_from_slice(&value.to_be_bytes());
}

fn write_signed(field: &mut [u8], value: i64) {
    let (pad, tail) = field.split_at_mut(field.len() - 8);
    pad.fill(if value < 0 { 0xFF } else { 0x00 });
    tail.copy_from_slice(&value.to_be_bytes());
}

fn read_unsigned(field: &[u8]) -> Option<u64> {
    let (pad, tail) = field.split_at(field.len() - 8);
    if pad.iter().any(|&b| b != 0) {
        return None;
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(tail);
    Some(u64::from_be_bytes(bytes))
}

fn read_signed(field: &[u8]) -> Option<i64> {
    let (pad, tail) = field.split_at(field.len() - 8);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(tail);
    let value = i64::from_be_bytes(bytes);
    let extension = if value < 0 { 0xFF } else { 0x00 };
    if pad.iter().any(|&b| b != extension) {
        return None;
    }
    Some(value)
}

const _: () = assert!(KEY_SIZE >= 8 && VALUE_ADDR_SIZE >= 8 && NODE_ADDRESS_SIZE >= 8);
