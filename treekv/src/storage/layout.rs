//! Byte-exact layout of the Index Store and Value Heap.
//!
//! ```text
//! index store:
//!   0..128     header (reserved, zero-filled)
//!   128..388   root node record
//!   388..      further node records, 260 bytes each, in insertion order
//!
//! node record:
//!   key            64 bytes  big-endian unsigned
//!   value_length    4 bytes  big-endian unsigned (includes the separator)
//!   value_offset   64 bytes  big-endian signed, -1 = no value
//!   left_offset    64 bytes  big-endian signed, -2 = no child
//!   right_offset   64 bytes  big-endian signed, -2 = no child
//!
//! value heap:
//!   <utf-8 bytes> 0x0A <utf-8 bytes> 0x0A ...
//! ```

/// Size of the reserved header at the start of the Index Store.
pub const HEADER_SIZE: usize = 128;

/// Header size as u64 for offset calculations.
pub const HEADER_SIZE_U64: u64 = HEADER_SIZE as u64;

/// Width of the key field.
pub const KEY_SIZE: usize = 64;

/// Width of the value length field.
pub const VALUE_LENGTH_SIZE: usize = 4;

/// Width of the value offset field.
pub const VALUE_ADDR_SIZE: usize = 64;

/// Width of each child offset field.
pub const NODE_ADDRESS_SIZE: usize = 64;

/// Size of one node record.
pub const NODE_SIZE: usize = KEY_SIZE + VALUE_LENGTH_SIZE + VALUE_ADDR_SIZE + 2 * NODE_ADDRESS_SIZE;

/// Node size as u64 for offset calculations.
pub const NODE_SIZE_U64: u64 = NODE_SIZE as u64;

/// The root record always lives directly after the header.
pub const ROOT_OFFSET: u64 = HEADER_SIZE_U64;

/// Field offsets within a node record.
pub mod fields {
    use super::{KEY_SIZE, NODE_ADDRESS_SIZE, VALUE_ADDR_SIZE, VALUE_LENGTH_SIZE};

    pub const KEY: usize = 0;
    pub const VALUE_LENGTH: usize = KEY + KEY_SIZE;
    pub const VALUE_OFFSET: usize = VALUE_LENGTH + VALUE_LENGTH_SIZE;
    pub const LEFT_OFFSET: usize = VALUE_OFFSET + VALUE_ADDR_SIZE;
    pub const RIGHT_OFFSET: usize = LEFT_OFFSET + NODE_ADDRESS_SIZE;
}

/// Encoded `value_offset` meaning "no value written yet".
pub const NO_VALUE: i64 = -1;

/// Encoded `left_offset` / `right_offset` meaning "no child".
pub const NO_CHILD: i64 = -2;

/// Byte terminating every payload in the Value Heap.
pub const RECORD_SEPARATOR: u8 = b'\n';

/// Whether an Index Store of `len` bytes holds a header plus whole records.
#[must_use]
pub const fn is_valid_index_len(len: u64) -> bool {
    len >= HEADER_SIZE_U64 && (len - HEADER_SIZE_U64) % NODE_SIZE_U64 == 0
}

/// Whether `offset` points at the start of a node record.
#[must_use]
pub const fn is_record_boundary(offset: u64) -> bool {
    offset >= ROOT_OFFSET && (offset - ROOT_OFFSET) % NODE_SIZE_U64 == 0
}

/// Number of node records in an Index Store of `len` bytes.
#[must_use]
pub const fn record_count(len: u64) -> u64 {
    len.saturating_sub(HEADER_SIZE_U64) / NODE_SIZE_U64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_size_matches_format() {
        assert_eq!(NODE_SIZE, 260);
        assert_eq!(fields::RIGHT_OFFSET + NODE_ADDRESS_SIZE, NODE_SIZE);
        assert_eq!(ROOT_OFFSET, 128);
    }

    #[test]
    fn test_index_len_validation() {
        assert!(is_valid_index_len(128));
        assert!(is_valid_index_len(388));
        assert!(is_valid_index_len(648));
        assert!(!is_valid_index_len(0));
        assert!(!is_valid_index_len(127));
        assert!(!is_valid_index_len(389));
    }

    #[test]
    fn test_record_boundaries() {
        assert!(is_record_boundary(128));
        assert!(is_record_boundary(388));
        assert!(!is_record_boundary(0));
        assert!(!is_record_boundary(129));
        assert_eq!(record_count(128), 0);
        assert_eq!(record_count(648), 2);
    }
}
