//! Value Heap: UTF-8 payloads, each terminated by the record separator.

use crate::storage::error::StoreError;
use crate::storage::io::Storage;
use crate::storage::layout::RECORD_SEPARATOR;
use crate::storage::node::ValueSlot;

/// Value payload storage on top of a byte store.
pub struct ValueHeap<S> {
    storage: S,
}

impl<S: Storage> ValueHeap<S> {
    /// Wrap a byte store. The heap needs no bootstrap.
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Current size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.storage.size()
    }

    /// Read the value stored in `slot`, without its separator.
    pub fn read_value(&mut self, slot: ValueSlot) -> Result<String, StoreError> {
        let mut buf = vec![0u8; slot.len as usize];
        self.storage
            .read_at(slot.offset, &mut buf)
            .map_err(StoreError::heap_read)?;

        if buf.pop() != Some(RECORD_SEPARATOR) {
            return Err(StoreError::Decode(format!(
                "value at offset {} is not terminated by a record separator",
                slot.offset
            )));
        }

        String::from_utf8(buf).map_err(|e| {
            StoreError::Decode(format!(
                "value at offset {} is not valid UTF-8: {e}",
                slot.offset
            ))
        })
    }

    /// Append `value` at the end of the heap and return its slot.
    ///
    /// Existing payloads are never written over, so a node record keeps
    /// pointing at intact bytes until it is rewritten; slots a node gives up
    /// are never reused. The heap is synced before returning, so the caller
    /// may then write the node record that points at the returned slot.
    pub fn append_value(&mut self, value: &str) -> Result<ValueSlot, StoreError> {
        let payload = encode_payload(value)?;
        let len = u32::try_from(payload.len()).map_err(|_| {
            StoreError::InvalidValue(format!("value of {} bytes is too large", value.len()))
        })?;

        let offset = self.storage.append(&payload).map_err(StoreError::write)?;
        self.storage.sync().map_err(StoreError::write)?;

        tracing::debug!("appended {len} value bytes at heap offset {offset}");
        Ok(ValueSlot { offset, len })
    }

    /// Mutable access to the underlying storage.
    pub const fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }
}

/// Check that `value` can be stored and build its heap payload.
pub fn encode_payload(value: &str) -> Result<Vec<u8>, StoreError> {
    if value.as_bytes().contains(&RECORD_SEPARATOR) {
        return Err(StoreError::InvalidValue(
            "values must not contain a newline".to_string(),
        ));
    }
    let mut payload = Vec::with_capacity(value.len() + 1);
    payload.extend_from_slice(value.as_bytes());
    payload.push(RECORD_SEPARATOR);
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{FaultConfig, SimulatedStorage};

    fn heap() -> ValueHeap<SimulatedStorage> {
        ValueHeap::new(SimulatedStorage::new(7))
    }

    #[test]
    fn test_append_and_read() {
        let mut heap = heap();
        let a = heap.append_value("alpha").expect("write a");
        let b = heap.append_value("β").expect("write b");

        assert_eq!(a, ValueSlot { offset: 0, len: 6 });
        assert_eq!(b, ValueSlot { offset: 6, len: 3 });
        assert_eq!(heap.size(), 9);
        assert_eq!(heap.read_value(a).expect("read a"), "alpha");
        assert_eq!(heap.read_value(b).expect("read b"), "β");
    }

    #[test]
    fn test_new_value_never_overwrites_old_slot() {
        let mut heap = heap();
        let slot = heap.append_value("long value").expect("write");
        let next = heap.append_value("next").expect("write next");

        let updated = heap.append_value("short").expect("update");
        assert_eq!(updated, ValueSlot { offset: 16, len: 6 });
        assert_eq!(heap.read_value(updated).expect("read"), "short");
        // both earlier payloads are still intact
        assert_eq!(heap.read_value(slot).expect("read old"), "long value");
        assert_eq!(heap.read_value(next).expect("read next"), "next");
    }

    #[test]
    fn test_failed_sync_is_reported() {
        let mut heap = heap();
        heap.storage_mut().set_fault_config(FaultConfig {
            sync_error_rate: 1.0,
            ..FaultConfig::default()
        });

        let result = heap.append_value("value");
        assert!(matches!(result, Err(StoreError::StorageWrite(_))));
    }

    #[test]
    fn test_empty_value() {
        let mut heap = heap();
        let slot = heap.append_value("").expect("write");
        assert_eq!(slot.len, 1);
        assert_eq!(heap.read_value(slot).expect("read"), "");
    }

    #[test]
    fn test_newline_is_rejected() {
        let mut heap = heap();
        let result = heap.append_value("two\nlines");
        assert!(matches!(result, Err(StoreError::InvalidValue(_))));
        assert_eq!(heap.size(), 0);
    }

    #[test]
    fn test_truncated_heap() {
        let mut heap = heap();
        heap.append_value("abc").expect("write");

        let result = heap.read_value(ValueSlot { offset: 2, len: 10 });
        assert!(matches!(result, Err(StoreError::Decode(_))));
    }

    #[test]
    fn test_invalid_utf8() {
        let mut heap = heap();
        heap.storage_mut()
            .append(&[0xFF, 0xFE, b'\n'])
            .expect("append");

        let result = heap.read_value(ValueSlot { offset: 0, len: 3 });
        assert!(matches!(result, Err(StoreError::Decode(_))));
    }

    #[test]
    fn test_missing_separator() {
        let mut heap = heap();
        heap.storage_mut().append(b"abcd").expect("append");

        let result = heap.read_value(ValueSlot { offset: 0, len: 4 });
        assert!(matches!(result, Err(StoreError::Decode(_))));
    }
}
