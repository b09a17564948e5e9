//! Simulated in-memory storage for deterministic testing.
//!
//! This module provides an in-memory implementation of the `Storage` trait
//! with support for fault injection:
//! - Read and write errors
//! - Byte-level corruption (bit flips) on read
//! - Partial writes
//! - Sync failures

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::storage::io::{Storage, StorageError, check_bounds};

/// Configuration for fault injection.
#[derive(Debug, Clone, Default)]
pub struct FaultConfig {
    /// Probability of a read error (0.0 - 1.0).
    pub read_error_rate: f64,
    /// Probability of a write error (0.0 - 1.0).
    pub write_error_rate: f64,
    /// Probability of a sync error (0.0 - 1.0).
    pub sync_error_rate: f64,
    /// Probability of returning corrupted bytes on read (0.0 - 1.0).
    pub corruption_rate: f64,
    /// Probability of a partial write (0.0 - 1.0).
    pub partial_write_rate: f64,
}

impl FaultConfig {
    /// Create a fault config with no faults (for baseline testing).
    #[must_use]
    pub fn no_faults() -> Self {
        Self::default()
    }

    /// Create a fault config with low rates of reported I/O errors (for
    /// stress testing).
    ///
    /// Corruption and partial writes stay off: they succeed silently, and
    /// the file format carries no checksum that could catch them.
    #[must_use]
    pub const fn low_faults() -> Self {
        Self {
            read_error_rate: 0.001,
            write_error_rate: 0.001,
            sync_error_rate: 0.001,
            corruption_rate: 0.0,
            partial_write_rate: 0.0,
        }
    }
}

/// Statistics about simulated storage operations.
#[derive(Debug, Default, Clone)]
pub struct SimulatedStorageStats {
    pub reads: u64,
    pub writes: u64,
    pub syncs: u64,
    pub injected_read_errors: u64,
    pub injected_write_errors: u64,
    pub injected_sync_errors: u64,
    pub corrupted_reads: u64,
    pub partial_writes: u64,
}

/// In-memory byte store for deterministic testing.
///
/// Given the same seed and the same sequence of calls, the same faults are
/// injected. Not thread-safe; simulations run on a single thread.
pub struct SimulatedStorage {
    bytes: Vec<u8>,
    fault_config: FaultConfig,
    rng: StdRng,
    stats: SimulatedStorageStats,
}

impl SimulatedStorage {
    /// Create an empty simulated store with no faults.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, FaultConfig::default())
    }

    /// Create an empty simulated store with custom fault configuration.
    #[must_use]
    pub fn with_config(seed: u64, fault_config: FaultConfig) -> Self {
        Self {
            bytes: Vec::new(),
            fault_config,
            rng: StdRng::seed_from_u64(seed),
            stats: SimulatedStorageStats::default(),
        }
    }

    /// Get the current statistics.
    #[must_use]
    pub const fn stats(&self) -> &SimulatedStorageStats {
        &self.stats
    }

    /// Update the fault configuration.
    pub const fn set_fault_config(&mut self, config: FaultConfig) {
        self.fault_config = config;
    }

    /// Raw contents, as they would be on disk.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn should_inject_fault(&mut self, rate: f64) -> bool {
        if rate <= 0.0 {
            return false;
        }
        self.rng.random::<f64>() < rate
    }

    fn corrupt(&mut self, buf: &mut [u8]) {
        if buf.is_empty() {
            return;
        }
        let num_flips = self.rng.random_range(1..=8);
        for _ in 0..num_flips {
            let byte_offset = self.rng.random_range(0..buf.len());
            let bit = self.rng.random_range(0..8u8);
            buf[byte_offset] ^= 1 << bit;
        }
    }
}

impl Storage for SimulatedStorage {
    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    #[allow(clippy::cast_possible_truncation)]
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<(), StorageError> {
        self.stats.reads += 1;
        check_bounds(offset, buf.len(), self.size())?;

        if self.should_inject_fault(self.fault_config.read_error_rate) {
            self.stats.injected_read_errors += 1;
            return Err(StorageError::InjectedFault(
                "simulated read error".to_string(),
            ));
        }

        let start = offset as usize;
        buf.copy_from_slice(&self.bytes[start..start + buf.len()]);

        if self.should_inject_fault(self.fault_config.corruption_rate) {
            self.stats.corrupted_reads += 1;
            self.corrupt(buf);
        }

        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn write_at(&mut self, offset: u64, data: &[u8]) -> Result<(), StorageError> {
        self.stats.writes += 1;

        if self.should_inject_fault(self.fault_config.write_error_rate) {
            self.stats.injected_write_errors += 1;
            return Err(StorageError::InjectedFault(
                "simulated write error".to_string(),
            ));
        }

        let mut data = data;
        if !data.is_empty() && self.should_inject_fault(self.fault_config.partial_write_rate) {
            self.stats.partial_writes += 1;
            let cutoff = self.rng.random_range(0..data.len());
            data = &data[..cutoff];
        }

        let start = offset as usize;
        let end = start + data.len();
        if self.bytes.len() < end {
            self.bytes.resize(end, 0);
        }
        self.bytes[start..end].copy_from_slice(data);
        Ok(())
    }

    fn sync(&mut self) -> Result<(), StorageError> {
        self.stats.syncs += 1;

        if self.should_inject_fault(self.fault_config.sync_error_rate) {
            self.stats.injected_sync_errors += 1;
            return Err(StorageError::InjectedFault(
                "simulated sync error".to_string(),
            ));
        }

        // Writes are already "durable" in memory.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let mut storage = SimulatedStorage::new(42);
        storage.write_at(4, b"abc").expect("write");
        assert_eq!(storage.size(), 7);
        assert_eq!(storage.as_bytes(), &[0, 0, 0, 0, b'a', b'b', b'c']);

        let mut buf = [0u8; 3];
        storage.read_at(4, &mut buf).expect("read");
        assert_eq!(&buf, b"abc");
        assert_eq!(storage.stats().reads, 1);
        assert_eq!(storage.stats().writes, 1);
    }

    #[test]
    fn test_write_errors_leave_bytes_untouched() {
        let mut storage = SimulatedStorage::with_config(
            42,
            FaultConfig {
                write_error_rate: 1.0,
                ..FaultConfig::default()
            },
        );
        let result = storage.write_at(0, b"abc");
        assert!(matches!(result, Err(StorageError::InjectedFault(_))));
        assert_eq!(storage.size(), 0);
        assert_eq!(storage.stats().injected_write_errors, 1);
    }

    #[test]
    fn test_corruption_changes_read_bytes() {
        let mut storage = SimulatedStorage::new(42);
        storage.write_at(0, &[0u8; 32]).expect("write");
        storage.set_fault_config(FaultConfig {
            corruption_rate: 1.0,
            ..FaultConfig::default()
        });

        let mut buf = [0u8; 32];
        storage.read_at(0, &mut buf).expect("read");
        assert_eq!(storage.stats().corrupted_reads, 1);
        // The stored bytes themselves are intact.
        assert!(storage.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_same_seed_same_faults() {
        let run = |seed| {
            let mut storage = SimulatedStorage::with_config(seed, FaultConfig {
                write_error_rate: 0.5,
                ..FaultConfig::default()
            });
            (0..32)
                .map(|i| storage.write_at(i, b"x").is_ok())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(7), run(7));
    }
}
