//! Seeded workload runner.
//!
//! Drives a tree over simulated storage with a random mix of puts and gets,
//! checking invariants as it goes. Given the same config, every run performs
//! the same operations and sees the same injected faults.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::simulation::invariants::{InvariantChecker, InvariantViolation};
use crate::simulation::storage::{FaultConfig, SimulatedStorage};
use crate::storage::{BinaryTree, IndexStore, Key, StoreError, ValueHeap};

/// Configuration for a simulation run.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Seed for the workload and the storage.
    pub seed: u64,
    /// Keys are drawn from `0..key_space`.
    pub key_space: Key,
    /// Fraction of operations that are puts (0.0 - 1.0).
    pub put_rate: f64,
    /// Run the full invariant check every this many operations.
    pub check_interval: usize,
    /// Faults injected into both the Index Store and the Value Heap.
    pub fault_config: FaultConfig,
}

impl SimulatorConfig {
    /// Default workload for `seed`, without faults.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            key_space: 256,
            put_rate: 0.6,
            check_interval: 50,
            fault_config: FaultConfig::default(),
        }
    }

    /// Set the key space.
    #[must_use]
    pub const fn with_key_space(mut self, key_space: Key) -> Self {
        self.key_space = key_space;
        self
    }

    /// Set the fault configuration.
    #[must_use]
    pub const fn with_fault_config(mut self, config: FaultConfig) -> Self {
        self.fault_config = config;
        self
    }
}

/// Outcome of a simulation run.
#[derive(Debug, Default)]
pub struct SimulationResult {
    pub puts: u64,
    pub gets: u64,
    /// Operations that failed with a reported I/O error.
    pub failed_operations: u64,
    pub invariant_violations: Vec<InvariantViolation>,
}

impl SimulationResult {
    /// Check if the simulation passed (no invariant violations).
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.invariant_violations.is_empty()
    }
}

/// Runs random workloads against a tree over simulated storage.
pub struct Simulator {
    config: SimulatorConfig,
    rng: StdRng,
    tree: BinaryTree<SimulatedStorage, SimulatedStorage>,
    checker: InvariantChecker,
}

impl Simulator {
    /// Create a simulator with an empty tree.
    ///
    /// The Index Store is bootstrapped before faults are switched on.
    pub fn new(config: SimulatorConfig) -> Result<Self, StoreError> {
        let index = IndexStore::open(SimulatedStorage::new(config.seed))?;
        let heap = ValueHeap::new(SimulatedStorage::new(config.seed.wrapping_add(1)));
        let mut sim = Self {
            rng: StdRng::seed_from_u64(config.seed),
            tree: BinaryTree::new(index, heap),
            checker: InvariantChecker::new(),
            config,
        };
        sim.set_faults(sim.config.fault_config.clone());
        Ok(sim)
    }

    /// The tree under test.
    pub const fn tree_mut(&mut self) -> &mut BinaryTree<SimulatedStorage, SimulatedStorage> {
        &mut self.tree
    }

    /// Perform `operations` random operations.
    pub fn run(&mut self, operations: usize) -> SimulationResult {
        let mut result = SimulationResult::default();

        for i in 1..=operations {
            let key = self.rng.random_range(0..self.config.key_space.max(1));

            if self.rng.random::<f64>() < self.config.put_rate {
                let value = self.random_value();
                match self.tree.put(key, &value) {
                    Ok(()) => self.checker.record_put(key, &value),
                    Err(e) => {
                        self.checker.record_failed_put(key, &value);
                        Self::record_failure(&mut result, &e);
                    }
                }
                result.puts += 1;
            } else {
                match self.tree.get(key) {
                    Ok(actual) if self.checker.accepts(key, actual.as_deref()) => {}
                    Ok(actual) => result
                        .invariant_violations
                        .push(InvariantViolation::WrongValue {
                            key,
                            expected: self.checker.expected(key).map(str::to_string),
                            actual,
                        }),
                    Err(e) => Self::record_failure(&mut result, &e),
                }
                result.gets += 1;
            }

            if i % self.config.check_interval.max(1) == 0 {
                self.check(&mut result);
            }
        }

        self.check(&mut result);
        result
    }

    /// Run the full check against quiet storage, then restore faults.
    fn check(&mut self, result: &mut SimulationResult) {
        self.set_faults(FaultConfig::no_faults());
        result
            .invariant_violations
            .extend(self.checker.check(&mut self.tree));
        self.set_faults(self.config.fault_config.clone());
    }

    fn set_faults(&mut self, config: FaultConfig) {
        self.tree
            .heap_mut()
            .storage_mut()
            .set_fault_config(config.clone());
        self.tree.index_mut().storage_mut().set_fault_config(config);
    }

    /// Injected I/O faults are expected to surface as errors. Anything else
    /// means the tree misread its own files.
    fn record_failure(result: &mut SimulationResult, error: &StoreError) {
        match error {
            StoreError::StorageRead(_) | StoreError::StorageWrite(_) => {
                result.failed_operations += 1;
            }
            _ => result
                .invariant_violations
                .push(InvariantViolation::Unreadable(error.to_string())),
        }
    }

    /// A short alphanumeric value of varying length.
    fn random_value(&mut self) -> String {
        const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
        let len = self.rng.random_range(0..24);
        (0..len)
            .map(|_| char::from(ALPHABET[self.rng.random_range(0..ALPHABET.len())]))
            .collect()
    }
}
