//! Deterministic Simulation Testing (DST) infrastructure.
//!
//! This module provides tools for testing the tree with:
//! - In-memory storage with fault injection
//! - Reproducible random workloads
//! - Invariant checking after operations
//!
//! Given the same seed, execution is identical.
//!
//! # Usage
//!
//! ```
//! use treekv::simulation::{FaultConfig, Simulator, SimulatorConfig};
//!
//! let config = SimulatorConfig::new(12345).with_fault_config(FaultConfig::low_faults());
//! let mut sim = Simulator::new(config).unwrap();
//! let result = sim.run(200);
//!
//! assert!(result.passed());
//! ```

mod invariants;
mod simulator;
mod storage;

pub use invariants::{InvariantChecker, InvariantViolation};
pub use simulator::{SimulationResult, Simulator, SimulatorConfig};
pub use storage::{FaultConfig, SimulatedStorage, SimulatedStorageStats};
