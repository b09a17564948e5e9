// Life of a command:
// 1. A line comes in on stdin
// 2. Parse it into a `Command`
// 3. Run it against the `Store`:
//     - get: descend from the root, reading records as the path needs them
//     - put: descend, then append a node and relink its parent,
//       or overwrite the value of the existing node
// 4. Print the outcome
//
// System components:
//  - Index Store (header + fixed-size node records)
//  - Value Heap (newline-terminated values)
//  - Tree engine over both

pub mod command;
pub mod config;
pub mod simulation;
pub mod storage;
#[cfg(test)]
mod testing;

pub use command::{Command, CommandError, Outcome};
pub use config::{ConfigError, StoreConfig};
pub use storage::{Store, StoreError};
