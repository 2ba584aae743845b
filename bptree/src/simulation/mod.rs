//! Deterministic Simulation Testing (DST) infrastructure.
//!
//! This module provides tools for testing the tree with:
//! - Reproducible random operation generation
//! - A `BTreeMap` model that every result is compared against
//! - Full structural checks at a configurable interval
//!
//! Given the same seed and configuration, execution is identical, so a
//! failing seed can be replayed with `BPTREE_SIM_SEED`.
//!
//! # Usage
//!
//! ```
//! use bptree::simulation::{Simulator, SimulatorConfig};
//!
//! let config = SimulatorConfig::new(12345).with_key_space(512);
//! let mut sim = Simulator::new(config);
//! let result = sim.run(1000);
//!
//! assert!(result.passed());
//! ```

mod invariants;
mod op_gen;
mod simulator;

pub use invariants::{HistoryStats, InvariantChecker, InvariantViolation, OperationHistory};
pub use op_gen::{Operation, OperationGenConfig, OperationGenerator};
pub use simulator::{SimulationResult, Simulator, SimulatorConfig};
