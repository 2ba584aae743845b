//! An in-memory B+Tree map with cursor-based navigation.
//!
//! Entries live only in leaves, which are chained in key order. On top of
//! point lookups the tree answers floor queries (`find_left`, `find_before`)
//! and ceiling queries (`lower_bound`), and removes entries either by key or
//! by a cursor obtained from an earlier lookup.
//!
//! The `simulation` module drives the tree with seeded random workloads and
//! checks every result against a `BTreeMap` model; the `bptree-sim` binary
//! runs it from the command line.

pub mod btree;
pub mod config;
pub mod simulation;

mod e2e_tests;
#[cfg(test)]
mod testing;

pub use btree::{BPlusTree, Cursor, InvariantError, Iter};
pub use config::{ConfigError, SimulationSettings, TreeConfig};
