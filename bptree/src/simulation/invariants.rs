//! Invariant checking for deterministic simulation testing.
//!
//! Every operation is mirrored into a `std::collections::BTreeMap` model. The
//! checker compares each observable result of the tree against the model and
//! periodically runs the tree's full structural check.

use std::collections::BTreeMap;

use super::op_gen::Operation;
use crate::btree::{BPlusTree, Cursor};

/// Tracks the history of operations and the expected contents of the tree.
#[derive(Debug, Default)]
pub struct OperationHistory {
    /// All operations in order.
    operations: Vec<Operation>,
    /// What the tree should contain after the operations so far.
    model: BTreeMap<u64, u64>,
    inserts: u64,
    updates: u64,
    removals: u64,
    missed_removals: u64,
    lookups: u64,
    clears: u64,
}

impl OperationHistory {
    /// Create a new empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `op` to the model and record it.
    pub fn record(&mut self, op: Operation) {
        match op {
            Operation::Insert { key, value } => {
                if self.model.insert(key, value).is_some() {
                    self.updates += 1;
                } else {
                    self.inserts += 1;
                }
            }
            Operation::Remove { key } => self.record_removal(Some(key)),
            Operation::RemoveFloor { key } => {
                let floor = self.model.range(..=key).next_back().map(|(k, _)| *k);
                self.record_removal(floor);
            }
            Operation::Search { .. }
            | Operation::FindLeft { .. }
            | Operation::FindBefore { .. }
            | Operation::LowerBound { .. }
            | Operation::Scan => self.lookups += 1,
            Operation::Clear => {
                self.model.clear();
                self.clears += 1;
            }
        }
        self.operations.push(op);
    }

    fn record_removal(&mut self, key: Option<u64>) {
        if key.and_then(|k| self.model.remove(&k)).is_some() {
            self.removals += 1;
        } else {
            self.missed_removals += 1;
        }
    }

    /// Get the number of operations.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.operations.len()
    }

    /// Check if history is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Expected tree contents.
    #[must_use]
    pub const fn model(&self) -> &BTreeMap<u64, u64> {
        &self.model
    }

    /// The most recent `n` operations, oldest first.
    #[must_use]
    pub fn recent(&self, n: usize) -> &[Operation] {
        &self.operations[self.operations.len().saturating_sub(n)..]
    }

    /// Get statistics.
    #[must_use]
    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            total_operations: self.operations.len(),
            inserts: self.inserts,
            updates: self.updates,
            removals: self.removals,
            missed_removals: self.missed_removals,
            lookups: self.lookups,
            clears: self.clears,
            live_keys: self.model.len(),
        }
    }
}

/// Statistics about the operation history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryStats {
    pub total_operations: usize,
    /// Inserts of a key not yet present.
    pub inserts: u64,
    /// Inserts that replaced the value of a present key.
    pub updates: u64,
    pub removals: u64,
    /// Removals that found nothing to remove.
    pub missed_removals: u64,
    pub lookups: u64,
    pub clears: u64,
    /// Keys in the model after the last operation.
    pub live_keys: usize,
}

/// An invariant violation detected during simulation.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violation.
    pub description: String,
    /// Operation index where it was detected.
    pub operation_index: usize,
    /// Additional context.
    pub context: String,
}

/// Checker comparing a tree against the model.
pub struct InvariantChecker {
    /// Detected violations.
    violations: Vec<InvariantViolation>,
}

impl Default for InvariantChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantChecker {
    /// Create a new invariant checker.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            violations: Vec::new(),
        }
    }

    /// Get all violations.
    #[must_use]
    pub fn violations(&self) -> &[InvariantViolation] {
        &self.violations
    }

    /// Check if any violations were detected.
    #[must_use]
    pub const fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    /// Clear all recorded violations.
    pub fn clear(&mut self) {
        self.violations.clear();
    }

    /// Add a violation.
    pub fn add_violation(&mut self, violation: InvariantViolation) {
        self.violations.push(violation);
    }

    fn expect_eq<T: PartialEq + std::fmt::Debug>(
        &mut self,
        description: &str,
        expected: T,
        actual: T,
        operation_index: usize,
    ) {
        if expected != actual {
            self.violations.push(InvariantViolation {
                description: description.to_string(),
                operation_index,
                context: format!("expected {expected:?}, got {actual:?}"),
            });
        }
    }

    /// Check the result a lookup-style operation produces against the model.
    ///
    /// Mutations are checked by their effect on later lookups and scans.
    pub fn check_operation(
        &mut self,
        op: Operation,
        tree: &BPlusTree<u64, u64>,
        model: &BTreeMap<u64, u64>,
        operation_index: usize,
    ) {
        let key_of = |cursor: Cursor| tree.key_at(cursor).copied();
        match op {
            Operation::Search { key } => self.expect_eq(
                "search disagrees with model",
                model.get(&key),
                tree.search(&key),
                operation_index,
            ),
            Operation::FindLeft { key } => self.expect_eq(
                "find_left disagrees with model",
                model.range(..=key).next_back().map(|(k, _)| *k),
                key_of(tree.find_left(&key)),
                operation_index,
            ),
            Operation::FindBefore { key } => self.expect_eq(
                "find_before disagrees with model",
                model.range(..key).next_back().map(|(k, _)| *k),
                key_of(tree.find_before(&key)),
                operation_index,
            ),
            Operation::LowerBound { key } => self.expect_eq(
                "lower_bound disagrees with model",
                model.range(key..).next().map(|(k, _)| *k),
                key_of(tree.lower_bound(&key)),
                operation_index,
            ),
            Operation::Scan => self.check_contents(tree, model, operation_index),
            Operation::Insert { key, value } => self.expect_eq(
                "inserted value not visible",
                Some(&value),
                tree.search(&key),
                operation_index,
            ),
            Operation::Remove { key } => {
                if tree.contains_key(&key) {
                    self.violations.push(InvariantViolation {
                        description: "removed key still present".to_string(),
                        operation_index,
                        context: format!("key {key}"),
                    });
                }
            }
            Operation::RemoveFloor { .. } => {}
            Operation::Clear => {
                if !tree.is_empty() {
                    self.violations.push(InvariantViolation {
                        description: "tree not empty after clear".to_string(),
                        operation_index,
                        context: String::new(),
                    });
                }
            }
        }
    }

    /// Compare the full ordered contents in both directions, plus size and endpoints.
    pub fn check_contents(
        &mut self,
        tree: &BPlusTree<u64, u64>,
        model: &BTreeMap<u64, u64>,
        operation_index: usize,
    ) {
        let forward: Vec<(u64, u64)> = tree.iter().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<(u64, u64)> = model.iter().map(|(k, v)| (*k, *v)).collect();
        if forward != expected {
            let mismatch = forward
                .iter()
                .zip(&expected)
                .position(|(a, b)| a != b)
                .unwrap_or_else(|| forward.len().min(expected.len()));
            self.violations.push(InvariantViolation {
                description: "forward scan disagrees with model".to_string(),
                operation_index,
                context: format!(
                    "first difference at position {mismatch}, tree has {} entries, model has {}",
                    forward.len(),
                    expected.len()
                ),
            });
        }

        let backward: Vec<u64> = tree.iter().rev().map(|(k, _)| *k).collect();
        let expected_backward: Vec<u64> = model.keys().rev().copied().collect();
        if backward != expected_backward {
            self.violations.push(InvariantViolation {
                description: "reverse scan disagrees with model".to_string(),
                operation_index,
                context: format!("tree has {} entries in reverse", backward.len()),
            });
        }

        self.expect_eq("len disagrees with model", model.len(), tree.len(), operation_index);
        self.expect_eq(
            "is_empty disagrees with model",
            model.is_empty(),
            tree.is_empty(),
            operation_index,
        );
        self.expect_eq(
            "first entry disagrees with model",
            model.first_key_value(),
            tree.first(),
            operation_index,
        );
        self.expect_eq(
            "last entry disagrees with model",
            model.last_key_value(),
            tree.last(),
            operation_index,
        );
    }

    /// Run the tree's own structural check.
    pub fn check_structure(&mut self, tree: &BPlusTree<u64, u64>, operation_index: usize) {
        if let Err(error) = tree.check_invariants() {
            self.violations.push(InvariantViolation {
                description: "structural invariant broken".to_string(),
                operation_index,
                context: error.to_string(),
            });
        }
    }
}
