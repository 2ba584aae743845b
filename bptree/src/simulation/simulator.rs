//! Main simulator harness for deterministic simulation testing.
//!
//! Ties together the operation generator, the model history and the
//! invariant checker, and drives a `BPlusTree<u64, u64>` with them.

use std::panic::{AssertUnwindSafe, catch_unwind};

use super::invariants::{InvariantChecker, InvariantViolation, OperationHistory};
use super::op_gen::{Operation, OperationGenConfig, OperationGenerator};
use crate::btree::BPlusTree;
use crate::config::{SimulationSettings, TreeConfig};

/// Configuration for the simulator.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility.
    pub seed: u64,
    /// Shape of the tree under test.
    pub tree: TreeConfig,
    /// Operation generation configuration.
    pub op_config: OperationGenConfig,
    /// Run the full structural check every this many operations (0 disables it).
    pub structure_check_interval: usize,
    /// Stop at the first violation instead of running to completion.
    pub stop_on_violation: bool,
}

impl SimulatorConfig {
    /// Create a new simulator config with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            tree: TreeConfig::default(),
            op_config: OperationGenConfig::default(),
            structure_check_interval: 64,
            stop_on_violation: true,
        }
    }

    /// Build a config from environment-derived settings.
    #[must_use]
    pub fn from_settings(settings: &SimulationSettings) -> Self {
        Self::new(settings.seed)
            .with_tree_config(settings.tree)
            .with_key_space(settings.key_space)
    }

    /// Set the tree shape.
    #[must_use]
    pub const fn with_tree_config(mut self, tree: TreeConfig) -> Self {
        self.tree = tree;
        self
    }

    /// Set the operation configuration.
    #[must_use]
    pub const fn with_op_config(mut self, config: OperationGenConfig) -> Self {
        self.op_config = config;
        self
    }

    /// Draw keys from `0..key_space`.
    #[must_use]
    pub const fn with_key_space(mut self, key_space: u64) -> Self {
        self.op_config.key_space = key_space;
        self
    }

    /// Set how often the structural check runs.
    #[must_use]
    pub const fn with_structure_check_interval(mut self, interval: usize) -> Self {
        self.structure_check_interval = interval;
        self
    }

    /// Keep running after a violation.
    #[must_use]
    pub const fn without_stop_on_violation(mut self) -> Self {
        self.stop_on_violation = false;
        self
    }
}

/// Results from a simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The seed used for this simulation.
    pub seed: u64,
    /// Number of operations applied.
    pub operations_applied: usize,
    /// Number of operations that changed the tree.
    pub mutations: u64,
    /// Entries in the tree at the end of the run.
    pub final_len: usize,
    /// Invariant violations detected.
    pub invariant_violations: Vec<InvariantViolation>,
    /// Whether the simulation completed without panics.
    pub completed_successfully: bool,
    /// Error message if simulation failed.
    pub error: Option<String>,
}

impl SimulationResult {
    /// Check if the simulation passed (no invariant violations).
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.completed_successfully && self.invariant_violations.is_empty()
    }
}

/// The main simulator harness.
pub struct Simulator {
    config: SimulatorConfig,
    generator: OperationGenerator,
    tree: BPlusTree<u64, u64>,
    history: OperationHistory,
    checker: InvariantChecker,
    mutations: u64,
}

impl Simulator {
    /// Create a new simulator with the given configuration.
    #[must_use]
    pub fn new(config: SimulatorConfig) -> Self {
        let generator = OperationGenerator::with_config(config.seed, config.op_config.clone());
        let tree = BPlusTree::with_config(config.tree);

        Self {
            config,
            generator,
            tree,
            history: OperationHistory::new(),
            checker: InvariantChecker::new(),
            mutations: 0,
        }
    }

    /// Run the simulation for a given number of generated operations.
    ///
    /// A panic inside the tree is caught and reported as a failed run.
    pub fn run(&mut self, operation_count: usize) -> SimulationResult {
        tracing::info!(
            "simulation seed={} fanout={} operations={operation_count}",
            self.config.seed,
            self.config.tree.fanout()
        );

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            for _ in 0..operation_count {
                let op = self.generator.next_operation();
                self.apply(op);
                if self.config.stop_on_violation && self.checker.has_violations() {
                    break;
                }
            }
            self.finish();
        }));

        let error = outcome.err().map(|payload| {
            let message = payload
                .downcast_ref::<String>()
                .map(String::as_str)
                .or_else(|| payload.downcast_ref::<&str>().copied())
                .unwrap_or("unknown panic");
            tracing::error!(
                "simulation panicked after {} operations: {message}",
                self.history.len()
            );
            message.to_string()
        });

        if let Some(first) = self.checker.violations().first() {
            tracing::warn!(
                "violation at operation {}: {} ({}); recent operations: {:?}",
                first.operation_index,
                first.description,
                first.context,
                self.history.recent(8)
            );
        }

        SimulationResult {
            seed: self.config.seed,
            operations_applied: self.history.len(),
            mutations: self.mutations,
            final_len: self.history.model().len(),
            invariant_violations: self.checker.violations().to_vec(),
            completed_successfully: error.is_none(),
            error,
        }
    }

    /// Apply one operation to the tree and the model, then check the outcome.
    pub fn apply(&mut self, op: Operation) {
        let index = self.history.len();
        match op {
            Operation::Insert { key, value } => {
                let expected = self.history.model().get(&key).copied();
                let previous = self.tree.insert(key, value);
                if previous != expected {
                    self.checker.add_violation(InvariantViolation {
                        description: "insert returned wrong previous value".to_string(),
                        operation_index: index,
                        context: format!("key {key}: expected {expected:?}, got {previous:?}"),
                    });
                }
            }
            Operation::Remove { key } => {
                let expected = self.history.model().contains_key(&key);
                let removed = self.tree.remove(&key);
                if removed != expected {
                    self.checker.add_violation(InvariantViolation {
                        description: "remove reported wrong outcome".to_string(),
                        operation_index: index,
                        context: format!("key {key}: expected {expected}, got {removed}"),
                    });
                }
            }
            Operation::RemoveFloor { key } => {
                let expected = self
                    .history
                    .model()
                    .range(..=key)
                    .next_back()
                    .map(|(k, v)| (*k, *v));
                let cursor = self.tree.find_left(&key);
                let removed = self.tree.remove_at(cursor);
                if removed != expected {
                    self.checker.add_violation(InvariantViolation {
                        description: "cursor removal removed the wrong entry".to_string(),
                        operation_index: index,
                        context: format!("floor of {key}: expected {expected:?}, got {removed:?}"),
                    });
                }
            }
            Operation::Clear => self.tree.clear(),
            Operation::Search { .. }
            | Operation::FindLeft { .. }
            | Operation::FindBefore { .. }
            | Operation::LowerBound { .. }
            | Operation::Scan => {}
        }

        if op.is_mutation() {
            self.mutations += 1;
        }
        self.history.record(op);
        self.checker
            .check_operation(op, &self.tree, self.history.model(), index);

        let interval = self.config.structure_check_interval;
        if interval != 0 && self.history.len() % interval == 0 {
            self.checker.check_structure(&self.tree, index);
        }
    }

    /// Final full comparison after the last operation.
    fn finish(&mut self) {
        let index = self.history.len();
        self.checker
            .check_contents(&self.tree, self.history.model(), index);
        self.checker.check_structure(&self.tree, index);
    }

    /// Get the tree under test.
    #[must_use]
    pub const fn tree(&self) -> &BPlusTree<u64, u64> {
        &self.tree
    }

    /// Get the operation history.
    #[must_use]
    pub const fn history(&self) -> &OperationHistory {
        &self.history
    }

    /// Get the invariant checker.
    #[must_use]
    pub const fn checker(&self) -> &InvariantChecker {
        &self.checker
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_fanout(seed: u64, fanout: usize) -> SimulatorConfig {
        SimulatorConfig::new(seed)
            .with_tree_config(TreeConfig::new(fanout).expect("valid fanout"))
            .with_key_space(256)
            .with_structure_check_interval(1)
    }

    #[test]
    fn test_simulator_basic() {
        let mut simulator = Simulator::new(SimulatorConfig::new(12345));

        let result = simulator.run(2000);

        assert!(result.passed(), "{:?}", result.invariant_violations);
        assert_eq!(result.operations_applied, 2000);
        assert_eq!(result.final_len, simulator.tree().len());
        assert!(result.mutations > 0);
    }

    #[test]
    fn test_simulator_small_fanouts() {
        for fanout in [3, 4, 5, 7] {
            let mut simulator = Simulator::new(small_fanout(fanout as u64, fanout));

            let result = simulator.run(3000);

            assert!(
                result.passed(),
                "fanout {fanout}: {:?} {:?}",
                result.error,
                result.invariant_violations
            );
        }
    }

    #[test]
    fn test_simulator_deterministic() {
        let mut sim1 = Simulator::new(small_fanout(777, 4));
        let result1 = sim1.run(1000);

        let mut sim2 = Simulator::new(small_fanout(777, 4));
        let result2 = sim2.run(1000);

        assert_eq!(result1.mutations, result2.mutations);
        assert_eq!(result1.final_len, result2.final_len);
        assert_eq!(sim1.history().stats(), sim2.history().stats());
    }

    #[test]
    fn test_simulator_grows_then_drains() {
        let grow = OperationGenConfig {
            insert_weight: 1,
            remove_weight: 0,
            remove_floor_weight: 0,
            lookup_weight: 0,
            scan_weight: 0,
            clear_rate: 0.0,
            key_space: 100_000,
        };
        let mut simulator = Simulator::new(small_fanout(5, 4).with_op_config(grow));
        assert!(simulator.run(2000).passed());

        let keys: Vec<u64> = simulator.history().model().keys().copied().collect();
        for key in keys {
            simulator.apply(Operation::Remove { key });
        }
        simulator.apply(Operation::Scan);

        assert!(!simulator.checker().has_violations());
        assert!(simulator.tree().is_empty());
    }

    #[test]
    fn test_from_settings() {
        let settings = SimulationSettings {
            seed: 9,
            operations: 10,
            key_space: 32,
            tree: TreeConfig::new(6).expect("valid fanout"),
        };
        let config = SimulatorConfig::from_settings(&settings);

        assert_eq!(config.seed, 9);
        assert_eq!(config.tree.fanout(), 6);
        assert_eq!(config.op_config.key_space, 32);
    }

    #[test]
    #[ignore] // Long running test
    fn test_simulator_stress() {
        let config = SimulatorConfig::new(99999)
            .with_key_space(1 << 20)
            .with_structure_check_interval(10_000);
        let mut simulator = Simulator::new(config);

        let result = simulator.run(1_000_000);

        assert!(result.passed());
    }
}
