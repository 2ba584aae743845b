//! Operation generator for deterministic simulation testing.
//!
//! Produces random but reproducible sequences of tree operations. Keys are
//! drawn from a bounded key space so that inserts collide with existing keys
//! and removals hit present keys often enough to exercise borrow and merge.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// One operation applied to both the tree under test and the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Insert or update `key`.
    Insert { key: u64, value: u64 },
    /// Remove `key`.
    Remove { key: u64 },
    /// Remove the entry at the floor cursor of `key`, if any.
    RemoveFloor { key: u64 },
    /// Point lookup.
    Search { key: u64 },
    /// Inclusive floor lookup.
    FindLeft { key: u64 },
    /// Strict predecessor lookup.
    FindBefore { key: u64 },
    /// Smallest key not below `key`.
    LowerBound { key: u64 },
    /// Full scan compared against the model in both directions.
    Scan,
    /// Drop every entry.
    Clear,
}

impl Operation {
    /// Whether applying this operation can change the tree.
    #[must_use]
    pub const fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::Insert { .. } | Self::Remove { .. } | Self::RemoveFloor { .. } | Self::Clear
        )
    }
}

/// Configuration for operation generation.
///
/// The `*_weight` fields are relative to each other and need not sum to any total.
#[derive(Debug, Clone)]
pub struct OperationGenConfig {
    /// Keys are drawn from `0..key_space`.
    pub key_space: u64,
    pub insert_weight: u32,
    pub remove_weight: u32,
    pub remove_floor_weight: u32,
    pub lookup_weight: u32,
    pub scan_weight: u32,
    /// Probability of a `Clear` in place of any other operation (0.0 - 1.0).
    pub clear_rate: f64,
}

impl Default for OperationGenConfig {
    fn default() -> Self {
        Self {
            key_space: 4096,
            insert_weight: 50,
            remove_weight: 25,
            remove_floor_weight: 5,
            lookup_weight: 19,
            scan_weight: 1,
            clear_rate: 0.0005,
        }
    }
}

/// Generator for random `Operation` sequences.
///
/// Produces the same sequence for the same seed and configuration.
pub struct OperationGenerator {
    rng: StdRng,
    config: OperationGenConfig,
}

impl OperationGenerator {
    /// Create a generator with the default configuration.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, OperationGenConfig::default())
    }

    #[must_use]
    pub fn with_config(seed: u64, config: OperationGenConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &OperationGenConfig {
        &self.config
    }

    /// Generate the next operation.
    pub fn next_operation(&mut self) -> Operation {
        if self.config.clear_rate > 0.0 && self.rng.random_bool(self.config.clear_rate) {
            return Operation::Clear;
        }

        let key = self.random_key();
        let c = &self.config;
        let total = c.insert_weight
            + c.remove_weight
            + c.remove_floor_weight
            + c.lookup_weight
            + c.scan_weight;
        if total == 0 {
            return Operation::Scan;
        }

        let mut roll = self.rng.random_range(0..total);

        if roll < c.insert_weight {
            return Operation::Insert {
                key,
                value: self.rng.random(),
            };
        }
        roll -= c.insert_weight;
        if roll < c.remove_weight {
            return Operation::Remove { key };
        }
        roll -= c.remove_weight;
        if roll < c.remove_floor_weight {
            return Operation::RemoveFloor { key };
        }
        roll -= c.remove_floor_weight;
        if roll < c.lookup_weight {
            return match self.rng.random_range(0..4) {
                0 => Operation::Search { key },
                1 => Operation::FindLeft { key },
                2 => Operation::FindBefore { key },
                _ => Operation::LowerBound { key },
            };
        }
        Operation::Scan
    }

    /// Generate `count` operations.
    pub fn generate(&mut self, count: usize) -> Vec<Operation> {
        (0..count).map(|_| self.next_operation()).collect()
    }

    fn random_key(&mut self) -> u64 {
        self.rng.random_range(0..self.config.key_space.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_deterministic() {
        let mut first = OperationGenerator::new(12345);
        let mut second = OperationGenerator::new(12345);

        assert_eq!(first.generate(500), second.generate(500));
    }

    #[test]
    fn test_generator_different_seeds() {
        let mut first = OperationGenerator::new(1);
        let mut second = OperationGenerator::new(2);

        assert_ne!(first.generate(100), second.generate(100));
    }

    #[test]
    fn test_keys_stay_in_key_space() {
        let config = OperationGenConfig {
            key_space: 10,
            ..OperationGenConfig::default()
        };
        let mut generator = OperationGenerator::with_config(7, config);

        for op in generator.generate(1000) {
            let key = match op {
                Operation::Insert { key, .. }
                | Operation::Remove { key }
                | Operation::RemoveFloor { key }
                | Operation::Search { key }
                | Operation::FindLeft { key }
                | Operation::FindBefore { key }
                | Operation::LowerBound { key } => key,
                Operation::Scan | Operation::Clear => continue,
            };
            assert!(key < 10);
        }
    }

    #[test]
    fn test_insert_only_config() {
        let config = OperationGenConfig {
            insert_weight: 1,
            remove_weight: 0,
            remove_floor_weight: 0,
            lookup_weight: 0,
            scan_weight: 0,
            clear_rate: 0.0,
            ..OperationGenConfig::default()
        };
        let mut generator = OperationGenerator::with_config(99, config);

        assert!(
            generator
                .generate(200)
                .iter()
                .all(|op| matches!(op, Operation::Insert { .. }))
        );
    }

    #[test]
    fn test_default_mix_has_every_kind() {
        let mut generator = OperationGenerator::new(42);
        let ops = generator.generate(5000);

        assert!(ops.iter().any(|op| matches!(op, Operation::Insert { .. })));
        assert!(ops.iter().any(|op| matches!(op, Operation::Remove { .. })));
        assert!(ops.iter().any(|op| matches!(op, Operation::RemoveFloor { .. })));
        assert!(ops.iter().any(|op| matches!(op, Operation::FindLeft { .. })));
        assert!(ops.iter().any(|op| matches!(op, Operation::Scan)));
        assert!(ops.iter().any(Operation::is_mutation));
    }
}
