//! Tree and simulation configuration.
//!
//! Configuration is plain values with validated constructors, plus loaders
//! that read environment variables for the `bptree-sim` binary.
//!
//! # Environment Variables
//!
//! - `BPTREE_FANOUT`: Maximum entries per node (default: `16`, minimum: `3`)
//! - `BPTREE_SIM_SEED`: Seed for the simulation RNG (default: `0`)
//! - `BPTREE_SIM_OPERATIONS`: Number of simulated operations (default: `10000`)
//! - `BPTREE_SIM_KEY_SPACE`: Keys are drawn from `0..key_space` (default: `4096`)
//!
//! # Invariants
//!
//! - `fanout` is always at least `MIN_FANOUT`
//! - `key_space` is never zero

use std::str::FromStr;

/// Shape parameters for a `BPlusTree`.
///
/// # Post-conditions
///
/// - `fanout() >= TreeConfig::MIN_FANOUT`
/// - `min_leaf_entries() == ceil(fanout / 2)`
/// - `min_internal_keys() == ceil(fanout / 2) - 1`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeConfig {
    fanout: usize,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A setting has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            fanout: Self::DEFAULT_FANOUT,
        }
    }
}

impl TreeConfig {
    /// Default maximum entries per node.
    pub const DEFAULT_FANOUT: usize = 16;
    /// Smallest fanout for which merging two minimal siblings fits in one node
    /// and every non-root internal node keeps at least one key.
    pub const MIN_FANOUT: usize = 3;

    /// Create a configuration with the given fanout.
    ///
    /// # Errors
    ///
    /// Returns an error if `fanout` is below `MIN_FANOUT`.
    pub fn new(fanout: usize) -> Result<Self, ConfigError> {
        if fanout < Self::MIN_FANOUT {
            return Err(ConfigError::InvalidValue {
                name: "fanout".to_string(),
                message: format!("{fanout} is below the minimum of {}", Self::MIN_FANOUT),
            });
        }
        Ok(Self { fanout })
    }

    /// Load the tree configuration from `BPTREE_FANOUT`.
    ///
    /// Returns the default if not set.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is set but is not a number, or is below `MIN_FANOUT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let fanout = load_env_or("BPTREE_FANOUT", Self::DEFAULT_FANOUT)?;
        Self::new(fanout).map_err(|_| ConfigError::InvalidValue {
            name: "BPTREE_FANOUT".to_string(),
            message: format!("'{fanout}' must be at least {}", Self::MIN_FANOUT),
        })
    }

    /// Maximum entries per node.
    #[must_use]
    pub const fn fanout(&self) -> usize {
        self.fanout
    }

    /// Minimum entries in a non-root leaf.
    #[must_use]
    pub const fn min_leaf_entries(&self) -> usize {
        self.fanout.div_ceil(2)
    }

    /// Minimum keys in a non-root internal node.
    #[must_use]
    pub const fn min_internal_keys(&self) -> usize {
        self.fanout.div_ceil(2) - 1
    }
}

/// Settings for a `bptree-sim` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationSettings {
    /// Seed for the operation generator.
    pub seed: u64,
    /// Number of operations to apply.
    pub operations: usize,
    /// Keys are drawn from `0..key_space`.
    pub key_space: u64,
    /// Shape of the tree under test.
    pub tree: TreeConfig,
}

impl SimulationSettings {
    /// Default number of operations per run.
    pub const DEFAULT_OPERATIONS: usize = 10_000;
    /// Default key space size.
    pub const DEFAULT_KEY_SPACE: u64 = 4096;

    /// Load simulation settings from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable is set to an unparsable value, if
    /// `BPTREE_SIM_KEY_SPACE` is zero, or if the fanout is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let seed = load_env_or("BPTREE_SIM_SEED", 0)?;
        let operations = load_env_or("BPTREE_SIM_OPERATIONS", Self::DEFAULT_OPERATIONS)?;
        let key_space = load_env_or("BPTREE_SIM_KEY_SPACE", Self::DEFAULT_KEY_SPACE)?;
        if key_space == 0 {
            return Err(ConfigError::InvalidValue {
                name: "BPTREE_SIM_KEY_SPACE".to_string(),
                message: "must not be zero".to_string(),
            });
        }
        let tree = TreeConfig::from_env()?;

        Ok(Self {
            seed,
            operations,
            key_space,
            tree,
        })
    }
}

/// Read and parse an environment variable, falling back to `default` when unset.
fn load_env_or<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            message: format!("'{value}' is not a valid number"),
        }),
        Err(_) => Ok(default),
    }
}
