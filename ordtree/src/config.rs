//! Harness configuration module.
//!
//! This module loads the parameters of the generated B-tree test from
//! environment variables.
//!
//! # Environment Variables
//!
//! - `ORDTREE_MIN_DEGREE`: Minimum degree `t` of the tree under test (default: `4`)
//! - `ORDTREE_KEY_COUNT`: Number of keys `n` to insert (default: `200`)
//! - `ORDTREE_SEED`: PRNG seed (default: `123456789`)
//!
//! # Invariants
//!
//! - `min_degree` is always at least 2
//! - `seed` fits in a `u64`

use crate::btree::MIN_DEGREE;
use crate::harness::{DEFAULT_SEED, GeneratedTest};

/// Parameters for the `harness` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Minimum degree of the tree under test.
    pub min_degree: usize,
    /// Number of keys inserted.
    pub key_count: usize,
    /// Seed for the key shuffle.
    pub seed: u64,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
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

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            min_degree: Self::DEFAULT_MIN_DEGREE,
            key_count: Self::DEFAULT_KEY_COUNT,
            seed: DEFAULT_SEED,
        }
    }
}

impl HarnessConfig {
    /// Default minimum degree.
    pub const DEFAULT_MIN_DEGREE: usize = 4;
    /// Default number of keys.
    pub const DEFAULT_KEY_COUNT: usize = 200;

    /// Load configuration from environment variables.
    ///
    /// Unset variables take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - a variable is set but does not parse as a non-negative integer
    /// - `ORDTREE_MIN_DEGREE` is below 2
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value
    /// if it is set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let min_degree = load(&lookup, "ORDTREE_MIN_DEGREE", defaults.min_degree)?;
        if min_degree < MIN_DEGREE {
            return Err(ConfigError::InvalidValue {
                name: "ORDTREE_MIN_DEGREE".to_string(),
                message: format!("must be at least {MIN_DEGREE}, got {min_degree}"),
            });
        }
        let key_count = load(&lookup, "ORDTREE_KEY_COUNT", defaults.key_count)?;
        let seed = load(&lookup, "ORDTREE_SEED", defaults.seed)?;

        Ok(Self {
            min_degree,
            key_count,
            seed,
        })
    }

    /// The generated test these parameters describe.
    #[must_use]
    pub const fn generated_test(&self) -> GeneratedTest {
        GeneratedTest::new(self.min_degree, self.key_count, self.seed)
    }
}

/// Parse variable `name`, or return `default` if it is unset.
fn load<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(value) => value.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            message: format!("'{value}' is not a non-negative integer"),
        }),
        None => Ok(default),
    }
}
