//! Validation and randomised testing for [`crate::btree::BTree`].
//!
//! [`validate`] certifies the structural invariants of a single tree state.
//! [`GeneratedTest`] drives a seeded insert/delete workload and validates
//! after every mutation.

mod generated;
mod invariants;

pub use generated::{DEFAULT_SEED, GeneratedTest, HarnessFailure, Phase, Step, TestReport};
pub use invariants::{VALID, Violation, validate, verdict};
