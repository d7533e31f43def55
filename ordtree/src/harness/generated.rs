//! Seeded randomised test for the B-tree.
//!
//! A run inserts `n` distinct keys drawn from a shuffled pool, removes half of
//! them in a shuffled order and then removes the rest, validating the whole
//! tree after every mutation. The same `(t, n, seed)` always replays the same
//! sequence, so a failure report is enough to reproduce it.

use std::fmt;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::btree::{BTree, Key, MIN_DEGREE};

use super::invariants::{Violation, validate};

/// Seed used when none is configured.
pub const DEFAULT_SEED: u64 = 123_456_789;

/// Phase of a generated run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Inserting the first `n` pool keys.
    Insert,
    /// Removing the first `n / 2` inserted keys in shuffled order.
    DeleteHalf,
    /// Removing the remaining keys.
    Clear,
}

impl Phase {
    /// Upper-case phase name used in trace events and failure text.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::DeleteHalf => "DELETE_HALF",
            Self::Clear => "CLEAR",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parameters of a generated run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratedTest {
    /// Minimum degree `t` of the tree under test.
    pub min_degree: usize,
    /// Number of keys `n` to insert.
    pub key_count: usize,
    /// PRNG seed.
    pub seed: u64,
}

/// One mutation within a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub phase: Phase,
    /// Index within the phase.
    pub index: usize,
    pub key: Key,
    /// Number of mutations the phase performs.
    pub total: usize,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | i={} | key={}", self.phase, self.index, self.key)?;
        let done = self.index + 1;
        match self.phase {
            Phase::Insert => Ok(()),
            Phase::DeleteHalf => write!(f, " | deleted={done}/{}", self.total),
            Phase::Clear => write!(f, " | cleared={done}/{}", self.total),
        }
    }
}

/// Why a generated run did not pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarnessFailure {
    /// `t` is below 2.
    DegreeTooSmall { min_degree: usize },
    /// The key pool `1..=4n` does not fit the key type.
    KeyCountTooLarge { key_count: usize },
    /// The validator rejected the tree after a mutation.
    Invalid {
        test: GeneratedTest,
        step: Step,
        violation: Violation,
    },
    /// A key was missing after its insert, or still present after its removal.
    Lookup {
        test: GeneratedTest,
        step: Step,
        present: bool,
    },
    /// In-order traversal after the insert phase differs from the sorted keys.
    OrderMismatch {
        test: GeneratedTest,
        expected: Vec<Key>,
        found: Vec<Key>,
    },
    /// Keys remained after every inserted key was removed.
    NotEmpty {
        test: GeneratedTest,
        remaining: Vec<Key>,
    },
}

impl fmt::Display for HarnessFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DegreeTooSmall { min_degree } => {
                write!(f, "FAIL: t must be >= {MIN_DEGREE}, got {min_degree}")
            }
            Self::KeyCountTooLarge { key_count } => {
                write!(f, "FAIL: n={key_count} needs a key pool larger than {}", Key::MAX)
            }
            Self::Invalid {
                test,
                step,
                violation,
            } => write!(
                f,
                "FAIL: validator failed after {step} | {test} | validator=\"{violation}\""
            ),
            Self::Lookup {
                test,
                step,
                present,
            } => {
                let state = if *present { "still present" } else { "not found" };
                write!(f, "FAIL: key {state} after {step} | {test}")
            }
            Self::OrderMismatch {
                test,
                expected,
                found,
            } => write!(
                f,
                "FAIL: traversal after INSERT has {} keys, expected {} sorted keys | {test}",
                found.len(),
                expected.len()
            ),
            Self::NotEmpty { test, remaining } => write!(
                f,
                "FAIL: {} keys left after CLEAR | {test}",
                remaining.len()
            ),
        }
    }
}

impl std::error::Error for HarnessFailure {}

/// Counters from a passing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestReport {
    pub test: GeneratedTest,
    pub inserted: usize,
    pub deleted: usize,
    pub validations: usize,
}

impl fmt::Display for TestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PASS {}", self.test)
    }
}

impl fmt::Display for GeneratedTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={} | n={} | seed={}",
            self.min_degree, self.key_count, self.seed
        )
    }
}

impl GeneratedTest {
    /// Create a run description.
    #[must_use]
    pub const fn new(min_degree: usize, key_count: usize, seed: u64) -> Self {
        Self {
            min_degree,
            key_count,
            seed,
        }
    }

    /// Execute the run.
    ///
    /// Stops at the first failed check and returns it; the report of a
    /// passing run counts every mutation and validation performed.
    pub fn run(&self) -> Result<TestReport, HarnessFailure> {
        let test = *self;
        let tree = BTree::new(test.min_degree).map_err(|_| HarnessFailure::DegreeTooSmall {
            min_degree: test.min_degree,
        })?;
        let mut pool = key_pool(test.key_count)?;

        tracing::info!(
            t = test.min_degree,
            n = test.key_count,
            seed = test.seed,
            "START"
        );

        let mut rng = StdRng::seed_from_u64(test.seed);
        pool.shuffle(&mut rng);

        let mut run = Run {
            test,
            tree,
            validations: 0,
        };

        let n = test.key_count;
        let mut inserted: Vec<Key> = Vec::with_capacity(n);
        for (index, &key) in pool.iter().take(n).enumerate() {
            let step = Step {
                phase: Phase::Insert,
                index,
                key,
                total: n,
            };
            run.mutate(step, |tree| tree.insert(key));
            inserted.push(key);
            run.check(step, true)?;
        }

        let mut expected = inserted.clone();
        expected.sort_unstable();
        let found = run.tree.traverse();
        if found != expected {
            return Err(HarnessFailure::OrderMismatch {
                test,
                expected,
                found,
            });
        }

        inserted.shuffle(&mut rng);
        let (first_half, rest) = inserted.split_at(n / 2);

        for (phase, keys) in [(Phase::DeleteHalf, first_half), (Phase::Clear, rest)] {
            for (index, &key) in keys.iter().enumerate() {
                let step = Step {
                    phase,
                    index,
                    key,
                    total: keys.len(),
                };
                run.mutate(step, |tree| tree.remove(key));
                run.check(step, false)?;
            }
        }

        if !run.tree.is_empty() {
            return Err(HarnessFailure::NotEmpty {
                test,
                remaining: run.tree.traverse(),
            });
        }

        tracing::info!(
            t = test.min_degree,
            n = test.key_count,
            seed = test.seed,
            "PASS"
        );

        Ok(TestReport {
            test,
            inserted: n,
            deleted: n,
            validations: run.validations,
        })
    }
}

/// The keys `1..=max(1, 4n)` in ascending order.
fn key_pool(key_count: usize) -> Result<Vec<Key>, HarnessFailure> {
    let too_large = HarnessFailure::KeyCountTooLarge { key_count };
    let size = key_count.checked_mul(4).ok_or_else(|| too_large.clone())?.max(1);
    let max_key = Key::try_from(size).map_err(|_| too_large)?;
    Ok((1..=max_key).collect())
}

struct Run {
    test: GeneratedTest,
    tree: BTree,
    validations: usize,
}

impl Run {
    fn mutate(&mut self, step: Step, op: impl FnOnce(&mut BTree) -> bool) {
        self.trace(step, "before");
        let changed = op(&mut self.tree);
        self.trace(step, if changed { "after" } else { "after (no-op)" });
    }

    /// Validate the tree and confirm `step.key` is present iff `present`.
    fn check(&mut self, step: Step, present: bool) -> Result<(), HarnessFailure> {
        self.trace(step, "validate:before");
        let outcome = validate(&self.tree);
        self.validations += 1;
        self.trace(step, "validate:after");

        if let Err(violation) = outcome {
            return Err(HarnessFailure::Invalid {
                test: self.test,
                step,
                violation,
            });
        }
        if self.tree.contains(step.key) != present {
            return Err(HarnessFailure::Lookup {
                test: self.test,
                step,
                present: !present,
            });
        }
        Ok(())
    }

    fn trace(&self, step: Step, what: &str) {
        tracing::debug!(
            phase = step.phase.name(),
            i = step.index,
            key = step.key,
            t = self.test.min_degree,
            n = self.test.key_count,
            seed = self.test.seed,
            "{what}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_run_passes() {
        let report = GeneratedTest::new(4, 200, DEFAULT_SEED)
            .run()
            .expect("run passes");

        assert_eq!(report.inserted, 200);
        assert_eq!(report.deleted, 200);
        assert_eq!(report.validations, 400);
        assert_eq!(report.to_string(), "PASS t=4 | n=200 | seed=123456789");
    }

    #[test]
    fn test_small_degrees_and_seeds_pass() {
        for t in 2..=5 {
            for seed in 0..8 {
                let test = GeneratedTest::new(t, 64, seed);
                if let Err(failure) = test.run() {
                    panic!("{failure}");
                }
            }
        }
    }

    #[test]
    fn test_zero_keys_passes() {
        let report = GeneratedTest::new(2, 0, 1).run().expect("run passes");
        assert_eq!(report.validations, 0);
    }

    #[test]
    fn test_odd_key_count_splits_phases() {
        let report = GeneratedTest::new(3, 7, 42).run().expect("run passes");
        assert_eq!(report.validations, 14);
    }

    #[test]
    fn test_degree_too_small_fails() {
        let failure = GeneratedTest::new(1, 10, 1).run().expect_err("t=1 rejected");
        assert_eq!(failure, HarnessFailure::DegreeTooSmall { min_degree: 1 });
        assert_eq!(failure.to_string(), "FAIL: t must be >= 2, got 1");
    }

    #[test]
    fn test_key_pool_bounds() {
        assert_eq!(key_pool(0).expect("pool"), vec![1]);
        assert_eq!(key_pool(2).expect("pool"), (1..=8).collect::<Vec<_>>());
        assert!(matches!(
            key_pool(usize::MAX),
            Err(HarnessFailure::KeyCountTooLarge { .. })
        ));
    }

    #[test]
    fn test_same_seed_replays_same_keys() {
        let mut a = key_pool(50).expect("pool");
        let mut b = key_pool(50).expect("pool");
        a.shuffle(&mut StdRng::seed_from_u64(7));
        b.shuffle(&mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_failure_text() {
        let failure = HarnessFailure::Invalid {
            test: GeneratedTest::new(3, 10, 99),
            step: Step {
                phase: Phase::DeleteHalf,
                index: 1,
                key: 17,
                total: 5,
            },
            violation: Violation::DegreeTooSmall { min_degree: 1 },
        };

        assert_eq!(
            failure.to_string(),
            "FAIL: validator failed after DELETE_HALF | i=1 | key=17 | deleted=2/5 \
             | t=3 | n=10 | seed=99 | validator=\"INVALID: minimum degree 1 is below 2\""
        );
    }

    #[test]
    fn test_insert_step_has_no_progress_suffix() {
        let step = Step {
            phase: Phase::Insert,
            index: 0,
            key: 5,
            total: 3,
        };
        assert_eq!(step.to_string(), "INSERT | i=0 | key=5");
    }
}
