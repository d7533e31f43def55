//! Test the seeded generated run with its default parameters.

use crate::config::HarnessConfig;
use crate::harness::{DEFAULT_SEED, GeneratedTest};

#[test]
fn test_default_parameters_pass() {
    let test = GeneratedTest::new(4, 200, DEFAULT_SEED);
    match test.run() {
        Ok(report) => assert_eq!(report.to_string(), "PASS t=4 | n=200 | seed=123456789"),
        Err(failure) => panic!("{failure}"),
    }
}

#[test]
fn test_default_config_matches_default_run() {
    assert_eq!(
        HarnessConfig::default().generated_test(),
        GeneratedTest::new(4, 200, 123_456_789)
    );
}

#[test]
fn test_runs_are_reproducible() {
    let first = GeneratedTest::new(3, 120, 99).run().expect("run passes");
    let second = GeneratedTest::new(3, 120, 99).run().expect("run passes");
    assert_eq!(first, second);
}
