//! Test the dispatcher end to end through its script format.

use crate::dispatch::{EMPTY_CLINIC, run_script};

#[test]
fn test_sample_script() {
    let output = run_script("7\n0 A 5\n0 B 5\n0 C 9\n3\n1 A 10\n3\n2 C\n3\n").expect("script parses");
    assert_eq!(output, vec!["C", "A", "A"]);
}

#[test]
fn test_queue_drains_to_empty() {
    let script = "9\n0 Ann 4\n0 Bob 4\n0 Cy 4\n3\n2 Ann\n3\n2 Bob\n2 Cy\n3\n";
    let output = run_script(script).expect("script parses");
    assert_eq!(output, vec!["Ann", "Bob", EMPTY_CLINIC]);
}

#[test]
fn test_retriage_downward_and_unknown_names() {
    let script = "8\n0 A 10\n0 B 8\n1 A -5\n1 Ghost 100\n2 Ghost\n3\n2 B\n3\n";
    let output = run_script(script).expect("script parses");
    assert_eq!(output, vec!["B", "A"]);
}
