//! Test insert, traverse and search on a small tree of degree 3.

use crate::e2e_tests::helpers::*;

#[test]
fn test_traverse_and_search() {
    let mut tree = btree(3);
    insert_all_validated(&mut tree, [10, 20, 5, 6, 12, 30, 7, 17]);

    assert_eq!(tree.traverse(), vec![5, 6, 7, 10, 12, 17, 20, 30]);
    assert_eq!(tree.to_string(), "5 6 7 10 12 17 20 30");

    let found = tree.search(6).expect("6 is found");
    assert!(tree.node_keys(found).is_some_and(|keys| keys.contains(&6)));
    assert!(tree.search(15).is_none());
}

#[test]
fn test_absent_remove_changes_nothing() {
    let mut tree = btree(3);
    insert_all_validated(&mut tree, [10, 20, 5, 6, 12, 30, 7, 17]);
    let before = tree.traverse();

    assert!(!tree.remove(15));
    assert_eq!(tree.traverse(), before);
    assert_eq!(crate::harness::validate(&tree), Ok(()));
}
