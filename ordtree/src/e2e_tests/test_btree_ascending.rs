//! Test ascending inserts and removals on a degree-2 tree.

use crate::e2e_tests::helpers::*;

#[test]
fn test_insert_then_remove_in_order() {
    let mut tree = btree(2);
    insert_all_validated(&mut tree, 1..=10);
    assert_eq!(tree.len(), 10);

    remove_all_validated(&mut tree, 1..=10);
    assert!(tree.is_empty());
    assert_eq!(tree.node_count(), 0);
    assert!(tree.traverse().is_empty());
}

#[test]
fn test_any_insert_order_traverses_sorted() {
    let orders: [Vec<i32>; 3] = [
        (1..=40).collect(),
        (1..=40).rev().collect(),
        (1..=40).map(|i| (i * 17) % 41).collect(),
    ];

    for order in orders {
        let mut tree = btree(2);
        insert_all_validated(&mut tree, order.iter().copied());

        let mut sorted = order.clone();
        sorted.sort_unstable();
        assert_eq!(tree.traverse(), sorted);

        remove_all_validated(&mut tree, order.iter().rev().copied());
        assert!(tree.is_empty());
    }
}
