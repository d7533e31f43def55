//! Test colour and order after a fixed insert sequence.

use crate::e2e_tests::helpers::*;

#[test]
fn test_insert_sequence_is_balanced() {
    let mut tree = int_rbtree();
    for key in [10, 20, 30, 40, 50, 25] {
        tree.insert(key);
        black_height(&tree);
    }

    assert_eq!(black_height(&tree), 2);
    assert_eq!(tree.iter().collect::<Vec<_>>(), vec![10, 20, 25, 30, 40, 50]);
    assert_eq!(tree.min(), Some(10));
    assert_eq!(tree.len(), 6);
}
