//! Test repeated deletion of the root and of the minimum.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::e2e_tests::helpers::*;

fn hundred_shuffled() -> IntTree {
    let mut keys: Vec<i32> = (1..=100).collect();
    keys.shuffle(&mut StdRng::seed_from_u64(2024));

    let mut tree = int_rbtree();
    for key in keys {
        tree.insert(key);
    }
    black_height(&tree);
    tree
}

#[test]
fn test_delete_root_until_empty() {
    let mut tree = hundred_shuffled();
    let mut remaining = 100;

    while let Some(root) = tree.root() {
        assert!(tree.delete(&root));
        remaining -= 1;
        assert_eq!(tree.len(), remaining);
        black_height(&tree);
        assert!(!tree.contains(&root));
    }

    assert_eq!(remaining, 0);
    assert!(tree.is_empty());
}

#[test]
fn test_delete_min_until_empty() {
    let mut tree = hundred_shuffled();

    let mut expected = 1;
    while let Some(min) = tree.min() {
        assert_eq!(min, expected);
        assert!(tree.delete(&min));
        black_height(&tree);
        expected += 1;
    }
    assert_eq!(expected, 101);
}
