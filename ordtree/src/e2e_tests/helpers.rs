//! Common helpers for end-to-end tests.

use std::cmp::Ordering;

use crate::btree::{BTree, Key};
use crate::harness::{VALID, verdict};
use crate::rbtree::RbTree;

/// An empty B-tree of minimum degree `t`.
#[must_use]
pub fn btree(t: usize) -> BTree {
    BTree::new(t).unwrap_or_else(|e| panic!("Failed to create tree: {e}"))
}

/// Insert `keys` one by one, asserting the tree is valid after each.
pub fn insert_all_validated(tree: &mut BTree, keys: impl IntoIterator<Item = Key>) {
    for key in keys {
        assert!(tree.insert(key), "key {key} was already present");
        assert_eq!(verdict(tree), VALID, "after inserting {key}");
    }
}

/// Remove `keys` one by one, asserting the tree is valid after each.
pub fn remove_all_validated(tree: &mut BTree, keys: impl IntoIterator<Item = Key>) {
    for key in keys {
        assert!(tree.remove(key), "key {key} was missing");
        assert_eq!(verdict(tree), VALID, "after removing {key}");
        assert!(tree.search(key).is_none(), "key {key} still found");
    }
}

pub type IntTree = RbTree<i32, fn(&i32, &i32) -> Ordering>;

/// An empty Red-Black tree ordering integers ascending.
#[must_use]
pub fn int_rbtree() -> IntTree {
    RbTree::new(i32::cmp as fn(&i32, &i32) -> Ordering)
}

/// Black height of `tree`, panicking with the violation if it is invalid.
pub fn black_height(tree: &IntTree) -> usize {
    match tree.validate() {
        Ok(height) => height,
        Err(violation) => panic!("{violation}"),
    }
}
