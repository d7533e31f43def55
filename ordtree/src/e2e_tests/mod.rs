//! End-to-end tests at the public-API level.
//!
//! Each test file covers one scenario, using deterministic inputs so that
//! failures replay exactly.

#![cfg(test)]

mod helpers;

mod test_btree_ascending;
mod test_btree_lookup;
mod test_dispatcher_script;
mod test_generated_harness;
mod test_rbtree_delete_root;
mod test_rbtree_insert;
