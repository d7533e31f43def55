// Ordered containers and the tools that exercise them:
//  - B-tree of integer keys with proactive split / fill
//  - Validator and seeded randomised test for the B-tree
//  - Red-Black tree over caller-owned payload handles
//  - Patient dispatcher driving the Red-Black tree from a script
//
// Both trees keep their nodes in an arena and link them by index.

pub mod btree;
pub mod config;
pub mod dispatch;
pub mod harness;
pub mod rbtree;

mod e2e_tests;
