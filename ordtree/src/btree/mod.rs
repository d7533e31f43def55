//! B-tree of integer keys.
//!
//! The tree is parameterised by its minimum degree `t`: every non-root node
//! holds between `t - 1` and `2t - 1` keys, and all leaves sit at the same
//! depth. Use [`crate::harness::validate`] to certify these invariants.
//!
//! # Usage
//!
//! ```
//! use ordtree::btree::BTree;
//!
//! let mut tree = BTree::new(3).unwrap();
//! for key in [10, 20, 5, 6, 12, 30, 7, 17] {
//!     tree.insert(key);
//! }
//!
//! assert_eq!(tree.traverse(), vec![5, 6, 7, 10, 12, 17, 20, 30]);
//! assert!(tree.search(6).is_some());
//! assert!(tree.search(15).is_none());
//! ```

mod node;
mod tree;

pub use node::{Key, Node, NodeId};
pub use tree::{BTree, BTreeError, MIN_DEGREE};
