//! Red-Black tree keyed by a caller-supplied comparator.
//!
//! Payloads are small `Copy` handles owned elsewhere (indices, ids, or
//! [`ById`] references). The tree orders them with its comparator and
//! deletes by identity.
//!
//! ```
//! use ordtree::rbtree::RbTree;
//!
//! let mut tree = RbTree::new(|a: &i32, b: &i32| a.cmp(b));
//! for key in [10, 20, 30, 40, 50, 25] {
//!     tree.insert(key);
//! }
//!
//! assert_eq!(tree.min(), Some(10));
//! assert!(tree.validate().is_ok());
//! assert_eq!(tree.iter().collect::<Vec<_>>(), [10, 20, 25, 30, 40, 50]);
//! ```

mod invariants;
mod node;
mod tree;

pub use invariants::RbViolation;
pub use node::{ById, Color, NodeId};
pub use tree::{Iter, RbTree};
