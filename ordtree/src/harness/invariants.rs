//! Structural validator for [`BTree`].
//!
//! A single recursive descent checks every B-tree invariant and stops at the
//! first violation. Bounds are carried as `i64` so the open interval at the
//! top of the tree lies strictly outside the `i32` key range.

use std::fmt;

use crate::btree::{BTree, Key, MIN_DEGREE, Node, NodeId};

/// Verdict text for a tree that satisfies every invariant.
pub const VALID: &str = "VALID";

/// The first broken invariant found by [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// The tree's minimum degree is below 2.
    DegreeTooSmall { min_degree: usize },
    /// A handle reached during the descent does not refer to a live node.
    NullNode { node: NodeId },
    /// A node records a different minimum degree than the tree.
    DegreeMismatch {
        node: NodeId,
        found: usize,
        expected: usize,
    },
    /// A node holds more than `2t - 1` keys.
    OverCapacity { node: NodeId, keys: usize },
    /// A non-root node holds fewer than `t - 1` keys.
    UnderCapacity { node: NodeId, keys: usize },
    /// The root is internal but holds no keys.
    EmptyInternalRoot { node: NodeId },
    /// A leaf lists children.
    LeafWithChildren { node: NodeId, children: usize },
    /// A leaf sits at a different depth than the first leaf seen.
    UnevenLeafDepth {
        node: NodeId,
        depth: usize,
        expected: usize,
    },
    /// An internal node does not have exactly one more child than keys.
    ChildCountMismatch {
        node: NodeId,
        keys: usize,
        children: usize,
    },
    /// An internal node lists a child handle that is not live.
    NullChild { node: NodeId, index: usize },
    /// Two adjacent keys are out of order or equal.
    KeysNotIncreasing { node: NodeId, index: usize },
    /// A key lies outside the open interval inherited from its ancestors.
    IntervalViolation {
        node: NodeId,
        key: Key,
        lower: i64,
        upper: i64,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "INVALID: ")?;
        match self {
            Self::DegreeTooSmall { min_degree } => {
                write!(f, "minimum degree {min_degree} is below {MIN_DEGREE}")
            }
            Self::NullNode { node } => write!(f, "node {node} is not live"),
            Self::DegreeMismatch {
                node,
                found,
                expected,
            } => write!(
                f,
                "node {node} records degree {found}, tree degree is {expected}"
            ),
            Self::OverCapacity { node, keys } => {
                write!(f, "node {node} has {keys} keys, more than 2t-1")
            }
            Self::UnderCapacity { node, keys } => {
                write!(f, "non-root node {node} has {keys} keys, fewer than t-1")
            }
            Self::EmptyInternalRoot { node } => {
                write!(f, "internal root {node} has 0 keys")
            }
            Self::LeafWithChildren { node, children } => {
                write!(f, "leaf {node} has {children} children")
            }
            Self::UnevenLeafDepth {
                node,
                depth,
                expected,
            } => write!(
                f,
                "leaf {node} at depth {depth}, other leaves at depth {expected}"
            ),
            Self::ChildCountMismatch {
                node,
                keys,
                children,
            } => write!(
                f,
                "internal node {node} has {children} children for {keys} keys"
            ),
            Self::NullChild { node, index } => {
                write!(f, "internal node {node} has null child at {index}")
            }
            Self::KeysNotIncreasing { node, index } => write!(
                f,
                "keys of node {node} not strictly increasing at {index}"
            ),
            Self::IntervalViolation {
                node,
                key,
                lower,
                upper,
            } => write!(
                f,
                "key {key} in node {node} violates parent interval ({lower}, {upper})"
            ),
        }
    }
}

impl std::error::Error for Violation {}

/// Check every structural invariant of `tree`.
///
/// The empty tree is valid. The check is read-only and linear in the number
/// of nodes.
pub fn validate(tree: &BTree) -> Result<(), Violation> {
    let min_degree = tree.min_degree();
    if min_degree < MIN_DEGREE {
        return Err(Violation::DegreeTooSmall { min_degree });
    }
    let Some(root) = tree.root() else {
        return Ok(());
    };

    let mut walk = Walk {
        tree,
        min_degree,
        leaf_depth: None,
    };
    walk.check(root, true, i64::MIN, i64::MAX, 0)
}

/// [`validate`] rendered as `"VALID"` or the violation text.
#[must_use]
pub fn verdict(tree: &BTree) -> String {
    match validate(tree) {
        Ok(()) => VALID.to_string(),
        Err(violation) => violation.to_string(),
    }
}

struct Walk<'a> {
    tree: &'a BTree,
    min_degree: usize,
    // Depth of the first leaf reached; every other leaf must match it.
    leaf_depth: Option<usize>,
}

impl Walk<'_> {
    fn check(
        &mut self,
        id: NodeId,
        is_root: bool,
        lower: i64,
        upper: i64,
        depth: usize,
    ) -> Result<(), Violation> {
        let tree = self.tree;
        let node = tree.node(id).ok_or(Violation::NullNode { node: id })?;

        self.check_shape(id, node, is_root, depth)?;
        Self::check_keys(id, node, lower, upper)?;

        if node.leaf {
            return Ok(());
        }

        let key_count = node.keys.len();
        for (index, &child) in node.children.iter().enumerate() {
            let child_lower = if index == 0 {
                lower
            } else {
                i64::from(node.keys[index - 1])
            };
            let child_upper = if index == key_count {
                upper
            } else {
                i64::from(node.keys[index])
            };
            self.check(child, false, child_lower, child_upper, depth + 1)?;
        }
        Ok(())
    }

    fn check_shape(
        &mut self,
        id: NodeId,
        node: &Node,
        is_root: bool,
        depth: usize,
    ) -> Result<(), Violation> {
        let t = self.min_degree;
        let keys = node.keys.len();
        let children = node.children.len();

        if node.min_degree != t {
            return Err(Violation::DegreeMismatch {
                node: id,
                found: node.min_degree,
                expected: t,
            });
        }

        if keys > 2 * t - 1 {
            return Err(Violation::OverCapacity { node: id, keys });
        }
        if !is_root && keys < t - 1 {
            return Err(Violation::UnderCapacity { node: id, keys });
        }
        if is_root && !node.leaf && keys == 0 {
            return Err(Violation::EmptyInternalRoot { node: id });
        }

        if node.leaf {
            if children != 0 {
                return Err(Violation::LeafWithChildren { node: id, children });
            }
            match self.leaf_depth {
                None => self.leaf_depth = Some(depth),
                Some(expected) if expected != depth => {
                    return Err(Violation::UnevenLeafDepth {
                        node: id,
                        depth,
                        expected,
                    });
                }
                Some(_) => {}
            }
        } else {
            if children != keys + 1 {
                return Err(Violation::ChildCountMismatch {
                    node: id,
                    keys,
                    children,
                });
            }
            if let Some(index) = node
                .children
                .iter()
                .position(|&child| self.tree.node(child).is_none())
            {
                return Err(Violation::NullChild { node: id, index });
            }
        }
        Ok(())
    }

    fn check_keys(id: NodeId, node: &Node, lower: i64, upper: i64) -> Result<(), Violation> {
        for (index, &key) in node.keys.iter().enumerate() {
            if index > 0 && node.keys[index - 1] >= key {
                return Err(Violation::KeysNotIncreasing { node: id, index });
            }
            let wide = i64::from(key);
            if wide <= lower || wide >= upper {
                return Err(Violation::IntervalViolation {
                    node: id,
                    key,
                    lower,
                    upper,
                });
            }
        }
        Ok(())
    }
}
