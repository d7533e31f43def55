//! B-tree node type and node handles.
//!
//! Nodes are stored in the tree's arena and refer to their children through
//! [`NodeId`] handles rather than owning pointers. A node owns its children
//! in the sense that no two live nodes list the same child, and the tree
//! frees a child's slot exactly when the node that listed it drops it.

use std::fmt;

/// Integer key stored in the B-tree.
///
/// Keys are 32-bit so that the validator can use `i64` bounds that lie
/// strictly outside the key range.
pub type Key = i32;

/// Handle to a node slot in the tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Create a handle from a raw slot index.
    ///
    /// # Panics
    ///
    /// Panics if the index does not fit in 32 bits.
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        let Ok(raw) = u32::try_from(index) else {
            panic!("node arena exceeded {} slots", u32::MAX);
        };
        Self(raw)
    }

    /// The slot index this handle refers to.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single B-tree node.
///
/// `children` is empty iff `leaf` is set. For internal nodes
/// `children.len() == keys.len() + 1` and `children[i]` holds keys strictly
/// between `keys[i - 1]` and `keys[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Whether this node is a leaf.
    pub leaf: bool,
    /// Minimum degree the node was created with; always equals the tree's.
    pub min_degree: usize,
    /// Keys in strictly increasing order.
    pub keys: Vec<Key>,
    /// Child handles, one more than `keys` for internal nodes.
    pub children: Vec<NodeId>,
}

impl Node {
    /// Create an empty leaf.
    #[must_use]
    pub fn leaf(min_degree: usize) -> Self {
        Self {
            leaf: true,
            min_degree,
            keys: Vec::with_capacity(2 * min_degree - 1),
            children: Vec::new(),
        }
    }

    /// Create an internal node with no keys and a single child.
    ///
    /// This is the shape of a freshly grown root before its only child is
    /// split into it.
    #[must_use]
    pub fn internal_over(min_degree: usize, child: NodeId) -> Self {
        let mut children = Vec::with_capacity(2 * min_degree);
        children.push(child);
        Self {
            leaf: false,
            min_degree,
            keys: Vec::with_capacity(2 * min_degree - 1),
            children,
        }
    }

    /// Whether the node holds the maximum `2t - 1` keys.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.keys.len() == 2 * self.min_degree - 1
    }

    /// Whether the node can give a key away without underflowing.
    #[must_use]
    pub fn has_spare_key(&self) -> bool {
        self.keys.len() >= self.min_degree
    }

    /// Smallest index `i` with `keys[i] >= key`.
    #[must_use]
    pub fn find_key(&self, key: Key) -> usize {
        self.keys.partition_point(|&k| k < key)
    }

    /// Index of the child an insert of `key` descends into.
    #[must_use]
    pub fn child_slot_for_insert(&self, key: Key) -> usize {
        self.keys.partition_point(|&k| k <= key)
    }

    /// Largest key in the node.
    ///
    /// # Panics
    ///
    /// Panics on a node without keys, which never occurs in a valid tree.
    #[must_use]
    pub fn last_key(&self) -> Key {
        self.keys[self.keys.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_key_positions() {
        let mut node = Node::leaf(3);
        node.keys.extend([10, 20, 30]);

        assert_eq!(node.find_key(5), 0);
        assert_eq!(node.find_key(10), 0);
        assert_eq!(node.find_key(15), 1);
        assert_eq!(node.find_key(30), 2);
        assert_eq!(node.find_key(31), 3);
    }

    #[test]
    fn test_child_slot_for_insert_goes_right_of_equal() {
        let mut node = Node::leaf(2);
        node.keys.extend([10, 20]);

        assert_eq!(node.child_slot_for_insert(10), 1);
        assert_eq!(node.child_slot_for_insert(19), 1);
        assert_eq!(node.child_slot_for_insert(25), 2);
    }

    #[test]
    fn test_fullness() {
        let mut node = Node::leaf(2);
        node.keys.extend([1, 2]);
        assert!(!node.is_full());
        assert!(node.has_spare_key());

        node.keys.push(3);
        assert!(node.is_full());
    }

    #[test]
    fn test_internal_over_has_single_child() {
        let node = Node::internal_over(3, NodeId::from_index(7));
        assert!(!node.leaf);
        assert!(node.keys.is_empty());
        assert_eq!(node.children, vec![NodeId::from_index(7)]);
    }

    #[test]
    fn test_node_id_display() {
        assert_eq!(NodeId::from_index(42).to_string(), "#42");
        assert_eq!(NodeId::from_index(42).index(), 42);
    }
}
