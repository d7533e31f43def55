//! B-tree of integer keys parameterised by its minimum degree `t`.
//!
//! Insertion splits full nodes on the way down, so a leaf always has room
//! when it is reached. Deletion rebalances on the way down, so every node
//! entered below the root holds at least `t` keys and removing from a leaf
//! never underflows.
//!
//! Nodes live in an arena of slots addressed by [`NodeId`]. Splits allocate
//! a slot, merges and root collapses free one, and freed slots are reused
//! by later splits.

use std::fmt;

use crate::btree::node::{Key, Node, NodeId};

/// Smallest minimum degree a B-tree can be built with.
pub const MIN_DEGREE: usize = 2;

/// A B-tree of distinct integer keys.
#[derive(Debug, Clone)]
pub struct BTree {
    min_degree: usize,
    root: Option<NodeId>,
    nodes: Vec<Option<Node>>,
    free: Vec<NodeId>,
    len: usize,
}

impl BTree {
    /// Create an empty tree with minimum degree `min_degree`.
    ///
    /// The root is created lazily by the first insert.
    ///
    /// # Errors
    ///
    /// Returns [`BTreeError::DegreeTooSmall`] if `min_degree < 2`.
    pub const fn new(min_degree: usize) -> Result<Self, BTreeError> {
        if min_degree < MIN_DEGREE {
            return Err(BTreeError::DegreeTooSmall(min_degree));
        }
        Ok(Self {
            min_degree,
            root: None,
            nodes: Vec::new(),
            free: Vec::new(),
            len: 0,
        })
    }

    /// The minimum degree `t`.
    #[must_use]
    pub const fn min_degree(&self) -> usize {
        self.min_degree
    }

    /// Handle of the root node, if the tree is non-empty.
    #[must_use]
    pub const fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Number of keys stored.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree holds no keys.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of live nodes in the arena.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Number of levels; 0 for an empty tree, 1 for a lone leaf root.
    #[must_use]
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut current = self.root;
        while let Some(id) = current {
            height += 1;
            let node = self.get(id);
            current = if node.leaf { None } else { node.children.first().copied() };
        }
        height
    }

    /// Look up a node by handle.
    ///
    /// Returns `None` if the handle does not refer to a live node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    /// Keys held by the node behind `id`.
    #[must_use]
    pub fn node_keys(&self, id: NodeId) -> Option<&[Key]> {
        self.node(id).map(|node| node.keys.as_slice())
    }

    /// Find the node holding `key`.
    ///
    /// At each node, skip keys smaller than `key`; stop if the landing slot
    /// holds `key`, otherwise descend into the child at that slot.
    #[must_use]
    pub fn search(&self, key: Key) -> Option<NodeId> {
        let mut current = self.root?;
        loop {
            let node = self.get(current);
            let idx = node.find_key(key);
            if node.keys.get(idx) == Some(&key) {
                return Some(current);
            }
            if node.leaf {
                return None;
            }
            current = node.children[idx];
        }
    }

    /// Whether `key` is stored in the tree.
    #[must_use]
    pub fn contains(&self, key: Key) -> bool {
        self.search(key).is_some()
    }

    /// Insert `key`.
    ///
    /// Returns `false` and leaves the tree untouched if `key` is already
    /// present.
    pub fn insert(&mut self, key: Key) -> bool {
        if self.contains(key) {
            return false;
        }

        let Some(root) = self.root else {
            let mut leaf = Node::leaf(self.min_degree);
            leaf.keys.push(key);
            self.root = Some(self.allocate(leaf));
            self.len = 1;
            return true;
        };

        let start = if self.get(root).is_full() {
            // The only place the tree grows in height.
            let new_root = self.allocate(Node::internal_over(self.min_degree, root));
            self.split_child(new_root, 0);
            self.root = Some(new_root);
            tracing::trace!(root = %new_root, height = self.height(), "root split");
            new_root
        } else {
            root
        };

        self.insert_non_full(start, key);
        self.len += 1;
        true
    }

    /// Remove `key`.
    ///
    /// Returns `false` if the key was absent; the tree is then unchanged.
    pub fn remove(&mut self, key: Key) -> bool {
        let Some(root) = self.root else {
            return false;
        };

        let removed = self.remove_from(root, key);
        self.collapse_root();
        if removed {
            self.len -= 1;
        }
        removed
    }

    /// Call `f` with every key in ascending order.
    pub fn for_each_in_order<F: FnMut(Key)>(&self, mut f: F) {
        if let Some(root) = self.root {
            self.visit(root, &mut f);
        }
    }

    /// All keys in ascending order.
    #[must_use]
    pub fn traverse(&self) -> Vec<Key> {
        let mut keys = Vec::with_capacity(self.len);
        self.for_each_in_order(|key| keys.push(key));
        keys
    }

    /// Drop every node, leaving an empty tree with the same degree.
    pub fn clear(&mut self) {
        self.root = None;
        self.nodes.clear();
        self.free.clear();
        self.len = 0;
    }

    fn visit<F: FnMut(Key)>(&self, id: NodeId, f: &mut F) {
        let node = self.get(id);
        for (i, &key) in node.keys.iter().enumerate() {
            if !node.leaf {
                self.visit(node.children[i], f);
            }
            f(key);
        }
        if !node.leaf {
            self.visit(node.children[node.keys.len()], f);
        }
    }

    fn insert_non_full(&mut self, start: NodeId, key: Key) {
        let mut current = start;
        loop {
            let node = self.get(current);
            let mut slot = node.child_slot_for_insert(key);
            if node.leaf {
                self.get_mut(current).keys.insert(slot, key);
                return;
            }

            let child = node.children[slot];
            if self.get(child).is_full() {
                self.split_child(current, slot);
                if self.get(current).keys[slot] < key {
                    slot += 1;
                }
            }
            current = self.get(current).children[slot];
        }
    }

    /// Split the full child at `index` of `parent`.
    ///
    /// The child keeps its lower `t - 1` keys (and `t` children), a new right
    /// sibling receives the upper `t - 1` keys (and `t` children), and the
    /// median moves up into `parent.keys[index]`.
    fn split_child(&mut self, parent: NodeId, index: usize) {
        let t = self.min_degree;
        let full_id = self.get(parent).children[index];

        let full = self.get_mut(full_id);
        let upper_keys = full.keys.split_off(t);
        let median = full.keys[t - 1];
        full.keys.truncate(t - 1);
        let upper_children = if full.leaf {
            Vec::new()
        } else {
            full.children.split_off(t)
        };
        let sibling = Node {
            leaf: full.leaf,
            min_degree: full.min_degree,
            keys: upper_keys,
            children: upper_children,
        };

        let sibling_id = self.allocate(sibling);
        let parent_node = self.get_mut(parent);
        parent_node.keys.insert(index, median);
        parent_node.children.insert(index + 1, sibling_id);

        tracing::trace!(
            parent = %parent,
            left = %full_id,
            right = %sibling_id,
            median,
            "split child"
        );
    }

    fn remove_from(&mut self, start: NodeId, key: Key) -> bool {
        let mut current = start;
        let mut key = key;
        loop {
            let node = self.get(current);
            let idx = node.find_key(key);
            let found = node.keys.get(idx) == Some(&key);
            let leaf = node.leaf;
            let key_count = node.keys.len();

            if found && leaf {
                self.get_mut(current).keys.remove(idx);
                return true;
            }
            if leaf {
                return false;
            }

            if found {
                let left = self.get(current).children[idx];
                let right = self.get(current).children[idx + 1];
                if self.get(left).has_spare_key() {
                    let predecessor = self.max_key(left);
                    self.get_mut(current).keys[idx] = predecessor;
                    current = left;
                    key = predecessor;
                } else if self.get(right).has_spare_key() {
                    let successor = self.min_key(right);
                    self.get_mut(current).keys[idx] = successor;
                    current = right;
                    key = successor;
                } else {
                    self.merge_children(current, idx);
                    current = left;
                }
                continue;
            }

            let at_end = idx == key_count;
            let child = self.get(current).children[idx];
            if !self.get(child).has_spare_key() {
                self.fill(current, idx);
            }

            let node = self.get(current);
            current = if at_end && idx > node.keys.len() {
                node.children[idx - 1]
            } else {
                node.children[idx]
            };
        }
    }

    /// Give `parent.children[idx]` at least `t` keys before descending into it.
    fn fill(&mut self, parent: NodeId, idx: usize) {
        let node = self.get(parent);
        let key_count = node.keys.len();
        let prev_has_spare = idx > 0 && self.get(node.children[idx - 1]).has_spare_key();
        let next_has_spare =
            idx < key_count && self.get(node.children[idx + 1]).has_spare_key();

        if prev_has_spare {
            self.borrow_from_prev(parent, idx);
        } else if next_has_spare {
            self.borrow_from_next(parent, idx);
        } else if idx < key_count {
            self.merge_children(parent, idx);
        } else {
            self.merge_children(parent, idx - 1);
        }
    }

    /// Rotate one key from the left sibling through the parent into `children[idx]`.
    fn borrow_from_prev(&mut self, parent: NodeId, idx: usize) {
        let child_id = self.get(parent).children[idx];
        let sibling_id = self.get(parent).children[idx - 1];

        let sibling = self.get_mut(sibling_id);
        let lent_key = sibling.last_key();
        sibling.keys.truncate(sibling.keys.len() - 1);
        let lent_child = if sibling.leaf {
            None
        } else {
            sibling.children.pop()
        };

        let separator = std::mem::replace(&mut self.get_mut(parent).keys[idx - 1], lent_key);
        let child = self.get_mut(child_id);
        child.keys.insert(0, separator);
        if let Some(lent_child) = lent_child {
            child.children.insert(0, lent_child);
        }

        tracing::trace!(parent = %parent, child = %child_id, from = %sibling_id, "borrow from left sibling");
    }

    /// Rotate one key from the right sibling through the parent into `children[idx]`.
    fn borrow_from_next(&mut self, parent: NodeId, idx: usize) {
        let child_id = self.get(parent).children[idx];
        let sibling_id = self.get(parent).children[idx + 1];

        let sibling = self.get_mut(sibling_id);
        let lent_key = sibling.keys.remove(0);
        let lent_child = if sibling.leaf {
            None
        } else {
            Some(sibling.children.remove(0))
        };

        let separator = std::mem::replace(&mut self.get_mut(parent).keys[idx], lent_key);
        let child = self.get_mut(child_id);
        child.keys.push(separator);
        child.children.extend(lent_child);

        tracing::trace!(parent = %parent, child = %child_id, from = %sibling_id, "borrow from right sibling");
    }

    /// Merge `children[idx]`, `keys[idx]` and `children[idx + 1]` into
    /// `children[idx]`, freeing the right child's slot.
    fn merge_children(&mut self, parent: NodeId, idx: usize) {
        let parent_node = self.get_mut(parent);
        let separator = parent_node.keys.remove(idx);
        let right_id = parent_node.children.remove(idx + 1);
        let left_id = parent_node.children[idx];

        let right = self.release(right_id);
        let left = self.get_mut(left_id);
        left.keys.push(separator);
        left.keys.extend(right.keys);
        left.children.extend(right.children);

        tracing::trace!(parent = %parent, into = %left_id, freed = %right_id, separator, "merge children");
    }

    /// Replace a root left without keys by its only child, or empty the tree.
    fn collapse_root(&mut self) {
        let Some(root) = self.root else {
            return;
        };
        let node = self.get(root);
        if !node.keys.is_empty() {
            return;
        }

        let replacement = if node.leaf {
            None
        } else {
            node.children.first().copied()
        };
        self.release(root);
        self.root = replacement;
        tracing::trace!(old_root = %root, new_root = ?replacement, "root collapsed");
    }

    fn max_key(&self, start: NodeId) -> Key {
        let mut node = self.get(start);
        while !node.leaf {
            node = self.get(node.children[node.keys.len()]);
        }
        node.last_key()
    }

    fn min_key(&self, start: NodeId) -> Key {
        let mut node = self.get(start);
        while !node.leaf {
            node = self.get(node.children[0]);
        }
        node.keys[0]
    }

    fn allocate(&mut self, node: Node) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.nodes[id.index()] = Some(node);
            id
        } else {
            let id = NodeId::from_index(self.nodes.len());
            self.nodes.push(Some(node));
            id
        }
    }

    fn release(&mut self, id: NodeId) -> Node {
        let Some(node) = self.nodes.get_mut(id.index()).and_then(Option::take) else {
            panic!("released node {id} is not live");
        };
        self.free.push(id);
        node
    }

    fn get(&self, id: NodeId) -> &Node {
        match self.node(id) {
            Some(node) => node,
            None => panic!("dangling node handle {id}"),
        }
    }

    fn get_mut(&mut self, id: NodeId) -> &mut Node {
        match self.nodes.get_mut(id.index()).and_then(Option::as_mut) {
            Some(node) => node,
            None => panic!("dangling node handle {id}"),
        }
    }
}

/// Hooks for building deliberately broken trees in validator tests.
#[cfg(test)]
impl BTree {
    pub(crate) fn node_mut_unchecked(&mut self, id: NodeId) -> &mut Node {
        self.get_mut(id)
    }

    pub(crate) const fn set_min_degree_unchecked(&mut self, min_degree: usize) {
        self.min_degree = min_degree;
    }

    pub(crate) fn release_unchecked(&mut self, id: NodeId) -> Node {
        self.release(id)
    }
}

impl fmt::Display for BTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut result = Ok(());
        let mut first = true;
        self.for_each_in_order(|key| {
            if result.is_err() {
                return;
            }
            result = if first {
                write!(f, "{key}")
            } else {
                write!(f, " {key}")
            };
            first = false;
        });
        result
    }
}

/// Errors that can occur when building a B-tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BTreeError {
    /// The requested minimum degree is below 2.
    DegreeTooSmall(usize),
}

impl fmt::Display for BTreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DegreeTooSmall(t) => {
                write!(f, "minimum degree must be at least {MIN_DEGREE}, got {t}")
            }
        }
    }
}

impl std::error::Error for BTreeError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::validate;

    fn tree_with(t: usize, keys: impl IntoIterator<Item = Key>) -> BTree {
        let mut tree = BTree::new(t).expect("valid degree");
        for key in keys {
            assert!(tree.insert(key), "insert {key}");
        }
        tree
    }

    #[test]
    fn test_new_rejects_small_degree() {
        assert_eq!(BTree::new(1).unwrap_err(), BTreeError::DegreeTooSmall(1));
        assert_eq!(BTree::new(0).unwrap_err(), BTreeError::DegreeTooSmall(0));
        assert!(BTree::new(2).is_ok());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            BTreeError::DegreeTooSmall(1).to_string(),
            "minimum degree must be at least 2, got 1"
        );
    }

    #[test]
    fn test_empty_tree() {
        let tree = BTree::new(3).expect("valid degree");
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.height(), 0);
        assert_eq!(tree.root(), None);
        assert_eq!(tree.search(1), None);
        assert!(tree.traverse().is_empty());
        assert_eq!(tree.to_string(), "");
    }

    #[test]
    fn test_first_insert_creates_leaf_root() {
        let tree = tree_with(3, [42]);
        let root = tree.root().expect("root");
        let node = tree.node(root).expect("live root");
        assert!(node.leaf);
        assert_eq!(node.keys, vec![42]);
        assert_eq!(tree.height(), 1);
    }

    #[test]
    fn test_search_returns_node_holding_key() {
        let tree = tree_with(3, [10, 20, 5, 6, 12, 30, 7, 17]);

        let found = tree.search(6).expect("6 is present");
        assert!(tree.node_keys(found).expect("live").contains(&6));
        assert_eq!(tree.search(15), None);
    }

    #[test]
    fn test_ascending_inserts_shape() {
        let tree = tree_with(2, 1..=10);

        assert_eq!(tree.height(), 3);
        let root = tree.root().expect("root");
        assert_eq!(tree.node_keys(root), Some(&[4][..]));
        assert_eq!(tree.traverse(), (1..=10).collect::<Vec<_>>());
        assert_eq!(validate(&tree), Ok(()));
    }

    #[test]
    fn test_duplicate_insert_is_rejected() {
        let mut tree = tree_with(2, [3, 1, 2]);
        assert!(!tree.insert(2));
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.traverse(), vec![1, 2, 3]);
        assert_eq!(validate(&tree), Ok(()));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut tree = tree_with(2, 1..=10);
        let before = tree.traverse();

        assert!(!tree.remove(42));
        assert!(!tree.remove(0));
        assert_eq!(tree.traverse(), before);
        assert_eq!(tree.len(), 10);
        assert_eq!(validate(&tree), Ok(()));

        let mut empty = BTree::new(2).expect("valid degree");
        assert!(!empty.remove(1));
    }

    #[test]
    fn test_remove_internal_key_uses_successor() {
        // Root [4] with children [2] and [6, 8]; the left child cannot spare
        // a key, so the successor 5 replaces 4.
        let mut tree = tree_with(2, 1..=10);
        assert!(tree.remove(4));

        let root = tree.root().expect("root");
        assert_eq!(tree.node_keys(root), Some(&[5][..]));
        assert_eq!(tree.traverse(), vec![1, 2, 3, 5, 6, 7, 8, 9, 10]);
        assert_eq!(validate(&tree), Ok(()));
    }

    #[test]
    fn test_remove_internal_key_uses_predecessor() {
        // Root [20] over [5, 6, 10] and [30]: the left child can spare a key,
        // so the predecessor 10 replaces 20.
        let mut tree = tree_with(2, [10, 20, 30, 5, 6]);
        assert!(tree.remove(20));

        let root = tree.root().expect("root");
        assert_eq!(tree.node_keys(root), Some(&[10][..]));
        assert_eq!(tree.traverse(), vec![5, 6, 10, 30]);
        assert_eq!(validate(&tree), Ok(()));
    }

    #[test]
    fn test_remove_merges_when_both_children_minimal() {
        // Root [2] over [1] and [3]: removing 2 merges everything into one leaf.
        let mut tree = tree_with(2, [1, 2, 3, 4]);
        assert!(tree.remove(4));
        assert_eq!(tree.height(), 2);

        assert!(tree.remove(2));
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.traverse(), vec![1, 3]);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(validate(&tree), Ok(()));
    }

    #[test]
    fn test_remove_borrows_from_siblings() {
        let mut tree = tree_with(2, 1..=10);

        // [2] borrows through the root from [6, 8], then [1] merges with [3].
        assert!(tree.remove(1));
        assert_eq!(validate(&tree), Ok(()));

        // [5] borrows from its left sibling [2, 3] after the root merges down.
        assert!(tree.remove(5));
        assert_eq!(validate(&tree), Ok(()));
        assert!(tree.remove(10));
        assert_eq!(validate(&tree), Ok(()));

        assert_eq!(tree.traverse(), vec![2, 3, 4, 6, 7, 8, 9]);
    }

    #[test]
    fn test_remove_everything_in_order() {
        let mut tree = tree_with(2, 1..=10);
        for key in 1..=10 {
            assert!(tree.remove(key), "remove {key}");
            assert_eq!(validate(&tree), Ok(()), "after removing {key}");
            assert_eq!(tree.search(key), None);
        }
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 0);
    }

    #[test]
    fn test_remove_everything_in_reverse() {
        let mut tree = tree_with(3, 1..=50);
        for key in (1..=50).rev() {
            assert!(tree.remove(key), "remove {key}");
            assert_eq!(validate(&tree), Ok(()), "after removing {key}");
        }
        assert!(tree.is_empty());
    }

    #[test]
    fn test_freed_slots_are_reused() {
        let mut tree = tree_with(2, 1..=10);
        let slots_before = tree.nodes.len();

        for key in 1..=10 {
            tree.remove(key);
        }
        for key in 1..=10 {
            tree.insert(key);
        }

        assert_eq!(tree.nodes.len(), slots_before);
        assert_eq!(validate(&tree), Ok(()));
    }

    #[test]
    fn test_display_lists_keys() {
        let tree = tree_with(3, [10, 20, 5, 6, 12, 30, 7, 17]);
        assert_eq!(tree.to_string(), "5 6 7 10 12 17 20 30");
    }

    #[test]
    fn test_clear() {
        let mut tree = tree_with(2, 1..=10);
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 0);
        assert!(tree.insert(7));
        assert_eq!(tree.traverse(), vec![7]);
    }

    #[test]
    fn test_extreme_keys() {
        let tree = tree_with(2, [Key::MIN, Key::MAX, 0, -1, 1]);
        assert_eq!(tree.traverse(), vec![Key::MIN, -1, 0, 1, Key::MAX]);
        assert_eq!(validate(&tree), Ok(()));
    }
}
