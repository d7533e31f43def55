//! Red-Black tree over caller-owned payload handles.
//!
//! The tree never inspects a payload except through its comparator, and
//! deletes by identity: [`RbTree::delete`] removes the node whose payload is
//! `==` to the argument, even when other payloads compare equal to it.

use std::cmp::Ordering;
use std::fmt;

use super::node::{Color, Dir, Node, NodeId};

/// Red-Black tree ordered by a caller-supplied comparator.
///
/// Payloads compare equal under the comparator may coexist; an insert places
/// a new payload after the ones it ties with.
pub struct RbTree<P, C> {
    pub(super) nodes: Vec<Option<Node<P>>>,
    pub(super) free: Vec<NodeId>,
    pub(super) root: Option<NodeId>,
    pub(super) len: usize,
    pub(super) cmp: C,
}

impl<P, C> RbTree<P, C>
where
    P: Copy + Eq,
    C: Fn(&P, &P) -> Ordering,
{
    /// Create an empty tree ordered by `cmp`.
    #[must_use]
    pub const fn new(cmp: C) -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
            len: 0,
            cmp,
        }
    }

    /// Number of payloads stored.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Whether a node holding exactly `payload` is present.
    #[must_use]
    pub fn contains(&self, payload: &P) -> bool {
        self.find(self.root, payload).is_some()
    }

    /// The leftmost payload, i.e. the least under the comparator.
    #[must_use]
    pub fn min(&self) -> Option<P> {
        self.root.map(|root| self.get(self.leftmost(root)).payload)
    }

    /// The payload stored at the root.
    #[must_use]
    pub fn root(&self) -> Option<P> {
        self.root.map(|root| self.get(root).payload)
    }

    /// Payloads in comparator order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, P, C> {
        Iter {
            tree: self,
            next: self.root.map(|root| self.leftmost(root)),
            remaining: self.len,
        }
    }

    /// Remove every payload.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.root = None;
        self.len = 0;
    }

    /// Insert `payload`.
    pub fn insert(&mut self, payload: P) {
        let mut parent = None;
        let mut side = Dir::Left;
        let mut cursor = self.root;
        while let Some(id) = cursor {
            parent = Some(id);
            let node = self.get(id);
            side = if (self.cmp)(&payload, &node.payload) == Ordering::Less {
                Dir::Left
            } else {
                Dir::Right
            };
            cursor = node.child(side);
        }

        let mut node = Node::new(payload);
        node.parent = parent;
        let id = self.allocate(node);
        match parent {
            None => self.root = Some(id),
            Some(parent) => self.get_mut(parent).set_child(side, Some(id)),
        }
        self.len += 1;

        self.insert_fixup(id);
    }

    /// Remove the node holding exactly `payload`.
    ///
    /// Returns `false` and leaves the tree untouched if no such node exists.
    pub fn delete(&mut self, payload: &P) -> bool {
        let Some(z) = self.find(self.root, payload) else {
            return false;
        };

        let (z_left, z_right, z_parent, z_color) = {
            let node = self.get(z);
            (node.left, node.right, node.parent, node.color)
        };

        let (x, x_parent, removed_color) = match (z_left, z_right) {
            (None, _) => {
                self.transplant(z, z_right);
                (z_right, z_parent, z_color)
            }
            (Some(_), None) => {
                self.transplant(z, z_left);
                (z_left, z_parent, z_color)
            }
            (Some(left), Some(right)) => {
                // Splice out the successor and move it into z's place.
                let y = self.leftmost(right);
                let (y_right, y_parent, y_color) = {
                    let node = self.get(y);
                    (node.right, node.parent, node.color)
                };
                let x_parent = if y_parent == Some(z) {
                    Some(y)
                } else {
                    self.transplant(y, y_right);
                    self.get_mut(y).right = Some(right);
                    self.get_mut(right).parent = Some(y);
                    y_parent
                };
                self.transplant(z, Some(y));
                let node = self.get_mut(y);
                node.left = Some(left);
                node.color = z_color;
                self.get_mut(left).parent = Some(y);
                (y_right, x_parent, y_color)
            }
        };

        self.release(z);
        self.len -= 1;

        if removed_color == Color::Black {
            self.delete_fixup(x, x_parent);
        }
        true
    }

    fn insert_fixup(&mut self, mut z: NodeId) {
        while let Some(parent) = self.get(z).parent {
            if !self.get(parent).is_red() {
                break;
            }
            // A red parent is never the root, so the grandparent exists.
            let Some(grand) = self.get(parent).parent else {
                break;
            };
            let side = self.side_of(grand, parent);
            let uncle = self.get(grand).child(side.opposite());

            if self.is_red(uncle) {
                self.set_color(parent, Color::Black);
                if let Some(uncle) = uncle {
                    self.set_color(uncle, Color::Black);
                }
                self.set_color(grand, Color::Red);
                z = grand;
                continue;
            }

            let mut parent = parent;
            if self.get(parent).child(side.opposite()) == Some(z) {
                // Inner child: rotate it outward so it becomes the parent.
                let inner = z;
                z = parent;
                self.rotate(z, side);
                parent = inner;
            }
            self.set_color(parent, Color::Black);
            self.set_color(grand, Color::Red);
            self.rotate(grand, side.opposite());
        }

        if let Some(root) = self.root {
            self.set_color(root, Color::Black);
        }
    }

    /// Restore the colour invariants after a black node was spliced out.
    ///
    /// `x` carries the extra black and may be absent, so its parent is passed
    /// alongside it instead of being read from `x`.
    fn delete_fixup(&mut self, mut x: Option<NodeId>, mut parent: Option<NodeId>) {
        while x != self.root && !self.is_red(x) {
            let Some(p) = parent else {
                break;
            };
            let side = if self.get(p).left == x {
                Dir::Left
            } else {
                Dir::Right
            };
            let far = side.opposite();

            let Some(mut w) = self.get(p).child(far) else {
                break;
            };
            if self.get(w).is_red() {
                self.set_color(w, Color::Black);
                self.set_color(p, Color::Red);
                self.rotate(p, side);
                let Some(sibling) = self.get(p).child(far) else {
                    break;
                };
                w = sibling;
            }

            let near_child = self.get(w).child(side);
            let far_child = self.get(w).child(far);
            if !self.is_red(near_child) && !self.is_red(far_child) {
                self.set_color(w, Color::Red);
                x = Some(p);
                parent = self.get(p).parent;
                continue;
            }

            if !self.is_red(far_child) {
                if let Some(near) = near_child {
                    self.set_color(near, Color::Black);
                }
                self.set_color(w, Color::Red);
                self.rotate(w, far);
                let Some(sibling) = self.get(p).child(far) else {
                    break;
                };
                w = sibling;
            }

            let parent_color = self.get(p).color;
            self.set_color(w, parent_color);
            self.set_color(p, Color::Black);
            if let Some(far_child) = self.get(w).child(far) {
                self.set_color(far_child, Color::Black);
            }
            self.rotate(p, side);
            x = self.root;
            parent = None;
        }

        if let Some(x) = x {
            self.set_color(x, Color::Black);
        }
    }

    /// Rotate around `x`, lifting its child on the `dir.opposite()` side.
    ///
    /// `rotate(x, Dir::Left)` is the classic left rotation.
    fn rotate(&mut self, x: NodeId, dir: Dir) {
        let lift = dir.opposite();
        let Some(y) = self.get(x).child(lift) else {
            return;
        };
        tracing::trace!(pivot = %x, ?dir, "rotate");

        let inner = self.get(y).child(dir);
        self.get_mut(x).set_child(lift, inner);
        if let Some(inner) = inner {
            self.get_mut(inner).parent = Some(x);
        }

        let x_parent = self.get(x).parent;
        self.get_mut(y).parent = x_parent;
        self.replace_child(x_parent, x, Some(y));

        self.get_mut(y).set_child(dir, Some(x));
        self.get_mut(x).parent = Some(y);
    }

    /// Put `v` where `u` hangs from its parent.
    fn transplant(&mut self, u: NodeId, v: Option<NodeId>) {
        let parent = self.get(u).parent;
        self.replace_child(parent, u, v);
        if let Some(v) = v {
            self.get_mut(v).parent = parent;
        }
    }

    fn replace_child(&mut self, parent: Option<NodeId>, old: NodeId, new: Option<NodeId>) {
        match parent {
            None => self.root = new,
            Some(parent) => {
                let side = self.side_of(parent, old);
                self.get_mut(parent).set_child(side, new);
            }
        }
    }

    /// Which side of `parent` the node `child` hangs on.
    fn side_of(&self, parent: NodeId, child: NodeId) -> Dir {
        if self.get(parent).left == Some(child) {
            Dir::Left
        } else {
            Dir::Right
        }
    }

    /// Locate the node whose payload is identical to `payload`.
    ///
    /// Descends by the comparator. Ties can sit on either side of a node
    /// after rotations, so both subtrees are searched below a tie.
    fn find(&self, mut cursor: Option<NodeId>, payload: &P) -> Option<NodeId> {
        while let Some(id) = cursor {
            let node = self.get(id);
            if node.payload == *payload {
                return Some(id);
            }
            match (self.cmp)(payload, &node.payload) {
                Ordering::Less => cursor = node.left,
                Ordering::Greater => cursor = node.right,
                Ordering::Equal => {
                    return self
                        .find(node.left, payload)
                        .or_else(|| self.find(node.right, payload));
                }
            }
        }
        None
    }

    pub(super) fn leftmost(&self, mut id: NodeId) -> NodeId {
        while let Some(left) = self.get(id).left {
            id = left;
        }
        id
    }

    fn successor(&self, id: NodeId) -> Option<NodeId> {
        if let Some(right) = self.get(id).right {
            return Some(self.leftmost(right));
        }
        let mut child = id;
        let mut parent = self.get(id).parent;
        while let Some(p) = parent {
            if self.get(p).left == Some(child) {
                return Some(p);
            }
            child = p;
            parent = self.get(p).parent;
        }
        None
    }

    pub(super) fn is_red(&self, id: Option<NodeId>) -> bool {
        id.is_some_and(|id| self.get(id).is_red())
    }

    fn set_color(&mut self, id: NodeId, color: Color) {
        self.get_mut(id).color = color;
    }

    fn allocate(&mut self, node: Node<P>) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.nodes[id.index()] = Some(node);
            id
        } else {
            let id = NodeId::from_index(self.nodes.len());
            self.nodes.push(Some(node));
            id
        }
    }

    fn release(&mut self, id: NodeId) {
        self.nodes[id.index()] = None;
        self.free.push(id);
    }

    pub(super) fn get(&self, id: NodeId) -> &Node<P> {
        match self.nodes.get(id.index()) {
            Some(Some(node)) => node,
            _ => panic!("dangling red-black node handle {id}"),
        }
    }

    fn get_mut(&mut self, id: NodeId) -> &mut Node<P> {
        match self.nodes.get_mut(id.index()) {
            Some(Some(node)) => node,
            _ => panic!("dangling red-black node handle {id}"),
        }
    }
}

impl<P: fmt::Debug, C> fmt::Debug for RbTree<P, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RbTree")
            .field("len", &self.len)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

/// In-order iterator over an [`RbTree`], following parent links.
pub struct Iter<'a, P, C> {
    tree: &'a RbTree<P, C>,
    next: Option<NodeId>,
    remaining: usize,
}

impl<P, C> Iterator for Iter<'_, P, C>
where
    P: Copy + Eq,
    C: Fn(&P, &P) -> Ordering,
{
    type Item = P;

    fn next(&mut self) -> Option<P> {
        let id = self.next?;
        self.next = self.tree.successor(id);
        self.remaining -= 1;
        Some(self.tree.get(id).payload)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<P, C> ExactSizeIterator for Iter<'_, P, C>
where
    P: Copy + Eq,
    C: Fn(&P, &P) -> Ordering,
{
}

impl<'a, P, C> IntoIterator for &'a RbTree<P, C>
where
    P: Copy + Eq,
    C: Fn(&P, &P) -> Ordering,
{
    type Item = P;
    type IntoIter = Iter<'a, P, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;

    use super::*;
    use crate::rbtree::ById;

    fn ascending(a: &i32, b: &i32) -> Ordering {
        a.cmp(b)
    }

    fn by_rank(a: &ById<'_, (i32, char)>, b: &ById<'_, (i32, char)>) -> Ordering {
        a.get().0.cmp(&b.get().0)
    }

    fn tree_of(values: &[i32]) -> RbTree<i32, fn(&i32, &i32) -> Ordering> {
        let mut tree = RbTree::new(ascending as fn(&i32, &i32) -> Ordering);
        for &value in values {
            tree.insert(value);
            tree.validate().expect("valid after insert");
        }
        tree
    }

    #[test]
    fn test_empty_tree() {
        let tree = tree_of(&[]);
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.min(), None);
        assert_eq!(tree.iter().count(), 0);
    }

    #[test]
    fn test_single_insert_is_black_root() {
        let tree = tree_of(&[7]);
        let root = tree.root.expect("root");
        assert_eq!(tree.get(root).color, Color::Black);
        assert_eq!(tree.min(), Some(7));
    }

    #[test]
    fn test_insert_keeps_order() {
        let tree = tree_of(&[10, 20, 30, 40, 50, 25]);
        assert_eq!(tree.iter().collect::<Vec<_>>(), vec![10, 20, 25, 30, 40, 50]);
        assert_eq!(tree.len(), 6);
        assert_eq!(tree.validate(), Ok(2));
    }

    #[test]
    fn test_ascending_inserts_rotate() {
        let tree = tree_of(&[1, 2, 3]);
        let root = tree.root.expect("root");
        assert_eq!(tree.get(root).payload, 2);
        assert_eq!(tree.get(root).color, Color::Black);
    }

    #[test]
    fn test_delete_absent_is_noop() {
        let mut tree = tree_of(&[1, 2, 3]);
        assert!(!tree.delete(&9));
        assert_eq!(tree.len(), 3);
        tree.validate().expect("still valid");
    }

    #[test]
    fn test_delete_leaf_internal_and_root() {
        let mut tree = tree_of(&[10, 20, 30, 40, 50, 25]);

        assert!(tree.delete(&50));
        tree.validate().expect("valid after leaf delete");
        assert!(tree.delete(&20));
        tree.validate().expect("valid after internal delete");

        let root = tree.get(tree.root.expect("root")).payload;
        assert!(tree.delete(&root));
        tree.validate().expect("valid after root delete");

        let rest: Vec<_> = tree.iter().collect();
        assert_eq!(rest.len(), 3);
        assert!(rest.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_delete_black_leaf_without_children_rebalances() {
        // After 4 goes, deleting 1 removes a black leaf with no children,
        // leaving the extra black on an absent node.
        let mut tree = tree_of(&[2, 1, 3, 4]);
        assert!(tree.delete(&4));
        tree.validate().expect("valid");
        assert!(tree.delete(&1));
        assert_eq!(tree.validate(), Ok(1));
        assert_eq!(tree.iter().collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn test_random_workload_stays_valid() {
        let mut rng = StdRng::seed_from_u64(17);
        let mut values: Vec<i32> = (0..300).collect();
        values.shuffle(&mut rng);
        let mut tree = tree_of(&values);

        values.shuffle(&mut rng);
        for (i, value) in values.iter().enumerate() {
            assert!(tree.delete(value));
            tree.validate().expect("valid after delete");
            assert_eq!(tree.len(), values.len() - i - 1);
            assert!(!tree.contains(value));
        }
        assert!(tree.is_empty());
    }

    #[test]
    fn test_slots_are_reused() {
        let mut tree = tree_of(&[1, 2, 3]);
        assert!(tree.delete(&2));
        tree.insert(4);
        assert_eq!(tree.nodes.len(), 3);
        tree.validate().expect("valid");
    }

    #[test]
    fn test_ties_delete_by_identity() {
        let records = [(5, 'a'), (5, 'b'), (5, 'c'), (5, 'd'), (3, 'e'), (8, 'f')];
        let mut tree = RbTree::new(by_rank);
        for record in &records {
            tree.insert(ById(record));
        }
        tree.validate().expect("valid");

        assert!(tree.delete(&ById(&records[2])));
        assert!(!tree.contains(&ById(&records[2])));
        for (i, record) in records.iter().enumerate() {
            assert_eq!(tree.contains(&ById(record)), i != 2);
        }

        let copy = (5, 'a');
        assert!(!tree.delete(&ById(&copy)));
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let records = [(1, 'x'), (1, 'y'), (1, 'z')];
        let mut tree = RbTree::new(by_rank);
        for record in &records {
            tree.insert(ById(record));
        }
        let order: Vec<char> = tree.iter().map(|r| r.get().1).collect();
        assert_eq!(order, vec!['x', 'y', 'z']);
    }

    #[test]
    fn test_clear() {
        let mut tree = tree_of(&[3, 1, 2]);
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.min(), None);
        tree.insert(5);
        assert_eq!(tree.min(), Some(5));
    }

    #[test]
    fn test_descending_comparator() {
        let mut tree = RbTree::new(|a: &i32, b: &i32| b.cmp(a));
        for value in [3, 9, 1, 7] {
            tree.insert(value);
        }
        assert_eq!(tree.min(), Some(9));
        assert_eq!((&tree).into_iter().collect::<Vec<_>>(), vec![9, 7, 3, 1]);
    }
}
