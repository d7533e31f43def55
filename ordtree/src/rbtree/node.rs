//! Red-Black tree node storage.

use std::fmt;

/// Node colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

/// Child side, used to write each rotation and fix-up case once for both
/// mirror images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Dir {
    Left,
    Right,
}

impl Dir {
    pub(super) const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Handle to a node slot in the tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub(super) fn from_index(index: usize) -> Self {
        let Ok(raw) = u32::try_from(index) else {
            panic!("node arena exceeded {} slots", u32::MAX);
        };
        Self(raw)
    }

    pub(super) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A tree node. `parent` is a back-reference; the children links own.
#[derive(Debug, Clone)]
pub(super) struct Node<P> {
    pub(super) payload: P,
    pub(super) color: Color,
    pub(super) parent: Option<NodeId>,
    pub(super) left: Option<NodeId>,
    pub(super) right: Option<NodeId>,
}

impl<P> Node<P> {
    /// A detached red node.
    pub(super) const fn new(payload: P) -> Self {
        Self {
            payload,
            color: Color::Red,
            parent: None,
            left: None,
            right: None,
        }
    }

    pub(super) const fn child(&self, dir: Dir) -> Option<NodeId> {
        match dir {
            Dir::Left => self.left,
            Dir::Right => self.right,
        }
    }

    pub(super) const fn set_child(&mut self, dir: Dir, child: Option<NodeId>) {
        match dir {
            Dir::Left => self.left = child,
            Dir::Right => self.right = child,
        }
    }

    pub(super) fn is_red(&self) -> bool {
        self.color == Color::Red
    }
}

/// Reference payload compared by address rather than by value.
///
/// Lets a tree hold references to caller-owned records while deleting by
/// identity: two `ById` are equal only if they point at the same record.
#[derive(Debug)]
pub struct ById<'a, T>(pub &'a T);

impl<T> ById<'_, T> {
    /// The referenced record.
    #[must_use]
    pub const fn get(&self) -> &T {
        self.0
    }
}

impl<T> Clone for ById<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ById<'_, T> {}

impl<T> PartialEq for ById<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.0, other.0)
    }
}

impl<T> Eq for ById<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dir_opposite() {
        assert_eq!(Dir::Left.opposite(), Dir::Right);
        assert_eq!(Dir::Right.opposite(), Dir::Left);
    }

    #[test]
    fn test_child_by_dir() {
        let mut node = Node::new(1);
        node.set_child(Dir::Right, Some(NodeId::from_index(3)));
        assert_eq!(node.child(Dir::Left), None);
        assert_eq!(node.child(Dir::Right), Some(NodeId::from_index(3)));
        assert!(node.is_red());
    }

    #[test]
    fn test_by_id_compares_addresses() {
        let a = String::from("same");
        let b = String::from("same");

        assert_eq!(ById(&a), ById(&a));
        assert_ne!(ById(&a), ById(&b));
        assert_eq!(ById(&b).get(), "same");
    }
}
