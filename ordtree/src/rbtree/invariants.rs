//! Colour, order and link checks for [`RbTree`].

use std::cmp::Ordering;
use std::fmt;

use super::node::{Color, NodeId};
use super::tree::RbTree;

/// The first broken Red-Black invariant found by [`RbTree::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RbViolation {
    /// The root is red.
    RedRoot { node: NodeId },
    /// A red node has a red child.
    RedRedEdge { parent: NodeId, child: NodeId },
    /// The two subtrees of a node have different black heights.
    BlackHeightMismatch {
        node: NodeId,
        left: usize,
        right: usize,
    },
    /// In-order neighbours are out of comparator order.
    OrderViolation { before: NodeId, after: NodeId },
    /// A child does not point back at the node that lists it.
    BrokenParentLink { node: NodeId },
    /// The node count differs from the recorded length.
    LenMismatch { counted: usize, recorded: usize },
}

impl fmt::Display for RbViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "INVALID: ")?;
        match self {
            Self::RedRoot { node } => write!(f, "root {node} is red"),
            Self::RedRedEdge { parent, child } => {
                write!(f, "red node {parent} has red child {child}")
            }
            Self::BlackHeightMismatch { node, left, right } => write!(
                f,
                "node {node} has black height {left} on the left and {right} on the right"
            ),
            Self::OrderViolation { before, after } => {
                write!(f, "node {before} sorts after its successor {after}")
            }
            Self::BrokenParentLink { node } => {
                write!(f, "node {node} does not link back to its parent")
            }
            Self::LenMismatch { counted, recorded } => {
                write!(f, "{counted} nodes reachable, length says {recorded}")
            }
        }
    }
}

impl std::error::Error for RbViolation {}

impl<P, C> RbTree<P, C>
where
    P: Copy + Eq,
    C: Fn(&P, &P) -> Ordering,
{
    /// Check every Red-Black invariant.
    ///
    /// Returns the black height (black nodes on any root-to-leaf path) of a
    /// valid tree; the empty tree has black height 0.
    pub fn validate(&self) -> Result<usize, RbViolation> {
        let Some(root) = self.root else {
            return match self.len {
                0 => Ok(0),
                recorded => Err(RbViolation::LenMismatch {
                    counted: 0,
                    recorded,
                }),
            };
        };

        if self.get(root).color == Color::Red {
            return Err(RbViolation::RedRoot { node: root });
        }

        let mut counted = 0;
        let height = self.check_subtree(root, None, &mut counted)?;
        if counted != self.len {
            return Err(RbViolation::LenMismatch {
                counted,
                recorded: self.len,
            });
        }

        self.check_order(root)?;
        Ok(height)
    }

    fn check_subtree(
        &self,
        id: NodeId,
        parent: Option<NodeId>,
        counted: &mut usize,
    ) -> Result<usize, RbViolation> {
        let node = self.get(id);
        *counted += 1;

        if node.parent != parent {
            return Err(RbViolation::BrokenParentLink { node: id });
        }
        if node.is_red() {
            for child in [node.left, node.right].into_iter().flatten() {
                if self.get(child).is_red() {
                    return Err(RbViolation::RedRedEdge { parent: id, child });
                }
            }
        }

        let left = match node.left {
            Some(left) => self.check_subtree(left, Some(id), counted)?,
            None => 0,
        };
        let right = match node.right {
            Some(right) => self.check_subtree(right, Some(id), counted)?,
            None => 0,
        };
        if left != right {
            return Err(RbViolation::BlackHeightMismatch {
                node: id,
                left,
                right,
            });
        }

        Ok(left + usize::from(node.color == Color::Black))
    }

    /// Walk in order and compare neighbours.
    fn check_order(&self, root: NodeId) -> Result<(), RbViolation> {
        let mut stack = Vec::new();
        let mut cursor = Some(root);
        let mut previous: Option<NodeId> = None;

        while cursor.is_some() || !stack.is_empty() {
            while let Some(id) = cursor {
                stack.push(id);
                cursor = self.get(id).left;
            }
            let Some(id) = stack.pop() else {
                break;
            };
            if let Some(before) = previous {
                let order = (self.cmp)(&self.get(before).payload, &self.get(id).payload);
                if order == Ordering::Greater {
                    return Err(RbViolation::OrderViolation { before, after: id });
                }
            }
            previous = Some(id);
            cursor = self.get(id).right;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rbtree::node::Node;

    fn tree_of(values: &[i32]) -> RbTree<i32, impl Fn(&i32, &i32) -> Ordering> {
        let mut tree = RbTree::new(|a: &i32, b: &i32| a.cmp(b));
        for &value in values {
            tree.insert(value);
        }
        tree
    }

    /// Root 20(B) with children 10(B) and 40(R); 40 has 30(B) and 50(B);
    /// 30 has a red left child 25.
    fn sample() -> RbTree<i32, impl Fn(&i32, &i32) -> Ordering> {
        tree_of(&[10, 20, 30, 40, 50, 25])
    }

    fn id_of<C>(tree: &RbTree<i32, C>, value: i32) -> NodeId
    where
        C: Fn(&i32, &i32) -> Ordering,
    {
        let index = tree
            .nodes
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|node| node.payload == value))
            .expect("value present");
        NodeId::from_index(index)
    }

    fn node_mut<C>(tree: &mut RbTree<i32, C>, value: i32) -> &mut Node<i32>
    where
        C: Fn(&i32, &i32) -> Ordering,
    {
        let id = id_of(tree, value);
        tree.nodes[id.index()].as_mut().expect("live node")
    }

    #[test]
    fn test_sample_is_valid() {
        let tree = sample();
        assert_eq!(tree.validate(), Ok(2));
        assert_eq!(tree.iter().collect::<Vec<_>>(), vec![10, 20, 25, 30, 40, 50]);
    }

    #[test]
    fn test_empty_is_valid() {
        assert_eq!(tree_of(&[]).validate(), Ok(0));
    }

    #[test]
    fn test_red_root() {
        let mut tree = sample();
        node_mut(&mut tree, 20).color = Color::Red;
        assert!(matches!(tree.validate(), Err(RbViolation::RedRoot { .. })));
    }

    #[test]
    fn test_red_red_edge() {
        let mut tree = sample();
        node_mut(&mut tree, 30).color = Color::Red;
        let parent = id_of(&tree, 40);
        let child = id_of(&tree, 30);
        assert_eq!(
            tree.validate(),
            Err(RbViolation::RedRedEdge { parent, child })
        );
    }

    #[test]
    fn test_black_height_mismatch() {
        let mut tree = sample();
        node_mut(&mut tree, 10).color = Color::Red;
        assert_eq!(
            tree.validate(),
            Err(RbViolation::BlackHeightMismatch {
                node: id_of(&tree, 20),
                left: 0,
                right: 1,
            })
        );
    }

    #[test]
    fn test_order_violation() {
        let mut tree = sample();
        node_mut(&mut tree, 25).payload = 35;
        assert!(matches!(
            tree.validate(),
            Err(RbViolation::OrderViolation { .. })
        ));
    }

    #[test]
    fn test_broken_parent_link() {
        let mut tree = sample();
        let root = id_of(&tree, 20);
        node_mut(&mut tree, 50).parent = Some(root);
        assert_eq!(
            tree.validate(),
            Err(RbViolation::BrokenParentLink {
                node: id_of(&tree, 50)
            })
        );
    }

    #[test]
    fn test_len_mismatch() {
        let mut tree = sample();
        tree.len = 7;
        assert_eq!(
            tree.validate(),
            Err(RbViolation::LenMismatch {
                counted: 6,
                recorded: 7
            })
        );
    }

    #[test]
    fn test_violation_text() {
        let violation = RbViolation::LenMismatch {
            counted: 1,
            recorded: 2,
        };
        assert_eq!(
            violation.to_string(),
            "INVALID: 1 nodes reachable, length says 2"
        );
    }
}
