//! Path-expression resolution.
//!
//! Transitions address their target with a small path grammar borrowed from
//! filesystem paths: `/` roots the walk, `.` stays put, `..` climbs to the
//! parent, and any other segment selects a child by id. Whatever node the
//! walk lands on, the effective target is its first leaf.

use thiserror::Error;

use crate::core::tree::{NodeId, StateTree};

/// Sentinel expression selecting the next state in document order.
///
/// Resolution walks up from the current leaf until an ancestor (or the leaf
/// itself) has a next sibling, then descends to that sibling's first leaf.
/// From the very last leaf of the tree it resolves to the current leaf
/// unchanged: a no-op transition, not an error.
pub const NEXT_STATE: &str = "NEXTSTATE";

/// A path expression that does not name a node.
///
/// Always recoverable: the machine aborts the pending transition, leaves the
/// tree untouched, and logs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    /// A segment named a child that does not exist under the node reached so
    /// far.
    #[error("no child '{segment}' under '{at}'")]
    ChildNotFound {
        /// The offending segment.
        segment: String,
        /// Canonical path of the node the walk had reached.
        at: String,
    },

    /// `..` was applied to the root.
    #[error("'..' walks above the root (reached from '{at}')")]
    AboveRoot {
        /// Canonical path of the expression's starting node.
        at: String,
    },

    /// An interior segment was empty, as in `a//b`.
    #[error("empty segment in path expression")]
    EmptySegment,
}

/// Resolve `expr` against `from`, the current leaf.
///
/// A leading `/` starts the walk at the root, otherwise it starts at `from`.
/// One empty trailing segment is tolerated (`a/b/` equals `a/b`). The landing
/// node is passed through [`StateTree::first_leaf`], so resolving to a
/// composite auto-descends.
///
/// # Example
///
/// ```rust
/// use statepath::core::{resolve, NoopBehavior, StateTree};
///
/// let mut tree = StateTree::new();
/// let root = tree.root();
/// let a = tree.add_child(root, "A", "", NoopBehavior)?;
/// let a1 = tree.add_child(a, "A1", "", NoopBehavior)?;
/// let b = tree.add_child(root, "B", "", NoopBehavior)?;
///
/// // Absolute path to a composite descends to its first leaf.
/// assert_eq!(resolve(&tree, b, "/A"), Ok(a1));
/// // Relative walk from a leaf.
/// assert_eq!(resolve(&tree, a1, "../../B"), Ok(b));
/// # Ok::<(), statepath::core::TreeError>(())
/// ```
pub fn resolve(tree: &StateTree, from: NodeId, expr: &str) -> Result<NodeId, PathError> {
    if expr == NEXT_STATE {
        return Ok(resolve_next_state(tree, from));
    }

    let (mut node, rest) = match expr.strip_prefix('/') {
        Some(rest) => (tree.root(), rest),
        None => (from, expr),
    };

    let mut segments: Vec<&str> = rest.split('/').collect();
    if segments.last() == Some(&"") {
        segments.pop();
    }

    for segment in segments {
        match segment {
            "" => return Err(PathError::EmptySegment),
            "." => {}
            ".." => {
                node = tree.node(node).parent().ok_or_else(|| PathError::AboveRoot {
                    at: tree.canonical_path(from),
                })?;
            }
            id => {
                node = tree
                    .child_by_id(node, id)
                    .ok_or_else(|| PathError::ChildNotFound {
                        segment: id.to_string(),
                        at: tree.canonical_path(node),
                    })?;
            }
        }
    }

    Ok(tree.first_leaf(node))
}

/// The [`NEXT_STATE`] walk: first next sibling found on the way up, else the
/// starting leaf itself.
fn resolve_next_state(tree: &StateTree, from: NodeId) -> NodeId {
    let mut node = from;
    loop {
        let Some(parent) = tree.node(node).parent() else {
            // Reached the root without finding a next sibling anywhere.
            return from;
        };
        match tree.child_by_index(parent, tree.node(node).index() + 1) {
            Some(sibling) => return tree.first_leaf(sibling),
            None => node = parent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::behavior::NoopBehavior;

    /// root { A { A1, A2 }, B { B1 } }
    struct Fixture {
        tree: StateTree,
        a: NodeId,
        a1: NodeId,
        a2: NodeId,
        b: NodeId,
        b1: NodeId,
    }

    fn fixture() -> Fixture {
        let mut tree = StateTree::new();
        let root = tree.root();
        let a = tree.add_child(root, "A", "", NoopBehavior).unwrap();
        let a1 = tree.add_child(a, "A1", "", NoopBehavior).unwrap();
        let a2 = tree.add_child(a, "A2", "", NoopBehavior).unwrap();
        let b = tree.add_child(root, "B", "", NoopBehavior).unwrap();
        let b1 = tree.add_child(b, "B1", "", NoopBehavior).unwrap();
        Fixture {
            tree,
            a,
            a1,
            a2,
            b,
            b1,
        }
    }

    #[test]
    fn absolute_path_starts_at_root() {
        let f = fixture();
        assert_eq!(resolve(&f.tree, f.b1, "/A/A2"), Ok(f.a2));
    }

    #[test]
    fn relative_path_starts_at_current_leaf() {
        let f = fixture();
        assert_eq!(resolve(&f.tree, f.a1, "../A2"), Ok(f.a2));
    }

    #[test]
    fn composite_target_descends_to_first_leaf() {
        let f = fixture();
        assert_eq!(resolve(&f.tree, f.b1, "/A"), Ok(f.a1));
        assert_eq!(resolve(&f.tree, f.a2, "/B"), Ok(f.b1));
        assert_eq!(f.tree.first_leaf(f.b), f.b1);
    }

    #[test]
    fn dot_segment_is_a_no_op() {
        let f = fixture();
        assert_eq!(resolve(&f.tree, f.b1, "/A/./A2"), Ok(f.a2));
        assert_eq!(resolve(&f.tree, f.a1, "."), Ok(f.a1));
    }

    #[test]
    fn trailing_slash_is_ignored() {
        let f = fixture();
        assert_eq!(resolve(&f.tree, f.b1, "/A/A2/"), Ok(f.a2));
    }

    #[test]
    fn root_path_resolves_to_first_leaf() {
        let f = fixture();
        assert_eq!(resolve(&f.tree, f.b1, "/"), Ok(f.a1));
    }

    #[test]
    fn empty_relative_path_stays_on_current_leaf() {
        let f = fixture();
        assert_eq!(resolve(&f.tree, f.b1, ""), Ok(f.b1));
    }

    #[test]
    fn interior_empty_segment_fails() {
        let f = fixture();
        assert_eq!(resolve(&f.tree, f.b1, "/A//A2"), Err(PathError::EmptySegment));
    }

    #[test]
    fn unknown_segment_fails_with_location() {
        let f = fixture();
        assert_eq!(
            resolve(&f.tree, f.b1, "/A/A3"),
            Err(PathError::ChildNotFound {
                segment: "A3".to_string(),
                at: "/A".to_string(),
            })
        );
    }

    #[test]
    fn parent_of_root_fails() {
        let f = fixture();
        let root = f.tree.root();
        let from_root_first_leaf = f.tree.first_leaf(root);
        assert_eq!(
            resolve(&f.tree, from_root_first_leaf, "/.."),
            Err(PathError::AboveRoot {
                at: "/A/A1".to_string(),
            })
        );
        assert_eq!(resolve(&f.tree, f.a1, "../../.."), Err(PathError::AboveRoot {
            at: "/A/A1".to_string(),
        }));
    }

    #[test]
    fn next_state_moves_to_next_sibling() {
        let f = fixture();
        assert_eq!(resolve(&f.tree, f.a1, NEXT_STATE), Ok(f.a2));
    }

    #[test]
    fn next_state_ascends_to_parents_next_sibling() {
        let f = fixture();
        // A2 is A's last child; the walk climbs to A, whose next sibling is
        // B, then descends to B1.
        assert_eq!(resolve(&f.tree, f.a2, NEXT_STATE), Ok(f.b1));
    }

    #[test]
    fn next_state_saturates_at_last_leaf() {
        let f = fixture();
        assert_eq!(resolve(&f.tree, f.b1, NEXT_STATE), Ok(f.b1));
    }

    #[test]
    fn next_state_descends_into_composite_sibling() {
        let mut tree = StateTree::new();
        let root = tree.root();
        let x = tree.add_child(root, "X", "", NoopBehavior).unwrap();
        let y = tree.add_child(root, "Y", "", NoopBehavior).unwrap();
        let y1 = tree.add_child(y, "Y1", "", NoopBehavior).unwrap();
        let y1a = tree.add_child(y1, "Y1a", "", NoopBehavior).unwrap();

        assert_eq!(resolve(&tree, x, NEXT_STATE), Ok(y1a));
    }

    #[test]
    fn next_state_on_single_leaf_tree_is_identity() {
        let mut tree = StateTree::new();
        let root = tree.root();
        let only = tree.add_child(root, "only", "", NoopBehavior).unwrap();

        assert_eq!(resolve(&tree, only, NEXT_STATE), Ok(only));
    }

    #[test]
    fn error_messages_name_the_failure() {
        let err = PathError::ChildNotFound {
            segment: "A3".to_string(),
            at: "/A".to_string(),
        };
        assert_eq!(err.to_string(), "no child 'A3' under '/A'");
    }

    #[test]
    fn deep_relative_walk_combines_segments() {
        let f = fixture();
        assert_eq!(resolve(&f.tree, f.a2, "../../B/B1"), Ok(f.b1));
        assert_eq!(resolve(&f.tree, f.a2, "./../A1"), Ok(f.a1));
    }

    #[test]
    fn resolving_from_a_leaf_keeps_identity_under_first_leaf() {
        let f = fixture();
        for leaf in [f.a1, f.a2, f.b1] {
            let path = f.tree.canonical_path(leaf);
            assert_eq!(resolve(&f.tree, f.b1, &path), Ok(leaf));
        }
        // A composite's canonical path resolves to its first leaf.
        let composite_path = f.tree.canonical_path(f.a);
        assert_eq!(resolve(&f.tree, f.b1, &composite_path), Ok(f.a1));
    }
}
