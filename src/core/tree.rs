//! The state tree: an arena of named nodes with parent back-references.
//!
//! The tree exclusively owns its nodes top-down. Parent links are plain
//! [`NodeId`] back-pointers used for path walks, never for ownership.
//! Construction is append-only: nodes are attached once and never detached.

use std::collections::HashMap;

use thiserror::Error;

use crate::core::behavior::{NoopBehavior, StateBehavior};

/// Handle to a node inside a [`StateTree`] arena.
///
/// Ids are only meaningful for the tree that issued them; indexing a
/// different tree with a foreign id is a logic error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Errors raised while wiring a state tree.
///
/// These are programmer errors: construction code is expected to propagate
/// them with `?` and fail fast rather than recover.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    /// Two siblings were registered with the same id.
    #[error("duplicate child id '{id}' under '{parent}'")]
    DuplicateChildId {
        /// Canonical path of the parent node.
        parent: String,
        /// The id that was already taken.
        id: String,
    },
}

/// A single state: identity, ordering, payload, and behavior.
pub struct StateNode {
    id: String,
    label: String,
    parent: Option<NodeId>,
    index: usize,
    children: Vec<NodeId>,
    children_by_id: HashMap<String, NodeId>,
    behavior: Box<dyn StateBehavior>,
}

impl StateNode {
    /// The node's id, unique among its siblings.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Opaque payload attached at construction time.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Back-reference to the parent, `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Position among the parent's children (0 for the root).
    pub fn index(&self) -> usize {
        self.index
    }

    /// Child handles in insertion order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Whether the node has no children, i.e. can be current.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub(crate) fn behavior_mut(&mut self) -> &mut dyn StateBehavior {
        self.behavior.as_mut()
    }
}

/// Arena-backed tree of states.
///
/// # Example
///
/// ```rust
/// use statepath::core::{NoopBehavior, StateTree};
///
/// let mut tree = StateTree::new();
/// let root = tree.root();
/// let menu = tree.add_child(root, "menu", "Main menu", NoopBehavior)?;
/// let idle = tree.add_child(menu, "idle", "Waiting", NoopBehavior)?;
///
/// assert_eq!(tree.canonical_path(idle), "/menu/idle");
/// assert_eq!(tree.first_leaf(root), idle);
/// # Ok::<(), statepath::core::TreeError>(())
/// ```
pub struct StateTree {
    nodes: Vec<StateNode>,
}

impl Default for StateTree {
    fn default() -> Self {
        Self::new()
    }
}

impl StateTree {
    /// Create a tree whose root has no behavior overrides.
    pub fn new() -> Self {
        Self::with_root(NoopBehavior)
    }

    /// Create a tree with an explicit root behavior.
    ///
    /// The root's hooks run on machine start and stop, bracketing the whole
    /// session.
    pub fn with_root(behavior: impl StateBehavior + 'static) -> Self {
        Self {
            nodes: vec![StateNode {
                id: String::new(),
                label: String::new(),
                parent: None,
                index: 0,
                children: Vec::new(),
                children_by_id: HashMap::new(),
                behavior: Box::new(behavior),
            }],
        }
    }

    /// Handle of the root node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a tree has at least its root.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Borrow a node.
    pub fn node(&self, id: NodeId) -> &StateNode {
        &self.nodes[id.0]
    }

    /// Mutably borrow a node.
    pub fn node_mut(&mut self, id: NodeId) -> &mut StateNode {
        &mut self.nodes[id.0]
    }

    /// Append a new state as the last child of `parent`.
    ///
    /// The child's index is its position among the siblings. Fails with
    /// [`TreeError::DuplicateChildId`] if `id` is already taken under
    /// `parent`.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        id: impl Into<String>,
        label: impl Into<String>,
        behavior: impl StateBehavior + 'static,
    ) -> Result<NodeId, TreeError> {
        let id = id.into();
        if self.nodes[parent.0].children_by_id.contains_key(&id) {
            return Err(TreeError::DuplicateChildId {
                parent: self.canonical_path(parent),
                id,
            });
        }

        let child = NodeId(self.nodes.len());
        let index = self.nodes[parent.0].children.len();
        self.nodes.push(StateNode {
            id: id.clone(),
            label: label.into(),
            parent: Some(parent),
            index,
            children: Vec::new(),
            children_by_id: HashMap::new(),
            behavior: Box::new(behavior),
        });

        let parent_node = &mut self.nodes[parent.0];
        parent_node.children.push(child);
        parent_node.children_by_id.insert(id, child);
        Ok(child)
    }

    /// Look up a child of `parent` by id.
    pub fn child_by_id(&self, parent: NodeId, id: &str) -> Option<NodeId> {
        self.nodes[parent.0].children_by_id.get(id).copied()
    }

    /// Look up a child of `parent` by position.
    pub fn child_by_index(&self, parent: NodeId, index: usize) -> Option<NodeId> {
        self.nodes[parent.0].children.get(index).copied()
    }

    /// Descend via the first child until a leaf is reached.
    ///
    /// Idempotent on leaves: `first_leaf(leaf) == leaf`.
    pub fn first_leaf(&self, from: NodeId) -> NodeId {
        let mut node = from;
        while let Some(&first) = self.nodes[node.0].children.first() {
            node = first;
        }
        node
    }

    /// Ordered chain of nodes from the root down to `node`, inclusive.
    pub fn canonical_chain(&self, node: NodeId) -> Vec<NodeId> {
        let mut chain = vec![node];
        let mut cursor = node;
        while let Some(parent) = self.nodes[cursor.0].parent {
            chain.push(parent);
            cursor = parent;
        }
        chain.reverse();
        chain
    }

    /// The chain's ids joined by `/` with a leading slash.
    ///
    /// The root contributes no text, so its own canonical path is the empty
    /// string and a first-level child's is `/<id>`.
    pub fn canonical_path(&self, node: NodeId) -> String {
        let mut path = String::new();
        for id in self.canonical_chain(node).into_iter().skip(1) {
            path.push('/');
            path.push_str(&self.nodes[id.0].id);
        }
        path
    }
}
