//! Arena-backed syntax tree for the concept notation.
//!
//! Nodes are addressed by index; children are owned id lists and parent
//! access goes through an explicit back-index, so mutation during building
//! can never dangle or cycle.

use serde::{Deserialize, Serialize};

use crate::syntax::Token;

pub mod builder;

pub use builder::TreeBuilder;

/// Index of a node within its [`Tree`]'s arena.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// The node vocabulary. `Root` and the three group kinds own ordered
/// `Branch` children; a `Branch` owns leaves and groups; the marker kinds
/// are leaves carrying their token only.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Root,
    Branch,
    Atom,
    /// `[...]` - wraps its resolved alternatives into nested concepts.
    Compound,
    /// `{...}` - in-place union of alternatives.
    InlineBranching,
    /// `(...)` - distributes its branches over the preceding sibling.
    Parenthetical,
    /// `:` as first token inside `[...]`.
    SortedSetInit,
    /// `&` head reference marker.
    HeadRef,
    /// `...`, `N..M`, `..M`, `N..`.
    PrevSeqRef,
}

impl NodeKind {
    /// True for the three bracketed group kinds.
    pub fn is_group(self) -> bool {
        matches!(
            self,
            Self::Compound | Self::InlineBranching | Self::Parenthetical
        )
    }

    /// True for leaves the builder appends directly to a branch.
    pub fn is_leaf(self) -> bool {
        matches!(
            self,
            Self::Atom | Self::SortedSetInit | Self::HeadRef | Self::PrevSeqRef
        )
    }
}

/// One arena slot. Leaves carry the token they were built from.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub token: Option<Token>,
}

/// A completed parse tree. Owned by one parse call; nodes never outlive it.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub(crate) fn new() -> Self {
        let root = Node {
            kind: NodeKind::Root,
            parent: None,
            children: Vec::new(),
            token: None,
        };
        Self { nodes: vec![root] }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id.0].kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Number of nodes in the arena, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Walks the parent chain from `id`, excluding `id` itself.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), |&n| self.parent(n))
    }

    pub(crate) fn alloc(&mut self, kind: NodeKind, parent: NodeId, token: Option<Token>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
            token,
        });
        self.nodes[parent.0].children.push(id);
        id
    }
}
