//! Tree Builder - token stream to branch/atom/group tree.
//!
//! Consumes tokens one at a time, maintaining a single cursor at the current
//! insertion node. Bracket handling is deliberately forgiving: a stray closer
//! is ignored and unclosed groups are closed by the end-of-input sweep.

use crate::errors::{unspanned, ErrorReporting, KoanError, PhaseContext, SourceContext};
use crate::syntax::{Token, TokenKind};
use crate::tree::{NodeId, NodeKind, Tree};

/// Observer invoked whenever a node's input is fully consumed: branches,
/// groups, and at end-of-stream every still-open ancestor, root last.
pub type NodeObserver<'a> = Box<dyn FnMut(&Tree, NodeId) + 'a>;

/// Assembles a [`Tree`] from a token stream.
pub struct TreeBuilder<'a> {
    tree: Tree,
    /// Current insertion node: a leaf or a `Branch`.
    cursor: NodeId,
    /// Completion flags by node index; a node completes at most once.
    completed: Vec<bool>,
    observer: Option<NodeObserver<'a>>,
    ctx: PhaseContext,
}

impl<'a> TreeBuilder<'a> {
    pub fn new() -> Self {
        let mut tree = Tree::new();
        let first_branch = tree.alloc(NodeKind::Branch, tree.root(), None);
        Self {
            tree,
            cursor: first_branch,
            completed: Vec::new(),
            observer: None,
            ctx: PhaseContext::new(SourceContext::fallback("tree builder"), "build"),
        }
    }

    /// Registers a node-complete observer for downstream consumers.
    pub fn with_observer(mut self, observer: impl FnMut(&Tree, NodeId) + 'a) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Consumes the token stream and returns the completed tree.
    pub fn build(mut self, tokens: &[Token]) -> Result<Tree, KoanError> {
        for token in tokens {
            self.step(token)?;
        }
        self.close_remaining()?;
        Ok(self.tree)
    }

    fn step(&mut self, token: &Token) -> Result<(), KoanError> {
        match token.kind {
            TokenKind::Atom | TokenKind::QuotedText => self.append_leaf(NodeKind::Atom, token),
            TokenKind::SortedSetInit => self.append_leaf(NodeKind::SortedSetInit, token),
            TokenKind::HeadRef => self.append_leaf(NodeKind::HeadRef, token),
            TokenKind::PrevSeqRef => self.append_leaf(NodeKind::PrevSeqRef, token),
            // Part separators only exist to split atoms lexically.
            TokenKind::PartSep => Ok(()),
            TokenKind::BranchSep => self.start_sibling_branch(),
            TokenKind::OpenParen => self.open_group(NodeKind::Parenthetical),
            TokenKind::OpenCurly => self.open_group(NodeKind::InlineBranching),
            TokenKind::OpenSquare => self.open_group(NodeKind::Compound),
            TokenKind::CloseParen => self.close_group(NodeKind::Parenthetical),
            TokenKind::CloseCurly => self.close_group(NodeKind::InlineBranching),
            TokenKind::CloseSquare => self.close_group(NodeKind::Compound),
        }
    }

    fn append_leaf(&mut self, kind: NodeKind, token: &Token) -> Result<(), KoanError> {
        let branch = self.enclosing_branch()?;
        self.cursor = self.tree.alloc(kind, branch, Some(token.clone()));
        Ok(())
    }

    fn start_sibling_branch(&mut self) -> Result<(), KoanError> {
        let branch = self.enclosing_branch()?;
        self.complete(branch);
        let group = self
            .tree
            .parent(branch)
            .ok_or_else(|| self.ctx.internal_error("group above branch", "Branch", unspanned()))?;
        self.cursor = self.tree.alloc(NodeKind::Branch, group, None);
        Ok(())
    }

    fn open_group(&mut self, kind: NodeKind) -> Result<(), KoanError> {
        let branch = self.enclosing_branch()?;
        // Distribution combines a parenthetical with its already-finished
        // prefix, so the enclosing branch completes before the group opens.
        if kind == NodeKind::Parenthetical {
            self.complete(branch);
        }
        let group = self.tree.alloc(kind, branch, None);
        self.cursor = self.tree.alloc(NodeKind::Branch, group, None);
        Ok(())
    }

    /// Closest-before search: the nearest enclosing group must be of the
    /// matching kind, otherwise the closer is stray and silently ignored.
    fn close_group(&mut self, kind: NodeKind) -> Result<(), KoanError> {
        let branch = self.enclosing_branch()?;
        let Some(group) = self.tree.ancestors(branch).find(|&n| self.tree.kind(n).is_group())
        else {
            return Ok(()); // stray closer at top level
        };
        if self.tree.kind(group) != kind {
            return Ok(()); // stray closer inside a different group
        }
        self.complete(branch);
        self.complete(group);
        self.cursor = self
            .tree
            .parent(group)
            .ok_or_else(|| self.ctx.internal_error("Branch above group", "group", unspanned()))?;
        Ok(())
    }

    /// End-of-input sweep: close the innermost still-open node, walking
    /// outward to the root.
    fn close_remaining(&mut self) -> Result<(), KoanError> {
        let mut node = self.enclosing_branch()?;
        loop {
            self.complete(node);
            match self.tree.parent(node) {
                Some(parent) => node = parent,
                None => return Ok(()),
            }
        }
    }

    /// The closest enclosing `Branch`: the cursor itself, or its parent when
    /// the cursor sits on a leaf.
    fn enclosing_branch(&self) -> Result<NodeId, KoanError> {
        if self.tree.kind(self.cursor) == NodeKind::Branch {
            return Ok(self.cursor);
        }
        self.tree
            .ancestors(self.cursor)
            .find(|&n| self.tree.kind(n) == NodeKind::Branch)
            .ok_or_else(|| self.ctx.internal_error("Branch", "leaf cursor", unspanned()))
    }

    fn complete(&mut self, id: NodeId) {
        if self.completed.len() < self.tree.len() {
            self.completed.resize(self.tree.len(), false);
        }
        if !self.completed[id.0] {
            self.completed[id.0] = true;
            if let Some(observer) = self.observer.as_mut() {
                observer(&self.tree, id);
            }
        }
    }
}

impl Default for TreeBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::tokenize;

    fn build(source: &str) -> Tree {
        TreeBuilder::new().build(&tokenize(source).unwrap()).unwrap()
    }

    /// Renders the tree shape for compact assertions.
    fn shape(tree: &Tree, id: NodeId) -> String {
        let node = tree.node(id);
        let label = match node.kind {
            NodeKind::Root => "root",
            NodeKind::Branch => "branch",
            NodeKind::Atom => return node.token.as_ref().unwrap().text.clone(),
            NodeKind::Compound => "compound",
            NodeKind::InlineBranching => "inline",
            NodeKind::Parenthetical => "paren",
            NodeKind::SortedSetInit => return ":".into(),
            NodeKind::HeadRef => return "&".into(),
            NodeKind::PrevSeqRef => return node.token.as_ref().unwrap().text.clone(),
        };
        let children: Vec<_> = node.children.iter().map(|&c| shape(tree, c)).collect();
        format!("{}({})", label, children.join(" "))
    }

    fn shape_of(source: &str) -> String {
        let tree = build(source);
        shape(&tree, tree.root())
    }

    #[test]
    fn test_atoms_accumulate_in_one_branch() {
        assert_eq!(shape_of("foo bar"), "root(branch(foo bar))");
    }

    #[test]
    fn test_branch_separator_starts_sibling_branch() {
        assert_eq!(shape_of("foo, bar"), "root(branch(foo) branch(bar))");
    }

    #[test]
    fn test_groups_nest_with_first_branch_child() {
        assert_eq!(
            shape_of("a {b, c}"),
            "root(branch(a inline(branch(b) branch(c))))"
        );
        assert_eq!(shape_of("a [b c]"), "root(branch(a compound(branch(b c))))");
        assert_eq!(
            shape_of("a (b, c)"),
            "root(branch(a paren(branch(b) branch(c))))"
        );
    }

    #[test]
    fn test_every_branch_parent_is_root_or_group() {
        let tree = build("a {b, [c d]} (e)");
        for id in (0..tree.len()).map(NodeId) {
            if tree.kind(id) == NodeKind::Branch {
                let parent = tree.parent(id).unwrap();
                assert!(matches!(
                    tree.kind(parent),
                    NodeKind::Root
                        | NodeKind::Compound
                        | NodeKind::InlineBranching
                        | NodeKind::Parenthetical
                ));
            }
        }
    }

    #[test]
    fn test_group_first_child_is_always_a_branch() {
        let tree = build("a {b} [c] (d)");
        for id in (0..tree.len()).map(NodeId) {
            if tree.kind(id).is_group() {
                let first = tree.children(id)[0];
                assert_eq!(tree.kind(first), NodeKind::Branch);
            }
        }
    }

    #[test]
    fn test_stray_closer_is_ignored() {
        assert_eq!(shape_of("foo) bar"), "root(branch(foo bar))");
        assert_eq!(shape_of("a {b]} c"), "root(branch(a inline(branch(b)) c))");
    }

    #[test]
    fn test_mismatched_closer_inside_group_is_ignored() {
        // `]` inside `{` has no matching ancestor before the inline group.
        assert_eq!(shape_of("{a] b}"), "root(branch(inline(branch(a b))))");
    }

    #[test]
    fn test_unclosed_group_closes_at_eof() {
        assert_eq!(shape_of("a {b, c"), "root(branch(a inline(branch(b) branch(c))))");
        assert_eq!(shape_of("a (b"), "root(branch(a paren(branch(b))))");
    }

    #[test]
    fn test_markers_are_placed_structurally() {
        assert_eq!(shape_of("&foo"), "root(branch(& foo))");
        assert_eq!(shape_of("[:a b]"), "root(branch(compound(branch(: a b))))");
        assert_eq!(shape_of("1..3"), "root(branch(1..3))");
    }

    #[test]
    fn test_completion_events_fire_innermost_first_root_last() {
        let mut order = Vec::new();
        let tokens = tokenize("a {b, c} d").unwrap();
        {
            let builder =
                TreeBuilder::new().with_observer(|tree, id| order.push(tree.kind(id)));
            builder.build(&tokens).unwrap();
        }
        assert_eq!(
            order,
            vec![
                NodeKind::Branch,          // b
                NodeKind::Branch,          // c
                NodeKind::InlineBranching, // {b, c}
                NodeKind::Branch,          // a {b, c} d
                NodeKind::Root,
            ]
        );
    }

    #[test]
    fn test_opening_a_parenthetical_completes_the_enclosing_branch() {
        let mut order = Vec::new();
        let tokens = tokenize("foo (bar").unwrap();
        TreeBuilder::new()
            .with_observer(|tree, id| order.push(tree.kind(id)))
            .build(&tokens)
            .unwrap();
        // The outer branch completes when `(` opens; the sweep then closes
        // the inner branch and the parenthetical, skipping the outer branch.
        assert_eq!(
            order,
            vec![
                NodeKind::Branch,        // foo (at `(`)
                NodeKind::Branch,        // bar (sweep)
                NodeKind::Parenthetical, // sweep
                NodeKind::Root,
            ]
        );
    }

    #[test]
    fn test_completion_fires_once_per_node() {
        let mut count = 0;
        let tokens = tokenize("a (b)").unwrap();
        TreeBuilder::new()
            .with_observer(|_, _| count += 1)
            .build(&tokens)
            .unwrap();
        // outer branch (at `(`), inner branch + paren (at `)`), root (sweep).
        assert_eq!(count, 4);
    }
}
