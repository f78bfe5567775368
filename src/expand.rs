//! Permutation Compiler - tree to enumerated concepts.
//!
//! Walks the completed tree bottom-up, computing for every node the set of
//! concrete ordered concept sequences ("permutations") it can resolve to.
//! Sibling alternatives combine by cartesian product, inline branching by
//! union, and parenthetical groups distribute over their preceding sibling,
//! emitting finished concepts straight into the top-level result list.

use std::sync::Arc;

use crate::concept::Concept;
use crate::errors::{
    to_source_span, unspanned, ErrorKind, ErrorReporting, KoanError, PhaseContext, SourceContext,
};
use crate::tree::{NodeId, NodeKind, Tree};

/// One concrete ordered sequence of concepts resolved from a node.
pub type Permutation = Vec<Arc<Concept>>;

/// Expands a completed tree into every concept it implies, in emission
/// order: distribution results first, then each root branch's own
/// permutations in branch order.
pub fn expand(tree: &Tree, source: &SourceContext) -> Result<Vec<Arc<Concept>>, KoanError> {
    let mut compiler = Compiler {
        tree,
        memo: vec![None; tree.len()],
        distributed: Vec::new(),
        ctx: PhaseContext::new(source.clone(), "expand"),
    };

    let mut branch_sets = Vec::with_capacity(tree.children(tree.root()).len());
    for &branch in tree.children(tree.root()) {
        branch_sets.push(compiler.permutations(branch)?);
    }

    let mut concepts = compiler.distributed;
    for set in branch_sets {
        for permutation in set {
            concepts.push(Concept::from_parts(permutation));
        }
    }
    Ok(concepts)
}

struct Compiler<'t> {
    tree: &'t Tree,
    /// Per-node permutation sets, computed once during the single bottom-up
    /// traversal and discarded with the compiler.
    memo: Vec<Option<Vec<Permutation>>>,
    /// Finished concepts emitted by parenthetical distribution.
    distributed: Vec<Arc<Concept>>,
    ctx: PhaseContext,
}

impl Compiler<'_> {
    fn permutations(&mut self, id: NodeId) -> Result<Vec<Permutation>, KoanError> {
        if let Some(cached) = &self.memo[id.0] {
            return Ok(cached.clone());
        }
        let computed = self.compute(id)?;
        self.memo[id.0] = Some(computed.clone());
        Ok(computed)
    }

    fn compute(&mut self, id: NodeId) -> Result<Vec<Permutation>, KoanError> {
        match self.tree.kind(id) {
            NodeKind::Atom => {
                let text = self.token_text(id)?;
                Ok(vec![vec![Concept::atom(text)]])
            }
            NodeKind::Branch => self.branch_product(id),
            // Union: pick exactly one of the alternatives in place.
            NodeKind::InlineBranching | NodeKind::Parenthetical => self.branch_union(id),
            NodeKind::Compound => {
                let wrapped = self
                    .branch_union(id)?
                    .into_iter()
                    .map(|permutation| vec![Concept::from_parts(permutation)])
                    .collect();
                Ok(wrapped)
            }
            NodeKind::SortedSetInit | NodeKind::HeadRef | NodeKind::PrevSeqRef => {
                Err(self.unsupported_marker(id))
            }
            NodeKind::Root => Err(self.ctx.internal_error(
                "expandable node",
                "Root",
                unspanned(),
            )),
        }
    }

    /// Cartesian product of the branch's children, in child order.
    /// Parenthetical children are excluded from the product; encountering one
    /// triggers distribution instead.
    fn branch_product(&mut self, branch: NodeId) -> Result<Vec<Permutation>, KoanError> {
        let children = self.tree.children(branch).to_vec();
        let mut product: Vec<Permutation> = vec![Vec::new()];
        let mut contributed = false;

        for child in children {
            if self.tree.kind(child) == NodeKind::Parenthetical {
                self.distribute(child)?;
                continue;
            }
            let child_set = self.permutations(child)?;
            product = cartesian(product, &child_set);
            contributed = true;
        }

        // A branch with nothing to contribute (trailing separator, or only
        // parenthetical children) has no permutations of its own.
        if !contributed {
            return Ok(Vec::new());
        }
        Ok(product)
    }

    /// Union of the group's branches: concatenate their permutation sets.
    fn branch_union(&mut self, group: NodeId) -> Result<Vec<Permutation>, KoanError> {
        let branches = self.tree.children(group).to_vec();
        let mut union = Vec::new();
        for branch in branches {
            union.extend(self.permutations(branch)?);
        }
        Ok(union)
    }

    /// Distribution: every permutation of the nearest preceding non-group
    /// sibling, concatenated with every permutation of the parenthetical's
    /// branches, emitted as finished top-level concepts. Without a left
    /// operand the group contributes nothing.
    fn distribute(&mut self, paren: NodeId) -> Result<(), KoanError> {
        let Some(prefix) = self.preceding_non_group_sibling(paren) else {
            return Ok(());
        };
        let prefix_set = self.permutations(prefix)?;
        let own_set = self.branch_union(paren)?;
        for left in &prefix_set {
            for right in &own_set {
                let mut parts = left.clone();
                parts.extend(right.iter().cloned());
                self.distributed.push(Concept::from_parts(parts));
            }
        }
        Ok(())
    }

    fn preceding_non_group_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.tree.parent(id)?;
        let siblings = self.tree.children(parent);
        let at = siblings.iter().position(|&s| s == id)?;
        siblings[..at]
            .iter()
            .rev()
            .copied()
            .find(|&s| !self.tree.kind(s).is_group())
    }

    fn token_text(&self, id: NodeId) -> Result<String, KoanError> {
        self.tree
            .node(id)
            .token
            .as_ref()
            .map(|t| t.text.clone())
            .ok_or_else(|| self.ctx.internal_error("token", "leaf node", unspanned()))
    }

    fn unsupported_marker(&self, id: NodeId) -> KoanError {
        let (marker, span) = match &self.tree.node(id).token {
            Some(token) => (
                token.text.clone(),
                to_source_span(token.start.offset, token.end.offset),
            ),
            None => (format!("{:?}", self.tree.kind(id)), unspanned()),
        };
        self.ctx.report(ErrorKind::UnsupportedMarker { marker }, span)
    }
}

fn cartesian(left: Vec<Permutation>, right: &[Permutation]) -> Vec<Permutation> {
    let mut product = Vec::with_capacity(left.len() * right.len());
    for l in &left {
        for r in right {
            let mut merged = l.clone();
            merged.extend(r.iter().cloned());
            product.push(merged);
        }
    }
    product
}
