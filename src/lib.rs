//! Koan: a parser for a compact concept notation.
//!
//! Source text is tokenized, assembled into a branch/atom/group tree, and
//! expanded into every concrete [`Concept`] the notation implies; concepts
//! then classify themselves into a small tag vocabulary on demand.
//!
//! ```
//! use koan::parse_concepts;
//!
//! let concepts = parse_concepts("foo {bar, baz}").unwrap();
//! let keys: Vec<_> = concepts.iter().map(|c| c.key()).collect();
//! assert_eq!(keys, ["foo bar", "foo baz"]);
//! ```

use std::sync::Arc;

pub mod concept;
pub mod errors;
pub mod expand;
pub mod syntax;
pub mod tree;

pub use crate::concept::{Concept, DirectiveVocabulary, Tag, TagSet};
pub use crate::errors::{ErrorCategory, ErrorKind, KoanError, SourceContext};
pub use crate::expand::{expand, Permutation};
pub use crate::syntax::{tokenize, ChunkedTokenizer, Cursor, Token, TokenKind};
pub use crate::tree::{Node, NodeId, NodeKind, Tree, TreeBuilder};

/// Parses notation source into the ordered list of concepts it implies:
/// tokenize, build the tree, expand every branch choice and distribution.
///
/// Lexical and structural errors abort the whole call; no partial results
/// are returned.
pub fn parse_concepts(source: &str) -> Result<Vec<Arc<Concept>>, KoanError> {
    let trimmed = source.trim();
    let tokens = syntax::tokenize(trimmed)?;
    let tree = tree::TreeBuilder::new().build(&tokens)?;
    expand::expand(&tree, &SourceContext::from_source("source", trimmed))
}
