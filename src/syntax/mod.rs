//! Syntax module for the Koan notation
//!
//! This module provides the located token types produced by the tokenizer,
//! which everything downstream (tree builder, expansion) consumes.

use serde::{Deserialize, Serialize};

pub mod stream;
pub mod tokenizer;

pub use stream::ChunkedTokenizer;
pub use tokenizer::tokenize;

/// A position in the source text. `offset` is a 0-based byte offset;
/// `line` and `column` are 1-based.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

impl Cursor {
    pub fn start() -> Self {
        Self {
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// Returns the cursor advanced over `text`, counting embedded newlines.
    pub fn advanced_over(&self, text: &str) -> Self {
        let mut line = self.line;
        let mut column = self.column;
        for ch in text.chars() {
            if ch == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        Self {
            offset: self.offset + text.len(),
            line,
            column,
        }
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::start()
    }
}

/// The fixed token vocabulary, in rough priority order of the lexical rules
/// that produce each kind.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    /// One or more commas/newlines plus surrounding blank runs.
    BranchSep,
    /// Horizontal whitespace between parts.
    PartSep,
    OpenParen,
    CloseParen,
    OpenCurly,
    CloseCurly,
    OpenSquare,
    CloseSquare,
    /// `:` - sorted-set initializer marker.
    SortedSetInit,
    /// `&` - head reference marker.
    HeadRef,
    /// `...`, `N..M`, `..M`, `N..` - previous-sequence reference markers.
    PrevSeqRef,
    /// `<<...>>` free-text atom, may span lines.
    QuotedText,
    /// Maximal run of non-separator, non-bracket characters.
    Atom,
}

impl TokenKind {
    /// True for the three opening bracket kinds.
    pub fn is_opener(self) -> bool {
        matches!(self, Self::OpenParen | Self::OpenCurly | Self::OpenSquare)
    }

    /// True for the three closing bracket kinds.
    pub fn is_closer(self) -> bool {
        matches!(self, Self::CloseParen | Self::CloseCurly | Self::CloseSquare)
    }
}

/// An immutable located token. `text` is exactly the matched source slice,
/// so concatenating the texts of all tokens reconstructs the trimmed source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub start: Cursor,
    pub end: Cursor,
}
