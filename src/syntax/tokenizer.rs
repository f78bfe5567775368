//! Koan Tokenizer - Clean, Minimal Implementation
//!
//! Converts notation source into located tokens by trying a fixed,
//! priority-ordered list of lexical rules at each position; first match wins.
//! This stage is purely lexical - bracket matching belongs to the tree builder.

use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::{to_source_span, ErrorKind, ErrorReporting, KoanError, PhaseContext, SourceContext};
use crate::syntax::{Cursor, Token, TokenKind};

lazy_static! {
    /// One or more commas/newlines plus the surrounding blank/comma/newline run.
    static ref BRANCH_SEP: Regex = Regex::new(r"^[ \t]*[,\r\n][ \t,\r\n]*").unwrap();
    /// Horizontal whitespace between parts.
    static ref PART_SEP: Regex = Regex::new(r"^[ \t]+").unwrap();
    /// Openers absorb a trailing separator run.
    static ref OPEN_PAREN: Regex = Regex::new(r"^\([ \t,\r\n]*").unwrap();
    static ref OPEN_CURLY: Regex = Regex::new(r"^\{[ \t,\r\n]*").unwrap();
    static ref OPEN_SQUARE: Regex = Regex::new(r"^\[[ \t,\r\n]*").unwrap();
    /// Closers absorb a leading separator run.
    static ref CLOSE_PAREN: Regex = Regex::new(r"^[ \t,\r\n]*\)").unwrap();
    static ref CLOSE_CURLY: Regex = Regex::new(r"^[ \t,\r\n]*\}").unwrap();
    static ref CLOSE_SQUARE: Regex = Regex::new(r"^[ \t,\r\n]*\]").unwrap();
    static ref SORTED_SET_INIT: Regex = Regex::new(r"^:").unwrap();
    static ref HEAD_REF: Regex = Regex::new(r"^&").unwrap();
    /// `...`, `N..M`, `..M`, `N..` - order matters inside the alternation.
    static ref PREV_SEQ_REF: Regex =
        Regex::new(r"^(?:\.\.\.|[0-9]+\.\.[0-9]+|\.\.[0-9]+|[0-9]+\.\.)").unwrap();
    /// Free-text atom, non-greedy to the first `>>`, may span lines.
    static ref QUOTED_TEXT: Regex = Regex::new(r"^<<(?s:.*?)>>").unwrap();
    /// Maximal run of non-separator, non-bracket characters.
    static ref ATOM: Regex = Regex::new(r"^[^\s,()\[\]{}]+").unwrap();
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Tokenize notation source into located tokens.
///
/// The source is trimmed first; whitespace-only input yields an empty
/// sequence. Concatenating the `text` fields of the result reconstructs the
/// trimmed source exactly.
pub fn tokenize(source: &str) -> Result<Vec<Token>, KoanError> {
    tokenize_from(source.trim(), Cursor::start())
}

/// Tokenize without trimming, with locations based at `base`.
///
/// The chunked tokenizer uses this to re-base carried-over text; `tokenize`
/// is the trimming front door.
pub(crate) fn tokenize_from(text: &str, base: Cursor) -> Result<Vec<Token>, KoanError> {
    let mut tokens = Vec::new();
    let mut cursor = base;
    let mut rest = text;

    while !rest.is_empty() {
        let (kind, len) = match_rule(rest).ok_or_else(|| lex_error(text, cursor, base))?;
        let matched = &rest[..len];
        let end = cursor.advanced_over(matched);
        tokens.push(Token {
            kind,
            text: matched.to_string(),
            start: cursor,
            end,
        });
        cursor = end;
        rest = &rest[len..];
    }

    Ok(tokens)
}

// ============================================================================
// RULE MATCHING
// ============================================================================

/// Try every lexical rule at the head of `rest`, in priority order.
fn match_rule(rest: &str) -> Option<(TokenKind, usize)> {
    // A separator run that ends at a closing bracket belongs to the closer
    // rule, which absorbs its leading separators; otherwise `[a, b,]` would
    // grow a trailing empty branch.
    if !separator_run_ends_at_closer(rest) {
        if let Some(m) = BRANCH_SEP.find(rest) {
            return Some((TokenKind::BranchSep, m.end()));
        }
        if let Some(m) = PART_SEP.find(rest) {
            return Some((TokenKind::PartSep, m.end()));
        }
    }

    let bracket_rules: [(&Regex, TokenKind); 6] = [
        (&OPEN_PAREN, TokenKind::OpenParen),
        (&CLOSE_PAREN, TokenKind::CloseParen),
        (&OPEN_CURLY, TokenKind::OpenCurly),
        (&CLOSE_CURLY, TokenKind::CloseCurly),
        (&OPEN_SQUARE, TokenKind::OpenSquare),
        (&CLOSE_SQUARE, TokenKind::CloseSquare),
    ];
    for (pattern, kind) in bracket_rules {
        if let Some(m) = pattern.find(rest) {
            return Some((kind, m.end()));
        }
    }

    let tail_rules: [(&Regex, TokenKind); 5] = [
        (&SORTED_SET_INIT, TokenKind::SortedSetInit),
        (&HEAD_REF, TokenKind::HeadRef),
        (&PREV_SEQ_REF, TokenKind::PrevSeqRef),
        (&QUOTED_TEXT, TokenKind::QuotedText),
        (&ATOM, TokenKind::Atom),
    ];
    for (pattern, kind) in tail_rules {
        if let Some(m) = pattern.find(rest) {
            return Some((kind, m.end()));
        }
    }

    None
}

/// True when the maximal blank/comma/newline run at the head of `rest` is
/// immediately followed by a closing bracket.
fn separator_run_ends_at_closer(rest: &str) -> bool {
    let run_end = rest
        .bytes()
        .position(|b| !matches!(b, b' ' | b'\t' | b',' | b'\r' | b'\n'))
        .unwrap_or(rest.len());
    run_end > 0 && matches!(rest.as_bytes().get(run_end), Some(b')' | b'}' | b']'))
}

fn lex_error(text: &str, cursor: Cursor, base: Cursor) -> KoanError {
    let ctx = PhaseContext::new(SourceContext::from_source("source", text), "tokenize");
    let local = cursor.offset - base.offset;
    ctx.report(
        ErrorKind::UnrecognizedInput {
            line: cursor.line,
            column: cursor.column,
            offset: cursor.offset,
        },
        to_source_span(local, local + 1),
    )
}
