//! Chunked tokenization for input that arrives in pieces.
//!
//! Each pushed chunk is re-tokenized together with the carried-over tail of
//! the previous chunk, locations are re-based by the carry's start cursor,
//! and a possibly-incomplete trailing token is held back until more input
//! arrives or the stream ends.

use crate::errors::KoanError;
use crate::syntax::tokenizer::tokenize_from;
use crate::syntax::{Cursor, Token};

/// Best-effort streaming variant of [`tokenize`](crate::syntax::tokenize).
///
/// Tokens are emitted strictly in source order, and for any split of a source
/// string into chunks the emitted sequence equals the one-shot result.
#[derive(Debug, Default)]
pub struct ChunkedTokenizer {
    /// Unconsumed tail text, re-tokenized with the next chunk.
    carry: String,
    /// Absolute cursor at the start of `carry`.
    base: Cursor,
    /// Set once leading whitespace has been trimmed away.
    started: bool,
}

impl ChunkedTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next chunk, returning every token fully contained before the
    /// stream boundary.
    ///
    /// The final token is always held back, and so is everything from an
    /// unterminated `<<` onward: until its `>>` arrives, the text after it
    /// lexes as ordinary atoms and must not escape.
    pub fn push(&mut self, chunk: &str) -> Result<Vec<Token>, KoanError> {
        self.carry.push_str(chunk);
        if !self.trim_leading() {
            return Ok(Vec::new());
        }

        let tokens = tokenize_from(&self.carry, self.base)?;
        let mut keep = tokens.len().saturating_sub(1);
        if let Some(quote) = unmatched_quote_start(&self.carry) {
            let abs = self.base.offset + quote;
            while keep > 0 && tokens[keep - 1].end.offset > abs {
                keep -= 1;
            }
        }
        if keep == 0 {
            return Ok(Vec::new());
        }

        let hold_from = tokens[keep].start;
        self.carry.drain(..hold_from.offset - self.base.offset);
        self.base = hold_from;
        Ok(tokens[..keep].to_vec())
    }

    /// Signal end-of-stream, flushing the held-back remainder. Trailing
    /// whitespace is dropped, mirroring the one-shot tokenizer's trim.
    pub fn finish(mut self) -> Result<Vec<Token>, KoanError> {
        let kept = self.carry.trim_end().len();
        self.carry.truncate(kept);
        if self.carry.is_empty() {
            return Ok(Vec::new());
        }
        tokenize_from(&self.carry, self.base)
    }

    /// Drops leading whitespace before the first real token. Returns false
    /// while the stream has produced nothing but whitespace.
    fn trim_leading(&mut self) -> bool {
        if !self.started {
            let lead = self.carry.len() - self.carry.trim_start().len();
            self.carry.drain(..lead);
            self.started = !self.carry.is_empty();
        }
        self.started
    }
}

/// Byte position of the first `<<` with no later `>>`, pairing left to right
/// the way the non-greedy quote rule does.
fn unmatched_quote_start(text: &str) -> Option<usize> {
    let mut at = 0;
    while let Some(rel) = text[at..].find("<<") {
        let open = at + rel;
        match text[open + 2..].find(">>") {
            Some(close) => at = open + 2 + close + 2,
            None => return Some(open),
        }
    }
    None
}
