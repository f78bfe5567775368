//! Tag classification for concepts.
//!
//! A concept classifies into one or more tags from a fixed vocabulary, purely
//! as a function of its key and parts, so the result is memoized per instance.
//! Compound classification follows a strict precedence order; the directive
//! vocabulary consulted for trigger clauses is supplied by the caller and is
//! not owned by this core.

use std::collections::HashSet;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::concept::Concept;

/// The tag vocabulary.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    Atom,
    Literal,
    Variable,
    Directive,
    CommandName,
    Command,
    Compound,
    Pattern,
    TriggerClause,
    TriggerName,
    Trigger,
}

impl Tag {
    const ALL: [Tag; 11] = [
        Tag::Atom,
        Tag::Literal,
        Tag::Variable,
        Tag::Directive,
        Tag::CommandName,
        Tag::Command,
        Tag::Compound,
        Tag::Pattern,
        Tag::TriggerClause,
        Tag::TriggerName,
        Tag::Trigger,
    ];

    /// The singleton [`TagSet`] flag for this tag.
    pub const fn flag(self) -> TagSet {
        match self {
            Tag::Atom => TagSet::ATOM,
            Tag::Literal => TagSet::LITERAL,
            Tag::Variable => TagSet::VARIABLE,
            Tag::Directive => TagSet::DIRECTIVE,
            Tag::CommandName => TagSet::COMMAND_NAME,
            Tag::Command => TagSet::COMMAND,
            Tag::Compound => TagSet::COMPOUND,
            Tag::Pattern => TagSet::PATTERN,
            Tag::TriggerClause => TagSet::TRIGGER_CLAUSE,
            Tag::TriggerName => TagSet::TRIGGER_NAME,
            Tag::Trigger => TagSet::TRIGGER,
        }
    }
}

bitflags! {
    /// A small set of [`Tag`]s.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct TagSet: u16 {
        const ATOM = 1 << 0;
        const LITERAL = 1 << 1;
        const VARIABLE = 1 << 2;
        const DIRECTIVE = 1 << 3;
        const COMMAND_NAME = 1 << 4;
        const COMMAND = 1 << 5;
        const COMPOUND = 1 << 6;
        const PATTERN = 1 << 7;
        const TRIGGER_CLAUSE = 1 << 8;
        const TRIGGER_NAME = 1 << 9;
        const TRIGGER = 1 << 10;
    }
}

impl From<Tag> for TagSet {
    fn from(tag: Tag) -> Self {
        tag.flag()
    }
}

/// The externally supplied set of strings recognized as trigger-clause
/// markers. Owned by the trigger subsystem, consumed opaquely here.
#[derive(Debug, Clone, Default)]
pub struct DirectiveVocabulary(HashSet<String>);

impl DirectiveVocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }
}

impl<S: Into<String>> FromIterator<S> for DirectiveVocabulary {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl Concept {
    /// Classifies this concept, memoizing the result for its lifetime.
    ///
    /// Sound because concepts are immutable; callers are expected to use one
    /// stable vocabulary per concept population.
    pub fn tags(&self, vocab: &DirectiveVocabulary) -> TagSet {
        *self.tags.get_or_init(|| classify(self, vocab))
    }
}

fn classify(concept: &Concept, vocab: &DirectiveVocabulary) -> TagSet {
    if concept.is_atomic() {
        TagSet::ATOM | atomic_role(concept.key()).flag()
    } else {
        TagSet::COMPOUND | compound_role(concept, vocab).flag()
    }
}

/// Exactly one of VARIABLE, DIRECTIVE, COMMAND_NAME, LITERAL.
fn atomic_role(key: &str) -> Tag {
    if key.starts_with('$') {
        Tag::Variable
    } else if key.starts_with('@') {
        Tag::Directive
    } else if is_all_uppercase(key) {
        Tag::CommandName
    } else {
        Tag::Literal
    }
}

/// Exactly one of COMMAND, PATTERN, TRIGGER, TRIGGER_CLAUSE, LITERAL, in
/// that precedence order.
fn compound_role(concept: &Concept, vocab: &DirectiveVocabulary) -> Tag {
    let parts = concept.parts();
    if parts[0].tags(vocab).contains(TagSet::COMMAND_NAME) {
        return Tag::Command;
    }
    let pattern_like = TagSet::PATTERN | TagSet::VARIABLE;
    if parts.iter().any(|p| p.tags(vocab).intersects(pattern_like)) {
        return Tag::Pattern;
    }
    let trigger_like = TagSet::TRIGGER_NAME | TagSet::TRIGGER_CLAUSE;
    if parts.iter().any(|p| p.tags(vocab).intersects(trigger_like)) {
        return Tag::Trigger;
    }
    if parts.len() == 3 && vocab.contains(parts[2].key()) {
        return Tag::TriggerClause;
    }
    Tag::Literal
}

/// Entirely upper-case: at least one cased character and none lower-case.
fn is_all_uppercase(key: &str) -> bool {
    key.chars().any(char::is_uppercase) && !key.chars().any(char::is_lowercase)
}
