//! Concept model for the Koan notation
//!
//! A [`Concept`] is the canonical immutable result type of a parse: a tree
//! value that is either atomic (a leaf with a raw key) or compound (a key
//! derived from its parts). Concepts are shared behind `Arc`, never mutated
//! after construction, and carry write-once memo slots for classification
//! and masking.

use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

pub mod tags;

pub use tags::{DirectiveVocabulary, Tag, TagSet};

/// An immutable concept tree value.
///
/// Structural equality compares `key` and `parts` only, which is exactly
/// equality of serialized forms.
#[derive(Debug, Serialize, Deserialize)]
pub struct Concept {
    key: String,
    #[serde(default)]
    parts: Vec<Arc<Concept>>,
    /// Non-owning back-reference for downstream consumers; never set here.
    #[serde(skip)]
    context: OnceCell<Weak<Concept>>,
    #[serde(skip)]
    tags: OnceCell<TagSet>,
    #[serde(skip)]
    mask: OnceCell<Arc<Concept>>,
}

impl Concept {
    /// An atomic concept; the key is the raw token text.
    pub fn atom(key: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            key: key.into(),
            parts: Vec::new(),
            context: OnceCell::new(),
            tags: OnceCell::new(),
            mask: OnceCell::new(),
        })
    }

    /// Builds a concept from an ordered part sequence.
    ///
    /// Zero parts yield the empty atomic concept; a single part passes
    /// through unchanged (no wrapping); two or more become a compound whose
    /// key is derived by [`join_keys`].
    pub fn from_parts(mut parts: Vec<Arc<Self>>) -> Arc<Self> {
        match parts.len() {
            0 => Self::atom(""),
            1 => parts.swap_remove(0),
            _ => Arc::new(Self {
                key: join_keys(&parts),
                parts,
                context: OnceCell::new(),
                tags: OnceCell::new(),
                mask: OnceCell::new(),
            }),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn parts(&self) -> &[Arc<Self>] {
        &self.parts
    }

    /// `parts.is_empty()` iff the concept is atomic.
    pub fn is_atomic(&self) -> bool {
        self.parts.is_empty()
    }

    /// The canonical string form: the raw key for atoms, the key wrapped in
    /// `[ ]` for compounds, communicating "this token is itself a compound".
    pub fn display_form(&self) -> String {
        if self.is_atomic() {
            self.key.clone()
        } else {
            format!("[{}]", self.key)
        }
    }

    /// Collapses every variable leaf to the canonical `$` placeholder,
    /// re-deriving compound keys from the masked parts. Memoized; idempotent.
    ///
    /// Two concepts that differ only in variable identity mask to
    /// structurally equal values.
    pub fn to_mask(&self) -> Arc<Self> {
        self.mask
            .get_or_init(|| {
                if self.is_atomic() {
                    if self.key.starts_with('$') {
                        Self::atom("$")
                    } else {
                        Self::atom(self.key.clone())
                    }
                } else {
                    Self::from_parts(self.parts.iter().map(|p| p.to_mask()).collect())
                }
            })
            .clone()
    }

    /// Attaches the non-owning context back-reference. Returns false if a
    /// context was already set.
    pub fn set_context(&self, context: &Arc<Self>) -> bool {
        self.context.set(Arc::downgrade(context)).is_ok()
    }

    pub fn context(&self) -> Option<Arc<Self>> {
        self.context.get().and_then(Weak::upgrade)
    }

    /// Serializes to the canonical `{ key, parts }` JSON form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Reconstructs a structurally equal concept tree from its JSON form.
    pub fn from_json(json: &str) -> Result<Arc<Self>, serde_json::Error> {
        serde_json::from_str::<Self>(json).map(Arc::new)
    }
}

/// Derives the display key for a part sequence: each part's display form
/// joined by single spaces.
pub fn join_keys(parts: &[Arc<Concept>]) -> String {
    match parts {
        [] => String::new(),
        [only] => only.key.clone(),
        many => many
            .iter()
            .map(|p| p.display_form())
            .collect::<Vec<_>>()
            .join(" "),
    }
}

impl PartialEq for Concept {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.parts == other.parts
    }
}

impl Eq for Concept {}

impl Hash for Concept {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
        self.parts.hash(state);
    }
}

impl Clone for Concept {
    /// Clones the value, not the memo slots; caches are per-instance.
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            parts: self.parts.clone(),
            context: OnceCell::new(),
            tags: OnceCell::new(),
            mask: OnceCell::new(),
        }
    }
}

impl std::fmt::Display for Concept {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_passes_single_part_through() {
        let foo = Concept::atom("foo");
        let same = Concept::from_parts(vec![Arc::clone(&foo)]);
        assert!(Arc::ptr_eq(&foo, &same));
    }

    #[test]
    fn test_from_parts_zero_is_empty_atom() {
        let empty = Concept::from_parts(vec![]);
        assert!(empty.is_atomic());
        assert_eq!(empty.key(), "");
    }

    #[test]
    fn test_compound_key_joins_display_forms() {
        let inner = Concept::from_parts(vec![Concept::atom("b"), Concept::atom("c")]);
        let outer = Concept::from_parts(vec![Concept::atom("a"), inner]);
        assert_eq!(outer.key(), "a [b c]");
    }

    #[test]
    fn test_mask_collapses_variables_and_rederives_keys() {
        let x = Concept::from_parts(vec![Concept::atom("foo"), Concept::atom("$x")]);
        let y = Concept::from_parts(vec![Concept::atom("foo"), Concept::atom("$y")]);
        assert_ne!(x, y);
        assert_eq!(x.to_mask(), y.to_mask());
        assert_eq!(x.to_mask().key(), "foo $");
    }

    #[test]
    fn test_mask_is_idempotent() {
        let c = Concept::from_parts(vec![
            Concept::atom("GET"),
            Concept::atom("$url"),
            Concept::atom("now"),
        ]);
        let once = c.to_mask();
        assert_eq!(once.to_mask(), once);
    }

    #[test]
    fn test_mask_of_literal_is_itself() {
        let c = Concept::atom("foo");
        assert_eq!(c.to_mask(), c);
    }

    #[test]
    fn test_json_round_trip_is_lossless() {
        let c = Concept::from_parts(vec![
            Concept::atom("a"),
            Concept::from_parts(vec![Concept::atom("b"), Concept::atom("$v")]),
        ]);
        let json = c.to_json().unwrap();
        let restored = Concept::from_json(&json).unwrap();
        assert_eq!(restored, c);
    }

    #[test]
    fn test_serialized_form_is_key_and_parts_only() {
        let c = Concept::from_parts(vec![Concept::atom("a"), Concept::atom("b")]);
        let value: serde_json::Value = serde_json::from_str(&c.to_json().unwrap()).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert_eq!(object["key"], "a b");
        assert_eq!(object["parts"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_context_is_non_owning() {
        let c = Concept::atom("child");
        {
            let parent = Concept::atom("parent");
            assert!(c.set_context(&parent));
            assert_eq!(c.context().unwrap().key(), "parent");
        }
        assert!(c.context().is_none());
    }
}
