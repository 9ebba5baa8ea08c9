//! Immutable operator results.
//!
//! A [`TableResult`] is what a sub-plan hands to its consumers: the
//! materialized id table, the columns it is sorted on, and a shared
//! [`Vocabulary`] handle for rendering ids. Results are shared by `Arc` and
//! never mutated after construction.

use crate::columns::ColumnIndex;
use std::collections::HashMap;
use std::sync::Arc;
use trellis_db_core::{Id, IdTable};

/// Shared handle mapping ids to lexical forms.
///
/// Empty vocabularies are a single `None` pointer. Rendering an id without a
/// known lexical form falls back to `#<bits>`.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary(Option<Arc<HashMap<Id, String>>>);

impl Vocabulary {
    pub fn empty() -> Self {
        Self(None)
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (Id, String)>) -> Self {
        let map: HashMap<Id, String> = entries.into_iter().collect();
        if map.is_empty() {
            Self(None)
        } else {
            Self(Some(Arc::new(map)))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// The lexical form of `id`, or `#<bits>` when unknown.
    pub fn lexical(&self, id: Id) -> String {
        self.0
            .as_ref()
            .and_then(|map| map.get(&id).cloned())
            .unwrap_or_else(|| format!("#{}", id.bits()))
    }

    /// Pick the non-empty of two handles, preferring `first`.
    ///
    /// Operators combining two upstream results use this instead of merging;
    /// in practice at most one upstream carries a vocabulary.
    pub fn merge_non_empty(first: &Vocabulary, second: &Vocabulary) -> Vocabulary {
        if !first.is_empty() {
            first.clone()
        } else {
            second.clone()
        }
    }
}

/// Immutable result of a sub-plan: table, sortedness, shared vocabulary.
#[derive(Debug)]
pub struct TableResult {
    table: IdTable,
    sorted_on: Vec<ColumnIndex>,
    vocab: Vocabulary,
}

impl TableResult {
    pub fn new(table: IdTable, sorted_on: Vec<ColumnIndex>, vocab: Vocabulary) -> Self {
        Self {
            table,
            sorted_on,
            vocab,
        }
    }

    pub fn table(&self) -> &IdTable {
        &self.table
    }

    /// Columns the table is sorted on, most significant first.
    pub fn sorted_on(&self) -> &[ColumnIndex] {
        &self.sorted_on
    }

    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn num_rows(&self) -> usize {
        self.table.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.table.num_columns()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexical_fallback() {
        let vocab = Vocabulary::from_entries([(Id::from_bits(1), "<knows>".to_string())]);
        assert_eq!(vocab.lexical(Id::from_bits(1)), "<knows>");
        assert_eq!(vocab.lexical(Id::from_bits(99)), "#99");
        assert_eq!(Vocabulary::empty().lexical(Id::from_bits(5)), "#5");
    }

    #[test]
    fn test_merge_non_empty_prefers_first() {
        let a = Vocabulary::from_entries([(Id::from_bits(1), "a".to_string())]);
        let b = Vocabulary::from_entries([(Id::from_bits(1), "b".to_string())]);
        let empty = Vocabulary::empty();

        assert_eq!(
            Vocabulary::merge_non_empty(&a, &b).lexical(Id::from_bits(1)),
            "a"
        );
        assert_eq!(
            Vocabulary::merge_non_empty(&empty, &b).lexical(Id::from_bits(1)),
            "b"
        );
        assert!(Vocabulary::merge_non_empty(&empty, &empty).is_empty());
    }
}
