use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type TermId = u32;
pub type DocId = u32;
pub type Position = u32;

/// Term → TermId, bijective within one index generation.
pub type Dictionary = HashMap<String, TermId>;

/// Occurrences of one term in one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub positions: Vec<Position>, // strictly increasing
}

impl Posting {
    pub fn new(doc_id: DocId) -> Self {
        Self { doc_id, positions: Vec::new() }
    }
}

/// How token positions are numbered when a document is indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionMode {
    /// Index of the token in the raw whitespace split; discarded tokens leave gaps.
    #[default]
    Source,
    /// Surviving terms renumbered 0..k-1.
    Compact,
}

/// Posting lists stored in a flat arena keyed by TermId.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionalIndex {
    postings: Vec<Vec<Posting>>, // each list sorted by doc_id
}

impl PositionalIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_lists(postings: Vec<Vec<Posting>>) -> Self {
        Self { postings }
    }

    /// Number of TermId slots.
    pub fn num_terms(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Posting list for `term_id`; empty for an unknown id.
    pub fn postings(&self, term_id: TermId) -> &[Posting] {
        self.postings.get(term_id as usize).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn doc_frequency(&self, term_id: TermId) -> usize {
        self.postings(term_id).len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TermId, &[Posting])> {
        self.postings.iter().enumerate().map(|(id, list)| (id as TermId, list.as_slice()))
    }

    /// Mutable slot for `term_id`, growing the arena as needed.
    pub(crate) fn slot_mut(&mut self, term_id: TermId) -> &mut Vec<Posting> {
        let idx = term_id as usize;
        if self.postings.len() <= idx {
            self.postings.resize_with(idx + 1, Vec::new);
        }
        &mut self.postings[idx]
    }

    pub(crate) fn into_lists(self) -> Vec<Vec<Posting>> {
        self.postings
    }
}
