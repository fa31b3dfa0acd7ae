use std::collections::{BTreeMap, HashSet};

use rayon::prelude::*;

use crate::error::{IrError, Result};
use crate::index::{Dictionary, DocId, Position, PositionMode, PositionalIndex, Posting, TermId};
use crate::normalizer::Normalizer;
use crate::tokenizer::get_doc_terms;

/// Normalized (term, position) stream of one document.
pub type DocTerms = Vec<(String, Position)>;

/// Single-writer accumulator for a positional inverted index.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    mode: PositionMode,
    dictionary: Dictionary,
    index: PositionalIndex,
    seen_docs: HashSet<DocId>,
}

impl IndexBuilder {
    pub fn new(mode: PositionMode) -> Self {
        Self { mode, ..Self::default() }
    }

    pub fn num_docs(&self) -> usize {
        self.seen_docs.len()
    }

    /// Appends one document's terms. Positions must be strictly increasing.
    pub fn add_document(&mut self, doc_id: DocId, terms: &[(String, Position)]) -> Result<()> {
        if !self.seen_docs.insert(doc_id) {
            return Err(IrError::DuplicateDocument(doc_id));
        }
        for (i, (term, pos)) in terms.iter().enumerate() {
            let pos = match self.mode {
                PositionMode::Source => *pos,
                PositionMode::Compact => i as Position,
            };
            let next_id = self.dictionary.len() as TermId;
            let term_id = *self.dictionary.entry(term.clone()).or_insert(next_id);
            let list = self.index.slot_mut(term_id);
            match list.last_mut() {
                Some(posting) if posting.doc_id == doc_id => {
                    debug_assert!(posting.positions.last().map_or(true, |&last| last < pos));
                    posting.positions.push(pos);
                }
                _ => {
                    let mut posting = Posting::new(doc_id);
                    posting.positions.push(pos);
                    list.push(posting);
                }
            }
        }
        Ok(())
    }

    /// Sorts every posting list by document id and hands out the index.
    pub fn finish(self) -> (Dictionary, PositionalIndex) {
        let mut lists = self.index.into_lists();
        for list in lists.iter_mut() {
            list.sort_by_key(|p| p.doc_id);
        }
        (self.dictionary, PositionalIndex::from_lists(lists))
    }
}

/// Builds the index over every document on the calling thread.
pub fn build<I>(docs: I, mode: PositionMode) -> Result<(Dictionary, PositionalIndex)>
where
    I: IntoIterator<Item = (DocId, DocTerms)>,
{
    let mut builder = IndexBuilder::new(mode);
    for (doc_id, terms) in docs {
        builder.add_document(doc_id, &terms)?;
    }
    tracing::debug!(num_docs = builder.num_docs(), "built index");
    Ok(builder.finish())
}

/// Builds per-shard partial indices on the rayon pool, then merges them on the
/// calling thread. TermIds follow sorted term order, so the result does not
/// depend on the shard layout.
pub fn build_parallel(docs: Vec<(DocId, DocTerms)>, mode: PositionMode) -> Result<(Dictionary, PositionalIndex)> {
    let mut seen = HashSet::with_capacity(docs.len());
    if let Some((doc_id, _)) = docs.iter().find(|(doc_id, _)| !seen.insert(*doc_id)) {
        return Err(IrError::DuplicateDocument(*doc_id));
    }

    let shard_size = docs.len().div_ceil(rayon::current_num_threads().max(1)).max(1);
    let partials = docs
        .par_chunks(shard_size)
        .map(|shard| -> Result<(Dictionary, PositionalIndex)> {
            let mut builder = IndexBuilder::new(mode);
            for (doc_id, terms) in shard {
                builder.add_document(*doc_id, terms)?;
            }
            Ok(builder.finish())
        })
        .collect::<Result<Vec<_>>>()?;

    let mut merged: BTreeMap<String, Vec<Posting>> = BTreeMap::new();
    for (dictionary, index) in partials {
        let mut lists = index.into_lists();
        for (term, term_id) in dictionary {
            let list = std::mem::take(&mut lists[term_id as usize]);
            merged.entry(term).or_default().extend(list);
        }
    }

    let mut dictionary = Dictionary::with_capacity(merged.len());
    let mut lists = Vec::with_capacity(merged.len());
    for (term, mut list) in merged {
        list.sort_by_key(|p| p.doc_id);
        dictionary.insert(term, lists.len() as TermId);
        lists.push(list);
    }
    tracing::debug!(num_docs = docs.len(), num_terms = lists.len(), shard_size, "merged shards");
    Ok((dictionary, PositionalIndex::from_lists(lists)))
}

/// Runs the tokenizer over every raw document in parallel, ordered by doc id.
pub fn terms_from_raw_docs(normalizer: &Normalizer, raw_docs: &BTreeMap<DocId, String>) -> Vec<(DocId, DocTerms)> {
    raw_docs
        .par_iter()
        .map(|(doc_id, text)| (*doc_id, get_doc_terms(normalizer, text)))
        .collect()
}
