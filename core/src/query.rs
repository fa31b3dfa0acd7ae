use crate::error::{IrError, Result};
use crate::index::{Dictionary, DocId, Position, PositionMode, PositionalIndex, Posting};
use crate::persist::{load_index, load_meta, IndexPaths};
use crate::query_syntax::ParsedQuery;

/// Answers conjunctive, phrase and proximity queries over a loaded index.
/// Read-only after construction, so it can be shared across threads.
#[derive(Debug, Default)]
pub struct QueryProcessor {
    dictionary: Dictionary,
    index: PositionalIndex,
    position_mode: PositionMode,
}

impl QueryProcessor {
    pub fn new(dictionary: Dictionary, index: PositionalIndex) -> Self {
        Self { dictionary, index, position_mode: PositionMode::default() }
    }

    pub fn with_position_mode(mut self, mode: PositionMode) -> Self {
        self.position_mode = mode;
        self
    }

    /// Loads dictionary, index and (optional) metadata from an index directory.
    pub fn load(paths: &IndexPaths) -> Result<Self> {
        let (dictionary, index) = load_index(paths)?;
        let mode = load_meta(paths)?.map(|m| m.position_mode).unwrap_or_default();
        Ok(Self::new(dictionary, index).with_position_mode(mode))
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn index(&self) -> &PositionalIndex {
        &self.index
    }

    pub fn position_mode(&self) -> PositionMode {
        self.position_mode
    }

    /// Posting list of a normalized term, `None` if the term is unknown.
    pub fn postings(&self, term: &str) -> Option<&[Posting]> {
        self.dictionary.get(term).map(|&id| self.index.postings(id))
    }

    /// Documents containing every term. Any unknown term yields no documents.
    pub fn conjunctive_query<S: AsRef<str>>(&self, terms: &[S]) -> Vec<DocId> {
        let mut lists: Vec<Vec<DocId>> = Vec::with_capacity(terms.len());
        for term in terms {
            match self.postings(term.as_ref()) {
                Some(postings) => lists.push(postings.iter().map(|p| p.doc_id).collect()),
                None => return Vec::new(),
            }
        }
        lists.sort_by_key(|l| l.len());

        let mut lists = lists.into_iter();
        let Some(first) = lists.next() else {
            return Vec::new();
        };
        lists.fold(first, |acc, next| intersect_sorted(&acc, &next))
    }

    /// Documents where the terms occur in order, each within `distances[i]`
    /// intervening positions of the previous one.
    pub fn proximity_query<S: AsRef<str>>(&self, terms: &[S], distances: &[usize]) -> Result<Vec<DocId>> {
        if terms.is_empty() {
            return Err(IrError::invalid_query("proximity query needs at least one term"));
        }
        if distances.len() + 1 != terms.len() {
            return Err(IrError::invalid_query(format!(
                "{} terms need {} distances, got {}",
                terms.len(),
                terms.len() - 1,
                distances.len()
            )));
        }

        let candidates = self.conjunctive_query(terms);
        if candidates.is_empty() {
            return Ok(candidates);
        }
        let lists: Vec<&[Posting]> = terms.iter().filter_map(|t| self.postings(t.as_ref())).collect();

        let mut matches = Vec::new();
        let mut positions: Vec<&[Position]> = Vec::with_capacity(lists.len());
        for doc_id in candidates {
            positions.clear();
            for list in &lists {
                positions.push(positions_in(list, doc_id));
            }
            if positions.iter().any(|p| p.is_empty()) {
                continue;
            }
            if positions[0].iter().any(|&start| extends_from(start, &positions[1..], distances)) {
                matches.push(doc_id);
            }
        }
        tracing::debug!(terms = terms.len(), matches = matches.len(), "proximity query");
        Ok(matches)
    }

    /// Proximity query with every distance 0.
    pub fn phrase_query<S: AsRef<str>>(&self, terms: &[S]) -> Result<Vec<DocId>> {
        let distances = vec![0; terms.len().saturating_sub(1)];
        self.proximity_query(terms, &distances)
    }

    /// Evaluates a parsed front-end query. Queries whose words all normalized
    /// away match nothing.
    pub fn execute(&self, query: &ParsedQuery) -> Result<Vec<DocId>> {
        match query {
            ParsedQuery::Conjunctive(terms) => Ok(self.conjunctive_query(terms)),
            ParsedQuery::Phrase(terms) if terms.is_empty() => Ok(Vec::new()),
            ParsedQuery::Phrase(terms) => self.phrase_query(terms),
            ParsedQuery::Proximity { terms, .. } if terms.is_empty() => Ok(Vec::new()),
            ParsedQuery::Proximity { terms, distances } => self.proximity_query(terms, distances),
        }
    }
}

fn positions_in(list: &[Posting], doc_id: DocId) -> &[Position] {
    list.binary_search_by_key(&doc_id, |p| p.doc_id)
        .map(|i| list[i].positions.as_slice())
        .unwrap_or(&[])
}

/// Depth-first extension of a match ending at `pos`. Depth is bounded by the
/// number of remaining terms.
fn extends_from(pos: Position, rest: &[&[Position]], distances: &[usize]) -> bool {
    let (Some(next), Some(&dist)) = (rest.first(), distances.first()) else {
        return true;
    };
    candidate_window(next, pos, dist)
        .iter()
        .any(|&q| extends_from(q, &rest[1..], &distances[1..]))
}

/// Positions `q` in a sorted list with `pos < q <= pos + dist + 1`.
pub fn candidate_window(positions: &[Position], pos: Position, dist: usize) -> &[Position] {
    let start = positions.partition_point(|&q| q <= pos);
    let limit = (pos as u64).saturating_add(dist as u64).saturating_add(1);
    let len = positions[start..].partition_point(|&q| q as u64 <= limit);
    &positions[start..start + len]
}

/// Two-pointer intersection of ascending, duplicate-free lists.
pub fn intersect_sorted(a: &[DocId], b: &[DocId]) -> Vec<DocId> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersects_sorted_lists() {
        assert_eq!(intersect_sorted(&[1, 3, 5, 9], &[2, 3, 9, 10]), vec![3, 9]);
        assert!(intersect_sorted(&[], &[1, 2]).is_empty());
        assert!(intersect_sorted(&[1, 2], &[3, 4]).is_empty());
    }

    #[test]
    fn window_is_bounded_on_both_sides() {
        let positions = [1, 3, 4, 6, 9];
        assert_eq!(candidate_window(&positions, 3, 0), &[4]);
        assert_eq!(candidate_window(&positions, 3, 2), &[4, 6]);
        assert_eq!(candidate_window(&positions, 0, 0), &[1]);
        assert!(candidate_window(&positions, 9, 5).is_empty());
        assert!(candidate_window(&positions, 6, 1).is_empty());
        assert!(candidate_window(&[], 0, 3).is_empty());
        assert_eq!(candidate_window(&positions, 3, usize::MAX), &[4, 6, 9]);
    }

    #[test]
    fn backtracks_across_branches() {
        // a@0, b@1 and b@3, c@5: only the b@3 branch reaches c within distance 1.
        let rest: [&[Position]; 2] = [&[1, 3], &[5]];
        assert!(extends_from(0, &rest, &[2, 1]));
        assert!(!extends_from(0, &rest, &[0, 1]));
    }

    #[test]
    fn checks_preconditions() {
        let qp = QueryProcessor::default();
        let none: [&str; 0] = [];
        assert!(matches!(qp.proximity_query(&none, &[]), Err(IrError::InvalidQuery(_))));
        assert!(matches!(qp.proximity_query(&["a", "b"], &[]), Err(IrError::InvalidQuery(_))));
        assert!(qp.conjunctive_query(&none).is_empty());
    }
}
