use std::collections::BTreeMap;

use ir_core::builder::{build, terms_from_raw_docs};
use ir_core::index::PositionMode;
use ir_core::query_syntax::{parse_query, ParsedQuery};
use ir_core::stemmer::IdentityStemmer;
use ir_core::stopwords::StopwordSet;
use ir_core::{DocId, Normalizer, QueryProcessor};

fn normalizer() -> Normalizer {
    Normalizer::new(StopwordSet::parse("the on a of and").unwrap(), IdentityStemmer)
}

fn processor(docs: &[(DocId, &str)], mode: PositionMode) -> QueryProcessor {
    let raw: BTreeMap<DocId, String> = docs.iter().map(|(id, text)| (*id, text.to_string())).collect();
    let terms = terms_from_raw_docs(&normalizer(), &raw);
    let (dict, index) = build(terms, mode).unwrap();
    QueryProcessor::new(dict, index).with_position_mode(mode)
}

#[test]
fn single_document_with_compact_positions() {
    let qp = processor(&[(1, "the cat sat on the mat")], PositionMode::Compact);
    assert_eq!(qp.dictionary().len(), 3);
    for term in ["cat", "sat", "mat"] {
        let postings = qp.postings(term).unwrap();
        assert_eq!(postings.len(), 1);
        assert_eq!(postings[0].doc_id, 1);
    }
    assert_eq!(qp.conjunctive_query(&["cat", "mat"]), vec![1]);
    // cat@0, mat@2: one position in between
    assert!(qp.proximity_query(&["cat", "mat"], &[0]).unwrap().is_empty());
    assert_eq!(qp.proximity_query(&["cat", "mat"], &[1]).unwrap(), vec![1]);
    assert_eq!(qp.proximity_query(&["cat", "mat"], &[2]).unwrap(), vec![1]);
}

#[test]
fn single_document_with_source_positions() {
    // cat@1, mat@5: the removed stopwords still count toward the gap
    let qp = processor(&[(1, "the cat sat on the mat")], PositionMode::Source);
    assert!(qp.proximity_query(&["cat", "mat"], &[1]).unwrap().is_empty());
    assert!(qp.proximity_query(&["cat", "mat"], &[2]).unwrap().is_empty());
    assert_eq!(qp.proximity_query(&["cat", "mat"], &[3]).unwrap(), vec![1]);
    assert_eq!(qp.phrase_query(&["cat", "sat"]).unwrap(), vec![1]);
}

#[test]
fn unknown_term_yields_no_documents() {
    let qp = processor(&[(1, "the cat sat on the mat")], PositionMode::Source);
    assert!(qp.conjunctive_query(&["dog"]).is_empty());
    assert!(qp.conjunctive_query(&["cat", "dog"]).is_empty());
    assert!(qp.phrase_query(&["cat", "dog"]).unwrap().is_empty());
}

#[test]
fn phrase_respects_order() {
    let qp = processor(&[(1, "alpha beta"), (2, "beta alpha")], PositionMode::Source);
    assert_eq!(qp.conjunctive_query(&["alpha", "beta"]), vec![1, 2]);
    assert_eq!(qp.phrase_query(&["alpha", "beta"]).unwrap(), vec![1]);
    assert_eq!(qp.phrase_query(&["beta", "alpha"]).unwrap(), vec![2]);
}

fn corpus() -> QueryProcessor {
    processor(
        &[
            (1, "gold prices rose sharply as gold demand grew"),
            (2, "silver prices fell while gold prices rose"),
            (3, "prices of gold and silver rose"),
            (4, "demand for silver grew"),
            (5, "gold gold gold"),
            (8, "rose gold jewellery prices"),
        ],
        PositionMode::Source,
    )
}

#[test]
fn single_term_returns_full_posting_list() {
    assert_eq!(corpus().conjunctive_query(&["gold"]), vec![1, 2, 3, 5, 8]);
}

#[test]
fn conjunctive_is_monotone() {
    let qp = corpus();
    let a = qp.conjunctive_query(&["gold"]);
    let ab = qp.conjunctive_query(&["gold", "prices"]);
    let abc = qp.conjunctive_query(&["gold", "prices", "rose"]);
    assert!(ab.iter().all(|d| a.contains(d)));
    assert!(abc.iter().all(|d| ab.contains(d)));
    assert_eq!(abc, vec![1, 2, 3, 8]);
}

#[test]
fn phrase_matches_are_conjunctive_matches() {
    let qp = corpus();
    let terms = ["gold", "prices"];
    let phrase = qp.phrase_query(&terms).unwrap();
    let conj = qp.conjunctive_query(&terms);
    assert_eq!(phrase, vec![1, 2]);
    assert!(phrase.iter().all(|d| conj.contains(d)));
}

#[test]
fn phrase_equals_zero_distance_proximity() {
    let qp = corpus();
    for terms in [vec!["gold", "prices"], vec!["prices", "rose"], vec!["gold", "gold", "gold"], vec!["silver"]] {
        let zeros = vec![0; terms.len() - 1];
        assert_eq!(qp.phrase_query(&terms).unwrap(), qp.proximity_query(&terms, &zeros).unwrap(), "{terms:?}");
    }
}

#[test]
fn proximity_backtracks_over_repeated_terms() {
    let qp = corpus();
    // doc 1: gold@0 prices@1 rose@2 ... gold@5 demand@6 grew@7
    assert_eq!(qp.proximity_query(&["gold", "demand", "grew"], &[0, 0]).unwrap(), vec![1]);
    // doc 2: gold@4 prices@5 rose@6, and the earlier prices@1 must not satisfy the chain
    assert_eq!(qp.proximity_query(&["prices", "rose"], &[0]).unwrap(), vec![1, 2]);
    assert_eq!(qp.proximity_query(&["silver", "rose"], &[1]).unwrap(), vec![3]);
    assert_eq!(qp.proximity_query(&["gold", "gold", "gold"], &[0, 0]).unwrap(), vec![5]);
}

#[test]
fn parsed_queries_run_end_to_end() {
    let qp = processor(&[(1, "the cat sat on the mat"), (2, "a mat for the cat")], PositionMode::Source);
    let n = normalizer();
    let run = |q: &str| qp.execute(&parse_query(&n, q, qp.position_mode()).unwrap()).unwrap();

    assert_eq!(run("1 cat AND mat"), vec![1, 2]);
    assert_eq!(run("2 sat on the mat"), vec![1]);
    assert_eq!(run("3 cat /0 sat"), vec![1]);
    assert_eq!(run("3 mat /2 cat"), vec![2]);
    assert!(run("2 the on").is_empty());
    assert!(matches!(parse_query(&n, "2 the", qp.position_mode()).unwrap(), ParsedQuery::Phrase(t) if t.is_empty()));
}
