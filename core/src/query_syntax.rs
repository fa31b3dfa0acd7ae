//! Front-end query language.
//!
//! A query is `<type> <body>`:
//!
//! * `1 w1 AND w2 AND ... AND wn`: conjunctive
//! * `2 w1 w2 ... wn`: phrase
//! * `3 w1 /k1 w2 /k2 ... wn`: proximity, `ki` being the maximum number of
//!   positions allowed between consecutive words
//!
//! Words go through the same [`Normalizer`] as documents.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{IrError, Result};
use crate::index::PositionMode;
use crate::normalizer::Normalizer;
use crate::tokenizer::{is_separator, tokenize};

lazy_static! {
    static ref DISTANCE: Regex = Regex::new(r"^/(\d+)$").expect("valid regex");
}

pub const USAGE: &str = "Your query must be in the format: <query_type> <query>\nwhere\n\
    \tquery_type == 1 --> conjunctive query:\t<w1> AND <w2> AND ... AND <wn>\n\
    \tquery_type == 2 --> phrase query:\t<w1> <w2> ... <wn>\n\
    \tquery_type == 3 --> proximity query:\t<w1> /k1 <w2> /k2 ... /kn <wn+1>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedQuery {
    Conjunctive(Vec<String>),
    Phrase(Vec<String>),
    Proximity { terms: Vec<String>, distances: Vec<usize> },
}

impl ParsedQuery {
    pub fn kind(&self) -> &'static str {
        match self {
            ParsedQuery::Conjunctive(_) => "conjunctive",
            ParsedQuery::Phrase(_) => "phrase",
            ParsedQuery::Proximity { .. } => "proximity",
        }
    }

    pub fn terms(&self) -> &[String] {
        match self {
            ParsedQuery::Conjunctive(terms) | ParsedQuery::Phrase(terms) => terms,
            ParsedQuery::Proximity { terms, .. } => terms,
        }
    }
}

/// Parses and normalizes a query string.
///
/// Words that normalize to nothing are removed. In phrase and proximity
/// queries the gaps around a removed word are merged; under
/// [`PositionMode::Source`] the removed word still occupies a position, so the
/// merged gap grows by one. A phrase whose gaps grew becomes a proximity query.
pub fn parse_query(normalizer: &Normalizer, input: &str, mode: PositionMode) -> Result<ParsedQuery> {
    let input = input.trim_end_matches(['\r', '\n']);
    let bytes = input.as_bytes();
    let well_formed = bytes.len() > 2
        && matches!(bytes[0], b'1' | b'2' | b'3')
        && bytes[1] == b' '
        && !is_separator(bytes[2] as char);
    if !well_formed {
        return Err(IrError::invalid_query(USAGE));
    }
    let tokens: Vec<&str> = tokenize(&input[2..]).collect();
    if tokens.is_empty() {
        return Err(IrError::invalid_query(USAGE));
    }

    match bytes[0] {
        b'1' => {
            if tokens.len() % 2 == 0 {
                return Err(IrError::invalid_query("Invalid conjunctive query"));
            }
            let mut words = Vec::with_capacity(tokens.len() / 2 + 1);
            for (i, token) in tokens.iter().enumerate() {
                if i % 2 == 0 {
                    words.push(*token);
                } else if *token != "AND" {
                    return Err(IrError::invalid_query("Invalid conjunctive query"));
                }
            }
            Ok(ParsedQuery::Conjunctive(normalizer.normalize_all(&words)))
        }
        b'2' => {
            let distances = vec![0; tokens.len() - 1];
            let (terms, distances) = normalize_chain(normalizer, &tokens, &distances, mode)?;
            if distances.iter().all(|&d| d == 0) {
                Ok(ParsedQuery::Phrase(terms))
            } else {
                Ok(ParsedQuery::Proximity { terms, distances })
            }
        }
        _ => {
            if tokens.len() % 2 == 0 {
                return Err(IrError::invalid_query("Invalid proximity query"));
            }
            let mut words = Vec::with_capacity(tokens.len() / 2 + 1);
            let mut distances = Vec::with_capacity(tokens.len() / 2);
            for (i, token) in tokens.iter().enumerate() {
                if i % 2 == 0 {
                    words.push(*token);
                    continue;
                }
                let dist = DISTANCE
                    .captures(token)
                    .and_then(|c| c[1].parse::<usize>().ok())
                    .ok_or_else(|| IrError::invalid_query("Invalid proximity query"))?;
                distances.push(dist);
            }
            let (terms, distances) = normalize_chain(normalizer, &words, &distances, mode)?;
            Ok(ParsedQuery::Proximity { terms, distances })
        }
    }
}

/// Normalizes an ordered word chain, folding the gaps of dropped words into
/// the gap between the surviving neighbours.
fn normalize_chain(
    normalizer: &Normalizer,
    words: &[&str],
    distances: &[usize],
    mode: PositionMode,
) -> Result<(Vec<String>, Vec<usize>)> {
    let occupied = match mode {
        PositionMode::Source => 1,
        PositionMode::Compact => 0,
    };
    let mut terms = Vec::with_capacity(words.len());
    let mut gaps = Vec::with_capacity(distances.len());
    let mut pending: Option<usize> = None;

    for (i, word) in words.iter().enumerate() {
        if i > 0 {
            let d = distances[i - 1];
            let merged = match pending {
                None => Some(d),
                Some(acc) => acc.checked_add(occupied).and_then(|g| g.checked_add(d)),
            };
            pending = Some(merged.ok_or_else(|| IrError::invalid_query("proximity distance too large"))?);
        }
        let term = normalizer.normalize(word);
        if term.is_empty() {
            if terms.is_empty() {
                pending = None;
            }
            continue;
        }
        if let Some(gap) = pending.take() {
            if !terms.is_empty() {
                gaps.push(gap);
            }
        }
        terms.push(term);
    }
    Ok((terms, gaps))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stemmer::IdentityStemmer;
    use crate::stopwords::StopwordSet;

    fn normalizer() -> Normalizer {
        Normalizer::new(StopwordSet::parse("the on a").unwrap(), IdentityStemmer)
    }

    fn parse(q: &str) -> Result<ParsedQuery> {
        parse_query(&normalizer(), q, PositionMode::Source)
    }

    #[test]
    fn parses_conjunctive() {
        assert_eq!(
            parse("1 Cat AND the AND mat").unwrap(),
            ParsedQuery::Conjunctive(vec!["cat".into(), "mat".into()])
        );
        assert!(parse("1 cat mat").is_err());
        assert!(parse("1 cat AND").is_err());
    }

    #[test]
    fn parses_phrase() {
        assert_eq!(parse("2 cat sat").unwrap(), ParsedQuery::Phrase(vec!["cat".into(), "sat".into()]));
    }

    #[test]
    fn phrase_with_stopword_becomes_proximity() {
        assert_eq!(
            parse("2 sat on mat").unwrap(),
            ParsedQuery::Proximity { terms: vec!["sat".into(), "mat".into()], distances: vec![1] }
        );
        let compact = parse_query(&normalizer(), "2 sat on mat", PositionMode::Compact).unwrap();
        assert_eq!(compact, ParsedQuery::Phrase(vec!["sat".into(), "mat".into()]));
    }

    #[test]
    fn parses_proximity_and_merges_gaps() {
        assert_eq!(
            parse("3 cat /2 mat").unwrap(),
            ParsedQuery::Proximity { terms: vec!["cat".into(), "mat".into()], distances: vec![2] }
        );
        assert_eq!(
            parse("3 cat /2 the /1 mat").unwrap(),
            ParsedQuery::Proximity { terms: vec!["cat".into(), "mat".into()], distances: vec![4] }
        );
        assert_eq!(
            parse("3 the /1 cat /2 mat /3 a").unwrap(),
            ParsedQuery::Proximity { terms: vec!["cat".into(), "mat".into()], distances: vec![2] }
        );
    }

    #[test]
    fn rejects_bad_distances() {
        assert!(parse("3 cat /x mat").is_err());
        assert!(parse("3 cat / mat").is_err());
        assert!(parse("3 cat 2 mat").is_err());
        assert!(parse("3 cat /2").is_err());
    }

    #[test]
    fn rejects_bodies_of_separators_only() {
        for q in ["2 \x0B", "1 \x0C", "3 \x0B\x0B", "2 \x0B\t"] {
            assert!(matches!(parse(q), Err(IrError::InvalidQuery(_))), "query {q:?}");
        }
    }

    #[test]
    fn rejects_gap_overflow() {
        let q = format!("3 cat /{} the /1 mat", usize::MAX);
        assert!(matches!(parse(&q), Err(IrError::InvalidQuery(_))));
        let q = format!("3 cat /{} mat", usize::MAX);
        assert_eq!(
            parse(&q).unwrap(),
            ParsedQuery::Proximity { terms: vec!["cat".into(), "mat".into()], distances: vec![usize::MAX] }
        );
    }

    #[test]
    fn rejects_bad_headers() {
        for q in ["", "1", "1 ", "4 cat", "1  cat", "1cat"] {
            assert!(matches!(parse(q), Err(IrError::InvalidQuery(_))), "query {q:?}");
        }
    }
}
