use crate::index::Position;
use crate::normalizer::Normalizer;

pub(crate) fn is_separator(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0B' | '\x0C')
}

/// Splits text on ASCII whitespace, skipping empty pieces.
pub fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split(is_separator).filter(|t| !t.is_empty())
}

/// Tokenize text into (term, position). Positions are the token's index in the
/// raw split, so discarded tokens leave gaps in the numbering.
pub fn get_doc_terms(normalizer: &Normalizer, text: &str) -> Vec<(String, Position)> {
    tokenize(text)
        .enumerate()
        .filter_map(|(pos, token)| {
            let term = normalizer.normalize(token);
            (!term.is_empty()).then(|| (term, pos as Position))
        })
        .collect()
}
