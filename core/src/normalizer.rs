use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use crate::stemmer::{IdentityStemmer, SnowballStemmer, Stemmer};
use crate::stopwords::StopwordSet;

/// Characters deleted from anywhere inside a token. The apostrophe doubles as
/// the marker for removable punctuation, so it is deleted as well.
const INNER_PUNCTUATION: [char; 5] = ['"', ',', '<', '>', '\''];

/// Turns raw tokens into index terms: punctuation stripping, ASCII case folding,
/// stopword removal and stemming, in that order.
#[derive(Clone)]
pub struct Normalizer {
    stopwords: Arc<StopwordSet>,
    stemmer: Arc<dyn Stemmer>,
}

impl Normalizer {
    pub fn new(stopwords: StopwordSet, stemmer: impl Stemmer + 'static) -> Self {
        Self { stopwords: Arc::new(stopwords), stemmer: Arc::new(stemmer) }
    }

    /// English stopwords and the Snowball stemmer.
    pub fn english() -> Self {
        Self::new(StopwordSet::english(), SnowballStemmer::english())
    }

    /// Loads the stopword list from `stopwords` when given, falling back to the
    /// built-in English list.
    pub fn from_config(stopwords: Option<&Path>, stem: bool) -> Result<Self> {
        let set = match stopwords {
            Some(path) => StopwordSet::load(path)?,
            None => StopwordSet::english(),
        };
        Ok(if stem {
            Self::new(set, SnowballStemmer::english())
        } else {
            Self::new(set, IdentityStemmer)
        })
    }

    /// Returns the term for `token`, or an empty string if it should be discarded.
    pub fn normalize(&self, token: &str) -> String {
        let mut term = strip_punctuation(token);
        if term.is_empty() {
            return term;
        }
        term.make_ascii_lowercase();
        if self.stopwords.contains(&term) {
            return String::new();
        }
        self.stemmer.stem(&term)
    }

    /// Normalizes every word, dropping the ones that normalize to nothing.
    pub fn normalize_all<S: AsRef<str>>(&self, words: &[S]) -> Vec<String> {
        words
            .iter()
            .map(|w| self.normalize(w.as_ref()))
            .filter(|t| !t.is_empty())
            .collect()
    }
}

impl std::fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Normalizer").field("stopwords", &self.stopwords.len()).finish()
    }
}

/// Deletes the inner punctuation set, then trims non-alphanumeric characters
/// from both ends.
pub fn strip_punctuation(token: &str) -> String {
    let inner: String = token.chars().filter(|c| !INNER_PUNCTUATION.contains(c)).collect();
    inner.trim_matches(|c: char| !c.is_ascii_alphanumeric()).to_string()
}
