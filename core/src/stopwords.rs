use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::error::{IrError, Result};

/// English stopwords used when no list is supplied. Entries are stored in the
/// form a token takes after punctuation stripping, so contractions are absent.
pub const DEFAULT_STOPWORDS: &[&str] = &[
    "a","about","above","after","again","against","all","am","an","and","any","are","as","at",
    "be","because","been","before","being","below","between","both","but","by",
    "can","cannot","could",
    "did","do","does","doing","down","during",
    "each","few","for","from","further",
    "had","has","have","having","he","her","here","hers","herself","him","himself","his","how",
    "i","if","in","into","is","it","its","itself",
    "me","more","most","my","myself",
    "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
    "same","she","should","so","some","such",
    "than","that","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
    "under","until","up","very",
    "was","we","were","what","when","where","which","while","who","whom","why","with","would",
    "you","your","yours","yourself","yourselves",
];

/// Sorted set of terms discarded by the normalizer.
#[derive(Debug, Clone)]
pub struct StopwordSet {
    words: BTreeSet<String>,
}

impl StopwordSet {
    /// Builds a set from a whitespace/newline delimited word list.
    pub fn parse(list: &str) -> Result<Self> {
        Self::from_words(list.split_whitespace())
    }

    pub fn from_words<I, S>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words: BTreeSet<String> = words.into_iter().map(Into::into).collect();
        if words.is_empty() {
            return Err(IrError::EmptyStopwords);
        }
        Ok(Self { words })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let list = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => IrError::MissingArtifact { path: path.to_path_buf() },
            _ => IrError::Io(e),
        })?;
        let set = Self::parse(&list)?;
        tracing::debug!(path = %path.display(), count = set.len(), "loaded stopwords");
        Ok(set)
    }

    pub fn english() -> Self {
        Self { words: DEFAULT_STOPWORDS.iter().map(|w| w.to_string()).collect() }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_any_whitespace() {
        let set = StopwordSet::parse("the\nand  of\tto\r\n").unwrap();
        assert_eq!(set.len(), 4);
        assert!(set.contains("of"));
        assert!(!set.contains("cat"));
    }

    #[test]
    fn empty_list_is_rejected() {
        assert!(matches!(StopwordSet::parse(" \n\t"), Err(IrError::EmptyStopwords)));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = StopwordSet::load("/definitely/not/here/stopwords.txt").unwrap_err();
        assert!(err.is_missing_artifact());
    }

    #[test]
    fn english_defaults_have_no_punctuation() {
        let set = StopwordSet::english();
        assert!(set.contains("the"));
        assert!(DEFAULT_STOPWORDS.iter().all(|w| w.chars().all(|c| c.is_ascii_lowercase())));
    }
}
