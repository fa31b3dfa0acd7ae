use rust_stemmers::{Algorithm, Stemmer as SnowballImpl};

/// Reduces a normalized word to its stem. Implementations must be pure.
pub trait Stemmer: Send + Sync {
    fn stem(&self, word: &str) -> String;
}

impl<F> Stemmer for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn stem(&self, word: &str) -> String {
        self(word)
    }
}

/// English Snowball (Porter2) stemmer.
pub struct SnowballStemmer {
    inner: SnowballImpl,
}

impl SnowballStemmer {
    pub fn english() -> Self {
        Self { inner: SnowballImpl::create(Algorithm::English) }
    }
}

impl Default for SnowballStemmer {
    fn default() -> Self {
        Self::english()
    }
}

impl Stemmer for SnowballStemmer {
    fn stem(&self, word: &str) -> String {
        self.inner.stem(word).into_owned()
    }
}

/// Leaves words untouched; used when stemming is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityStemmer;

impl Stemmer for IdentityStemmer {
    fn stem(&self, word: &str) -> String {
        word.to_string()
    }
}
