pub mod builder;
pub mod corpus;
pub mod error;
pub mod index;
pub mod normalizer;
pub mod persist;
pub mod query;
pub mod query_syntax;
pub mod stemmer;
pub mod stopwords;
pub mod tokenizer;

pub use error::{IrError, Result};
pub use index::{Dictionary, DocId, PositionalIndex, Position, Posting, TermId};
pub use normalizer::Normalizer;
pub use query::QueryProcessor;
