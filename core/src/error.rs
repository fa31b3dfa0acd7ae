use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IrError {
    /// A dictionary or index file was not found at load time.
    #[error("{} does not exist", path.display())]
    MissingArtifact { path: PathBuf },

    /// A persisted record does not follow the expected tag/field layout.
    #[error("malformed index at line {line}: {reason}")]
    MalformedIndex { line: usize, reason: String },

    #[error("document {0} was added twice")]
    DuplicateDocument(u32),

    #[error("malformed corpus: {0}")]
    MalformedCorpus(String),

    #[error("stopword list is empty")]
    EmptyStopwords,

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, IrError>;

impl IrError {
    pub fn malformed<S: Into<String>>(line: usize, reason: S) -> Self {
        IrError::MalformedIndex { line, reason: reason.into() }
    }

    pub fn invalid_query<S: Into<String>>(msg: S) -> Self {
        IrError::InvalidQuery(msg.into())
    }

    pub fn is_missing_artifact(&self) -> bool {
        matches!(self, IrError::MissingArtifact { .. })
    }
}
