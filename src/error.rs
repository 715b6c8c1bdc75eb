use thiserror::Error;

/// Failure to produce a target text from a word list or quote list
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown word list `{0}`")]
    UnknownList(String),
    #[error("word list `{list}` is malformed: {reason}")]
    Malformed { list: String, reason: String },
}

/// Failure to record or read back finished results
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("stored result is invalid: {0}")]
    InvalidRecord(String),
}
