use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CorpusError {
    /// The corpus as a whole cannot be enumerated.
    #[error("corpus at {path:?} is unreachable: {source}")]
    Unreachable { path: PathBuf, source: std::io::Error },
    /// A single entry failed to read; the builder skips it.
    #[error("failed to read corpus entry {name}: {source}")]
    Read { name: String, source: std::io::Error },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("index store I/O error at {path:?}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("snapshot {path:?} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },
    #[error("failed to encode snapshot: {0}")]
    Encode(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Corpus(#[from] CorpusError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
