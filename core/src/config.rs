use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Maximum number of ranked hits returned by a query.
pub const TOP_K_RESULTS: usize = 10;
/// Minimum similarity ratio for a spelling correction to be accepted.
pub const SPELL_CORRECTION_CUTOFF: f64 = 0.75;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory holding the corpus documents (top-level files only)
    pub corpus_dir: PathBuf,
    /// Directory the index snapshot is persisted to; created on first use
    pub index_dir: PathBuf,
}

impl EngineConfig {
    pub fn new<C: Into<PathBuf>, I: Into<PathBuf>>(corpus_dir: C, index_dir: I) -> Self {
        Self { corpus_dir: corpus_dir.into(), index_dir: index_dir.into() }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { corpus_dir: PathBuf::from("./corpus"), index_dir: PathBuf::from("./index") }
    }
}
