pub mod builder;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod index;
pub mod persist;
pub mod query;
pub mod soundex;
pub mod spell;
pub mod tokenizer;

pub use config::EngineConfig;
pub use corpus::{CorpusSource, DirCorpus, MemoryCorpus};
pub use engine::SearchEngine;
pub use error::{CorpusError, EngineError, StoreError};
pub use builder::build_index;
pub use index::{DictEntry, DocId, IndexSnapshot, IndexStats, Posting};
pub use persist::IndexStore;
pub use query::{search, search_interruptible, SearchHit, SearchOptions};
