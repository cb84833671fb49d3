use parking_lot::{Mutex, RwLock};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::builder::build_index;
use crate::config::EngineConfig;
use crate::corpus::{CorpusSource, DirCorpus};
use crate::error::EngineError;
use crate::index::{IndexSnapshot, IndexStats};
use crate::persist::IndexStore;
use crate::query::{self, SearchHit, SearchOptions};

/// Long-lived owner of the current index.
///
/// Queries clone the current `Arc<IndexSnapshot>` and run against it without
/// further locking. A rebuild produces a complete new snapshot, persists it,
/// then swaps the handle, so readers observe either the old or the new index.
pub struct SearchEngine {
    corpus: Box<dyn CorpusSource + Send + Sync>,
    store: IndexStore,
    /// Published snapshot and the number of snapshots published so far.
    current: RwLock<(u64, Arc<IndexSnapshot>)>,
    rebuild_lock: Mutex<()>,
}

impl SearchEngine {
    /// Open the engine over a corpus directory, loading the persisted snapshot
    /// or building one when none is usable.
    pub fn open(config: &EngineConfig) -> Result<Self, EngineError> {
        Self::with_source(DirCorpus::new(&config.corpus_dir), IndexStore::new(&config.index_dir))
    }

    pub fn with_source<C>(corpus: C, store: IndexStore) -> Result<Self, EngineError>
    where
        C: CorpusSource + Send + Sync + 'static,
    {
        store.ensure_dir()?;
        let engine = Self {
            corpus: Box::new(corpus),
            store,
            current: RwLock::new((0, Arc::new(IndexSnapshot::empty()))),
            rebuild_lock: Mutex::new(()),
        };

        match engine.store.load() {
            Ok(Some(snapshot)) => {
                engine.install(snapshot);
            }
            Ok(None) => {
                tracing::info!(index = %engine.store.root.display(), "no usable snapshot, building index");
                engine.rebuild_index()?;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load snapshot, rebuilding index");
                engine.rebuild_index()?;
            }
        }
        Ok(engine)
    }

    /// Rebuild from the corpus, persist, then publish the new snapshot.
    ///
    /// Concurrent rebuilds are serialised. On failure the previous snapshot stays current.
    pub fn rebuild_index(&self) -> Result<IndexStats, EngineError> {
        let _guard = self.rebuild_lock.lock();
        let snapshot = build_index(self.corpus.as_ref())?;
        self.store.save(&snapshot)?;
        let stats = snapshot.stats();
        let generation = self.install(snapshot);
        tracing::info!(generation, num_docs = stats.num_docs, num_terms = stats.num_terms, "index rebuilt");
        Ok(stats)
    }

    pub fn search(&self, query: &str, options: SearchOptions) -> Vec<SearchHit> {
        let snapshot = self.snapshot();
        query::search(query, &snapshot, options)
    }

    pub fn search_interruptible(&self, query: &str, options: SearchOptions, interrupt: &AtomicBool) -> Vec<SearchHit> {
        let snapshot = self.snapshot();
        query::search_interruptible(query, &snapshot, options, interrupt)
    }

    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.current.read().1.clone()
    }

    /// Number of snapshots published since the engine was opened.
    pub fn generation(&self) -> u64 {
        self.current.read().0
    }

    pub fn stats(&self) -> IndexStats {
        self.snapshot().stats()
    }

    pub fn store(&self) -> &IndexStore { &self.store }

    fn install(&self, snapshot: IndexSnapshot) -> u64 {
        let mut current = self.current.write();
        let generation = current.0 + 1;
        *current = (generation, Arc::new(snapshot));
        generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::MemoryCorpus;
    use tempfile::tempdir;

    #[test]
    fn builds_when_no_snapshot_and_reuses_it_later() {
        let dir = tempdir().unwrap();
        let corpus: MemoryCorpus = [("a.txt", "cat dog cat"), ("b.txt", "dog bird")].into_iter().collect();
        let engine = SearchEngine::with_source(corpus, IndexStore::new(dir.path())).unwrap();
        assert_eq!(engine.generation(), 1);
        assert!(engine.store().snapshot_path().exists());

        // an empty corpus would give an empty index, so a hit proves the snapshot was loaded
        let reopened = SearchEngine::with_source(MemoryCorpus::new(), IndexStore::new(dir.path())).unwrap();
        assert_eq!(reopened.stats().num_docs, 2);
        assert_eq!(reopened.search("cat", SearchOptions::default())[0].document, "a.txt");
    }

    #[test]
    fn rebuild_swaps_snapshot_and_keeps_old_handles_intact() {
        let dir = tempdir().unwrap();
        let corpus: MemoryCorpus = [("a.txt", "cat")].into_iter().collect();
        let engine = SearchEngine::with_source(corpus, IndexStore::new(dir.path())).unwrap();
        let before = engine.snapshot();
        engine.rebuild_index().unwrap();
        let after = engine.snapshot();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(*before, *after);
        assert_eq!(engine.generation(), 2);
    }

    #[test]
    fn interrupt_flag_reaches_the_query() {
        let dir = tempdir().unwrap();
        let corpus: MemoryCorpus = [("a.txt", "cat dog cat"), ("b.txt", "dog bird")].into_iter().collect();
        let engine = SearchEngine::with_source(corpus, IndexStore::new(dir.path())).unwrap();
        let opts = SearchOptions { use_spell_correction: true, ..Default::default() };

        let flag = AtomicBool::new(true);
        assert!(engine.search_interruptible("cat", opts, &flag).is_empty());

        flag.store(false, std::sync::atomic::Ordering::SeqCst);
        let hits = engine.search_interruptible("cat", opts, &flag);
        assert_eq!(hits, engine.search("cat", opts));
        assert_eq!(hits[0].document, "a.txt");
    }
}
