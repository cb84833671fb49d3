//! Corpus sources: named text blobs enumerated in lexicographic order.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::CorpusError;

pub trait CorpusSource {
    /// Entry names in ascending lexicographic order.
    ///
    /// Fails only when the source as a whole cannot be enumerated.
    fn list(&self) -> Result<Vec<String>, CorpusError>;

    /// Raw bytes of one entry. A failure here affects that entry only.
    fn read(&self, name: &str) -> Result<Vec<u8>, CorpusError>;
}

/// Top-level regular files of a directory. A missing directory is an empty corpus.
#[derive(Debug, Clone)]
pub struct DirCorpus {
    root: PathBuf,
}

impl DirCorpus {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    pub fn root(&self) -> &Path { &self.root }
}

impl CorpusSource for DirCorpus {
    fn list(&self) -> Result<Vec<String>, CorpusError> {
        if !self.root.exists() {
            tracing::warn!(corpus = %self.root.display(), "corpus directory missing, treating as empty");
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        let walker = WalkDir::new(&self.root).min_depth(1).max_depth(1).follow_links(true);
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) if e.depth() == 0 => {
                    return Err(CorpusError::Unreachable { path: self.root.clone(), source: e.into() });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unlistable corpus entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() { continue; }
            match entry.file_name().to_str() {
                Some(name) => names.push(name.to_string()),
                None => tracing::warn!(path = %entry.path().display(), "skipping non UTF-8 file name"),
            }
        }
        names.sort();
        Ok(names)
    }

    fn read(&self, name: &str) -> Result<Vec<u8>, CorpusError> {
        fs::read(self.root.join(name)).map_err(|source| CorpusError::Read { name: name.to_string(), source })
    }
}

/// In-memory corpus. Entries inserted with [`MemoryCorpus::insert_unreadable`]
/// fail on read, which lets callers exercise the skip path.
#[derive(Debug, Clone, Default)]
pub struct MemoryCorpus {
    entries: BTreeMap<String, Option<Vec<u8>>>,
}

impl MemoryCorpus {
    pub fn new() -> Self { Self::default() }

    pub fn insert<N: Into<String>, C: Into<Vec<u8>>>(&mut self, name: N, content: C) {
        self.entries.insert(name.into(), Some(content.into()));
    }

    pub fn insert_unreadable<N: Into<String>>(&mut self, name: N) {
        self.entries.insert(name.into(), None);
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

impl<N: Into<String>, C: Into<Vec<u8>>> FromIterator<(N, C)> for MemoryCorpus {
    fn from_iter<T: IntoIterator<Item = (N, C)>>(iter: T) -> Self {
        let mut corpus = MemoryCorpus::new();
        for (name, content) in iter {
            corpus.insert(name, content);
        }
        corpus
    }
}

impl CorpusSource for MemoryCorpus {
    fn list(&self) -> Result<Vec<String>, CorpusError> {
        Ok(self.entries.keys().cloned().collect())
    }

    fn read(&self, name: &str) -> Result<Vec<u8>, CorpusError> {
        match self.entries.get(name) {
            Some(Some(bytes)) => Ok(bytes.clone()),
            Some(None) => Err(CorpusError::Read {
                name: name.to_string(),
                source: io::Error::new(io::ErrorKind::InvalidData, "entry marked unreadable"),
            }),
            None => Err(CorpusError::Read {
                name: name.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such entry"),
            }),
        }
    }
}

/// Decode UTF-8, dropping invalid byte sequences instead of replacing them.
pub fn decode_text(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_drops_invalid_bytes() {
        assert_eq!(decode_text(b"ca\xfft dog"), "cat dog");
        assert_eq!(decode_text("café".as_bytes()), "café");
    }

    #[test]
    fn memory_corpus_lists_sorted() {
        let corpus: MemoryCorpus = [("b.txt", "x"), ("a.txt", "y")].into_iter().collect();
        assert_eq!(corpus.list().unwrap(), vec!["a.txt", "b.txt"]);
        assert_eq!(corpus.read("a.txt").unwrap(), b"y");
        assert!(corpus.read("zzz").is_err());
    }

    #[test]
    fn missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = DirCorpus::new(dir.path().join("nope"));
        assert!(corpus.list().unwrap().is_empty());
    }

    #[test]
    fn directory_lists_top_level_files_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("c.txt"), "c").unwrap();
        let corpus = DirCorpus::new(dir.path());
        assert_eq!(corpus.list().unwrap(), vec!["a.txt", "b.txt"]);
        assert_eq!(corpus.read("b.txt").unwrap(), b"b");
    }
}
