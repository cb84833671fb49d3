//! Snapshot persistence.
//!
//! The snapshot is stored as one blob `index.bin`:
//! `[magic "SIFT"][u32 LE format version][bincode payload][u32 LE CRC32 of payload]`.
//! Writes go to a temp file first and are renamed into place.

use serde::{Deserialize, Serialize};
use std::fs::{self, create_dir_all};
use std::io;
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::index::IndexSnapshot;

const MAGIC: &[u8; 4] = b"SIFT";
pub const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 8;
const FOOTER_LEN: usize = 4;

/// Operator-facing summary written next to the snapshot. Never read back by the engine.
#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_terms: usize,
    pub created_at: String,
    pub version: u32,
}

#[derive(Debug, Clone)]
pub struct IndexStore {
    pub root: PathBuf,
}

impl IndexStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn snapshot_path(&self) -> PathBuf { self.root.join("index.bin") }
    fn tmp_path(&self) -> PathBuf { self.root.join("index.bin.tmp") }
    pub fn meta_path(&self) -> PathBuf { self.root.join("meta.json") }

    /// Create the store directory if it does not exist yet.
    pub fn ensure_dir(&self) -> Result<(), StoreError> {
        create_dir_all(&self.root).map_err(|source| self.io_err(&self.root, source))
    }

    pub fn save(&self, snapshot: &IndexSnapshot) -> Result<(), StoreError> {
        self.ensure_dir()?;
        let payload = bincode::serialize(snapshot).map_err(|e| StoreError::Encode(e.to_string()))?;
        let crc = crc32fast::hash(&payload);

        let mut out = Vec::with_capacity(HEADER_LEN + payload.len() + FOOTER_LEN);
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        out.extend_from_slice(&payload);
        out.extend_from_slice(&crc.to_le_bytes());

        let tmp = self.tmp_path();
        let path = self.snapshot_path();
        fs::write(&tmp, &out).map_err(|source| self.io_err(&tmp, source))?;
        fs::rename(&tmp, &path).map_err(|source| self.io_err(&path, source))?;

        self.save_meta(snapshot)?;
        tracing::info!(path = %path.display(), bytes = out.len(), crc, "saved index snapshot");
        Ok(())
    }

    /// Load the persisted snapshot.
    ///
    /// `Ok(None)` when no snapshot exists or it was written by another format
    /// version; `Err(StoreError::Corrupt)` when the file is there but unreadable.
    pub fn load(&self) -> Result<Option<IndexSnapshot>, StoreError> {
        let path = self.snapshot_path();
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(self.io_err(&path, source)),
        };

        if raw.len() < HEADER_LEN + FOOTER_LEN || &raw[..4] != MAGIC {
            return Err(corrupt(&path, "missing snapshot header"));
        }
        let version = u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]);
        if version != FORMAT_VERSION {
            tracing::warn!(path = %path.display(), version, expected = FORMAT_VERSION, "snapshot format version mismatch, ignoring");
            return Ok(None);
        }

        let (payload, footer) = raw[HEADER_LEN..].split_at(raw.len() - HEADER_LEN - FOOTER_LEN);
        let stored_crc = u32::from_le_bytes([footer[0], footer[1], footer[2], footer[3]]);
        let computed_crc = crc32fast::hash(payload);
        if stored_crc != computed_crc {
            return Err(corrupt(
                &path,
                format!("CRC32 mismatch: expected {stored_crc:#010x}, got {computed_crc:#010x}"),
            ));
        }

        let snapshot: IndexSnapshot = bincode::deserialize(payload).map_err(|e| corrupt(&path, e.to_string()))?;
        tracing::info!(path = %path.display(), num_docs = snapshot.num_docs, num_terms = snapshot.dictionary.len(), "loaded index snapshot");
        Ok(Some(snapshot))
    }

    pub fn load_meta(&self) -> Result<MetaFile, StoreError> {
        let path = self.meta_path();
        let buf = fs::read_to_string(&path).map_err(|source| self.io_err(&path, source))?;
        serde_json::from_str(&buf).map_err(|e| corrupt(&path, e.to_string()))
    }

    fn save_meta(&self, snapshot: &IndexSnapshot) -> Result<(), StoreError> {
        let meta = MetaFile {
            num_docs: snapshot.num_docs,
            num_terms: snapshot.dictionary.len(),
            created_at: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_default(),
            version: FORMAT_VERSION,
        };
        let json = serde_json::to_string_pretty(&meta).map_err(|e| StoreError::Encode(e.to_string()))?;
        let path = self.meta_path();
        fs::write(&path, json).map_err(|source| self.io_err(&path, source))
    }

    fn io_err(&self, path: &Path, source: io::Error) -> StoreError {
        StoreError::Io { path: path.to_path_buf(), source }
    }
}

fn corrupt(path: &Path, reason: impl Into<String>) -> StoreError {
    StoreError::Corrupt { path: path.to_path_buf(), reason: reason.into() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_index;
    use crate::corpus::MemoryCorpus;
    use tempfile::tempdir;

    fn sample() -> IndexSnapshot {
        let corpus: MemoryCorpus = [("a.txt", "cat dog cat"), ("b.txt", "dog bird")].into_iter().collect();
        build_index(&corpus).unwrap()
    }

    #[test]
    fn missing_snapshot_is_absent() {
        let dir = tempdir().unwrap();
        let store = IndexStore::new(dir.path().join("index"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn round_trips_snapshot_and_writes_meta() {
        let dir = tempdir().unwrap();
        let store = IndexStore::new(dir.path().join("index"));
        let snap = sample();
        store.save(&snap).unwrap();
        assert_eq!(store.load().unwrap(), Some(snap));
        let meta = store.load_meta().unwrap();
        assert_eq!(meta.num_docs, 2);
        assert_eq!(meta.num_terms, 3);
        assert_eq!(meta.version, FORMAT_VERSION);
    }

    #[test]
    fn flipped_byte_is_corrupt() {
        let dir = tempdir().unwrap();
        let store = IndexStore::new(dir.path());
        store.save(&sample()).unwrap();
        let mut raw = fs::read(store.snapshot_path()).unwrap();
        let mid = raw.len() / 2;
        raw[mid] ^= 0xff;
        fs::write(store.snapshot_path(), raw).unwrap();
        assert!(matches!(store.load(), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn garbage_file_is_corrupt() {
        let dir = tempdir().unwrap();
        let store = IndexStore::new(dir.path());
        fs::write(store.snapshot_path(), b"not an index").unwrap();
        assert!(matches!(store.load(), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn other_version_is_absent() {
        let dir = tempdir().unwrap();
        let store = IndexStore::new(dir.path());
        store.save(&sample()).unwrap();
        let mut raw = fs::read(store.snapshot_path()).unwrap();
        raw[4..8].copy_from_slice(&(FORMAT_VERSION + 1).to_le_bytes());
        fs::write(store.snapshot_path(), raw).unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
