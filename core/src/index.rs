use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::soundex::PhoneticMap;

/// 1-based document identifier, assigned in corpus enumeration order.
pub type DocId = u32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub weight: f64, // 1 + log10(tf), cosine-normalized at query time
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DictEntry {
    pub df: u32,
    pub postings: Vec<Posting>, // ascending doc_id, one per document
}

/// Complete, immutable index state consumed by queries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub dictionary: BTreeMap<String, DictEntry>,
    /// Euclidean norm of each document's weight vector; absent for documents with no terms.
    pub doc_lengths: HashMap<DocId, f64>,
    pub doc_ids: HashMap<String, DocId>,
    pub id_to_doc: HashMap<DocId, String>,
    pub num_docs: u32,
    pub soundex_map: PhoneticMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub num_docs: u32,
    pub num_terms: usize,
    pub num_soundex_codes: usize,
}

impl IndexSnapshot {
    pub fn empty() -> Self { Self::default() }

    pub fn is_empty(&self) -> bool { self.num_docs == 0 }

    pub fn doc_name(&self, doc_id: DocId) -> Option<&str> {
        self.id_to_doc.get(&doc_id).map(String::as_str)
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            num_docs: self.num_docs,
            num_terms: self.dictionary.len(),
            num_soundex_codes: self.soundex_map.len(),
        }
    }
}
