use std::collections::{BTreeMap, HashMap};

use crate::corpus::{decode_text, CorpusSource};
use crate::error::CorpusError;
use crate::index::{DictEntry, DocId, IndexSnapshot, Posting};
use crate::soundex::precompute_soundex_map;
use crate::tokenizer::tokenize;

/// Build a snapshot from every entry of `corpus`.
///
/// Entries get doc ids `1..=N` in listing order. An entry that fails to read
/// keeps its id but contributes no postings; only a failure to list the
/// corpus aborts the build.
pub fn build_index<C: CorpusSource + ?Sized>(corpus: &C) -> Result<IndexSnapshot, CorpusError> {
    let names = corpus.list()?;
    if names.is_empty() {
        tracing::info!("corpus is empty, built empty index");
        return Ok(IndexSnapshot::empty());
    }

    let mut dictionary: BTreeMap<String, DictEntry> = BTreeMap::new();
    let mut doc_ids: HashMap<String, DocId> = HashMap::with_capacity(names.len());
    let mut id_to_doc: HashMap<DocId, String> = HashMap::with_capacity(names.len());
    let mut skipped = 0usize;

    for (doc_id, name) in (1..).zip(names.iter()) {
        doc_ids.insert(name.clone(), doc_id);
        id_to_doc.insert(doc_id, name.clone());

        let text = match corpus.read(name) {
            Ok(bytes) => decode_text(&bytes),
            Err(e) => {
                tracing::warn!(doc_id, error = %e, "skipping unreadable document");
                skipped += 1;
                continue;
            }
        };

        let mut tf_counts: HashMap<String, u32> = HashMap::new();
        for term in tokenize(&text) {
            *tf_counts.entry(term).or_insert(0) += 1;
        }
        if tf_counts.is_empty() {
            tracing::debug!(doc_id, name = %name, "document has no terms");
            continue;
        }

        for (term, tf_raw) in tf_counts {
            let entry = dictionary.entry(term).or_default();
            entry.df += 1;
            entry.postings.push(Posting { doc_id, weight: log_tf(tf_raw) });
        }
    }

    let doc_lengths = document_lengths(&dictionary);
    let soundex_map = precompute_soundex_map(&dictionary);
    let num_docs = names.len() as u32;
    tracing::info!(num_docs, num_terms = dictionary.len(), skipped, "index build complete");

    Ok(IndexSnapshot { dictionary, doc_lengths, doc_ids, id_to_doc, num_docs, soundex_map })
}

/// `1 + log10(tf)` for a raw count of at least one.
pub(crate) fn log_tf(tf_raw: u32) -> f64 {
    1.0 + (tf_raw as f64).log10()
}

// Norm of each document's weight vector; documents without postings are left out.
fn document_lengths(dictionary: &BTreeMap<String, DictEntry>) -> HashMap<DocId, f64> {
    let mut squares: HashMap<DocId, f64> = HashMap::new();
    for entry in dictionary.values() {
        for p in &entry.postings {
            *squares.entry(p.doc_id).or_insert(0.0) += p.weight * p.weight;
        }
    }
    squares.into_iter().map(|(doc_id, sum)| (doc_id, sum.sqrt())).collect()
}
