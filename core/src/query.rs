//! Ranked retrieval over an [`IndexSnapshot`] with the lnc.ltc scheme.
//!
//! Query terms are weighted `(1 + log10 tf) * log10(N / df)` and
//! cosine-normalized; document weights are stored as `1 + log10 tf` and
//! divided by the document length while scoring.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use thiserror::Error;

use crate::builder::log_tf;
use crate::config::TOP_K_RESULTS;
use crate::index::{DocId, IndexSnapshot};
use crate::soundex::soundex;
use crate::spell::correct_term;
use crate::tokenizer::tokenize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    #[serde(default)]
    pub use_soundex: bool,
    #[serde(default)]
    pub use_spell_correction: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub document: String,
    pub score: f64,
}

#[derive(Debug, Error)]
enum QueryError {
    #[error("query interrupted")]
    Interrupted,
    #[error("non-finite score for doc {0}")]
    NonFiniteScore(DocId),
}

/// Top [`TOP_K_RESULTS`] documents for `query`, best first.
///
/// Never fails: a query with no usable terms, or one that faults while
/// scoring, yields an empty list.
pub fn search(query: &str, snapshot: &IndexSnapshot, options: SearchOptions) -> Vec<SearchHit> {
    let never = AtomicBool::new(false);
    search_interruptible(query, snapshot, options, &never)
}

/// Like [`search`], but gives up with an empty result once `interrupt` is set.
pub fn search_interruptible(
    query: &str,
    snapshot: &IndexSnapshot,
    options: SearchOptions,
    interrupt: &AtomicBool,
) -> Vec<SearchHit> {
    match rank(query, snapshot, options, interrupt) {
        Ok(hits) => hits,
        Err(e) => {
            tracing::warn!(error = %e, query, "query degraded to empty result");
            Vec::new()
        }
    }
}

fn rank(
    query: &str,
    snapshot: &IndexSnapshot,
    options: SearchOptions,
    interrupt: &AtomicBool,
) -> Result<Vec<SearchHit>, QueryError> {
    let mut tokens = tokenize(query);
    if tokens.is_empty() {
        return Ok(Vec::new());
    }

    if options.use_spell_correction {
        tokens = tokens.iter().map(|t| correct_term(t, snapshot.dictionary.keys())).collect();
        tracing::debug!(?tokens, "spell corrected query");
    }

    if options.use_soundex && !snapshot.soundex_map.is_empty() {
        let mut expanded: BTreeSet<String> = tokens.iter().cloned().collect();
        for token in &tokens {
            if let Some(similar) = snapshot.soundex_map.get(&soundex(token)) {
                expanded.extend(similar.iter().cloned());
            }
        }
        tokens = expanded.into_iter().collect();
        tracing::debug!(?tokens, "soundex expanded query");
    }

    let q_weights = query_vector(&tokens, snapshot);
    if q_weights.is_empty() {
        return Ok(Vec::new());
    }

    // Aggregate cosine contributions; documents without a positive length never score
    let mut scores: HashMap<DocId, f64> = HashMap::new();
    for (term, q_w) in &q_weights {
        if interrupt.load(AtomicOrdering::Relaxed) {
            return Err(QueryError::Interrupted);
        }
        if *q_w <= 0.0 {
            continue;
        }
        let Some(entry) = snapshot.dictionary.get(*term) else { continue };
        for p in &entry.postings {
            match snapshot.doc_lengths.get(&p.doc_id) {
                Some(&len) if len > 0.0 => {
                    *scores.entry(p.doc_id).or_insert(0.0) += q_w * (p.weight / len);
                }
                _ => {}
            }
        }
    }

    let mut scored: Vec<(DocId, f64)> = scores.into_iter().collect();
    if let Some(&(doc_id, _)) = scored.iter().find(|(_, s)| !s.is_finite()) {
        return Err(QueryError::NonFiniteScore(doc_id));
    }
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));

    Ok(scored
        .into_iter()
        .take(TOP_K_RESULTS)
        .filter_map(|(doc_id, score)| {
            snapshot.doc_name(doc_id).map(|name| SearchHit { document: name.to_string(), score })
        })
        .collect())
}

/// ltc query vector over the terms known to the dictionary.
fn query_vector<'t>(tokens: &'t [String], snapshot: &IndexSnapshot) -> HashMap<&'t str, f64> {
    let mut tf_q_raw: HashMap<&str, u32> = HashMap::new();
    for token in tokens {
        if snapshot.dictionary.contains_key(token) {
            *tf_q_raw.entry(token.as_str()).or_insert(0) += 1;
        }
    }

    let n = snapshot.num_docs as f64;
    let mut q_weights: HashMap<&str, f64> = tf_q_raw
        .into_iter()
        .filter_map(|(term, tf_raw)| {
            let df = snapshot.dictionary.get(term)?.df;
            let idf = (n / df as f64).log10();
            Some((term, log_tf(tf_raw) * idf))
        })
        .collect();

    let norm = q_weights.values().map(|w| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        for w in q_weights.values_mut() {
            *w /= norm;
        }
    }
    q_weights
}
