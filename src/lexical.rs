//! In-process inverted index with BM25 ranking.
//!
//! Scoring follows the FTS5 `bm25()` function (k1 = 1.2, b = 0.75, idf
//! clamped to 1e-6 when non-positive) but reports "higher is better" scores
//! directly, so no sign flip is needed downstream.

use std::collections::HashMap;

/// Term frequency saturation.
pub const BM25_K1: f64 = 1.2;
/// Document length normalization.
pub const BM25_B: f64 = 0.75;

/// Lowercase and split on anything that is not alphanumeric.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[derive(Debug, Clone)]
struct DocEntry {
    length: usize,
    /// Insertion order, used to break score ties.
    seq: u64,
    /// Distinct terms, so removal only touches their postings.
    terms: Vec<String>,
}

/// Term → postings (document id, term frequency), plus per-document lengths.
///
/// Document frequency of a term is the size of its posting map.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    postings: HashMap<String, HashMap<String, u32>>,
    docs: HashMap<String, DocEntry>,
    total_length: usize,
    next_seq: u64,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Number of documents containing `term` (already tokenized).
    pub fn document_frequency(&self, term: &str) -> usize {
        self.postings.get(term).map_or(0, HashMap::len)
    }

    /// Index `text` under `id`, replacing any previous entry.
    ///
    /// A replaced document keeps its original insertion position.
    pub fn insert(&mut self, id: &str, text: &str) {
        let seq = match self.remove_entry(id) {
            Some(previous) => previous.seq,
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                seq
            }
        };

        let tokens = tokenize(text);
        let length = tokens.len();
        for token in &tokens {
            *self
                .postings
                .entry(token.clone())
                .or_default()
                .entry(id.to_string())
                .or_insert(0) += 1;
        }

        let mut terms = tokens;
        terms.sort();
        terms.dedup();

        self.total_length += length;
        self.docs.insert(id.to_string(), DocEntry { length, seq, terms });
    }

    /// Drop `id` from the index. Returns whether it was present.
    pub fn remove(&mut self, id: &str) -> bool {
        self.remove_entry(id).is_some()
    }

    fn remove_entry(&mut self, id: &str) -> Option<DocEntry> {
        let entry = self.docs.remove(id)?;
        self.total_length -= entry.length;
        for term in &entry.terms {
            if let Some(docs) = self.postings.get_mut(term) {
                docs.remove(id);
                if docs.is_empty() {
                    self.postings.remove(term);
                }
            }
        }
        Some(entry)
    }

    /// BM25-ranked document ids for `query`, best first.
    ///
    /// Query terms are OR-ed; a document scores the sum over the terms it
    /// contains. Ties are broken by insertion order.
    pub fn search(&self, query: &str, limit: usize) -> Vec<(String, f64)> {
        if self.docs.is_empty() {
            return vec![];
        }

        let mut terms = tokenize(query);
        terms.sort();
        terms.dedup();

        let doc_count = self.docs.len() as f64;
        let avg_length = (self.total_length as f64 / doc_count).max(1.0);
        let mut scores: HashMap<&str, f64> = HashMap::new();

        for term in &terms {
            let Some(docs) = self.postings.get(term) else {
                continue;
            };
            let idf = idf(doc_count, docs.len() as f64);

            for (id, &tf) in docs {
                let length = self.docs.get(id).map_or(0, |d| d.length) as f64;
                let tf = tf as f64;
                let norm = BM25_K1 * (1.0 - BM25_B + BM25_B * length / avg_length);
                *scores.entry(id.as_str()).or_insert(0.0) += idf * (tf * (BM25_K1 + 1.0)) / (tf + norm);
            }
        }

        let mut ranked: Vec<(&str, f64, u64)> = scores
            .into_iter()
            .map(|(id, score)| {
                let seq = self.docs.get(id).map_or(u64::MAX, |d| d.seq);
                (id, score, seq)
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.2.cmp(&b.2))
        });

        ranked
            .into_iter()
            .take(limit)
            .map(|(id, score, _)| (id.to_string(), score))
            .collect()
    }
}

fn idf(doc_count: f64, doc_freq: f64) -> f64 {
    let idf = ((doc_count - doc_freq + 0.5) / (doc_freq + 0.5)).ln();
    if idf <= 0.0 { 1e-6 } else { idf }
}
