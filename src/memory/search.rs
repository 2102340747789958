//! Search operations for the memory store (lexical, semantic and hybrid).

use tracing::debug;

use crate::backend::{validate_limit, StorageBackend, MAX_SEARCH_LIMIT};
use crate::embedding::check_dimension;
use crate::errors::Error;
use crate::memory_types::{MatchType, Memory, SearchOptions, SearchResult};
use crate::rrf::{weighted_rrf, RankedItem, WeightedRanking};

use super::store::MemoryStore;

/// Hybrid search fetches this many candidates per requested result from each
/// ranking before fusing.
const CANDIDATE_MULTIPLIER: usize = 2;

impl<B: StorageBackend> MemoryStore<B> {
    #[must_use = "handle the error or results may be lost"]
    /// Search memories with BM25 over the lexical index.
    ///
    /// Scores are higher-is-better. An empty or punctuation-only query
    /// returns no results.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Query exceeds 100,000 bytes
    /// - Limit is 0 or exceeds `MAX_SEARCH_LIMIT`
    /// - Backend read fails
    pub fn search_bm25(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, Error> {
        Self::validate_query_length(query)?;
        validate_limit(limit)?;
        let hits = self.backend.search_bm25(query, limit)?;
        Ok(tag(hits, MatchType::Bm25))
    }

    #[must_use = "handle the error or results may be lost"]
    /// Search memories by cosine similarity between the query embedding and
    /// stored embeddings.
    ///
    /// # Errors
    ///
    /// Returns `Error::Unsupported` when no embedding provider is configured
    /// or the backend has no vector capability. Otherwise fails like
    /// [`search_bm25`](Self::search_bm25), plus provider errors.
    pub fn search_vector(&mut self, query: &str, limit: usize) -> Result<Vec<SearchResult>, Error> {
        Self::validate_query_length(query)?;
        validate_limit(limit)?;
        self.ensure_open()?;

        let index = self.backend.vector_index().ok_or_else(|| {
            Error::Unsupported("backend does not support vector search".to_string())
        })?;
        let provider = self.provider.as_deref_mut().ok_or_else(|| {
            Error::Unsupported("vector search requires an embedding provider".to_string())
        })?;

        let embedding = provider.embed(query)?;
        check_dimension(provider.dimension(), &embedding)?;
        let hits = index.search_vector(&embedding, limit)?;
        Ok(tag(hits, MatchType::Vector))
    }

    #[must_use = "handle the error or results may be lost"]
    /// Search memories using hybrid search (BM25 + vector fused with RRF).
    ///
    /// Degrades gracefully: without a provider, without vector capability, or
    /// when the vector ranking comes back empty, this returns the BM25 ranking
    /// unchanged. When only the BM25 ranking is empty, the vector ranking is
    /// returned. Results below `min_score` are dropped before truncating to
    /// `limit`.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Query exceeds 100,000 bytes
    /// - Limit is 0 or exceeds `MAX_SEARCH_LIMIT`
    /// - A weight is negative or not finite, or `min_score` is not finite
    /// - Embedding generation fails
    /// - Backend read fails
    pub fn search(&mut self, query: &str, options: SearchOptions) -> Result<Vec<SearchResult>, Error> {
        Self::validate_query_length(query)?;
        validate_limit(options.limit)?;
        validate_search_options(&options)?;
        self.ensure_open()?;

        let candidates = options
            .limit
            .saturating_mul(CANDIDATE_MULTIPLIER)
            .min(MAX_SEARCH_LIMIT);

        let bm25 = self.backend.search_bm25(query, candidates)?;

        let vector = match (self.provider.as_deref_mut(), self.backend.vector_index()) {
            (Some(provider), Some(index)) => {
                let embedding = provider.embed(query)?;
                check_dimension(provider.dimension(), &embedding)?;
                index.search_vector(&embedding, candidates)?
            }
            _ => Vec::new(),
        };

        let (match_type, results) = if vector.is_empty() {
            (MatchType::Bm25, tag(bm25, MatchType::Bm25))
        } else if bm25.is_empty() {
            (MatchType::Vector, tag(vector, MatchType::Vector))
        } else {
            let fused = weighted_rrf(
                vec![
                    WeightedRanking::new(bm25, options.bm25_weight),
                    WeightedRanking::new(vector, options.vector_weight),
                ],
                |(memory, _): &(Memory, f64)| memory.id.clone(),
                self.rrf,
            );
            let fused = fused
                .into_iter()
                .map(|RankedItem { item: (memory, _), score }| SearchResult {
                    memory,
                    score,
                    match_type: MatchType::Hybrid,
                })
                .collect::<Vec<_>>();
            (MatchType::Hybrid, fused)
        };

        let mut results: Vec<SearchResult> = results
            .into_iter()
            .filter(|r| r.score >= options.min_score)
            .collect();
        results.truncate(options.limit);

        debug!(
            match_type = match_type.as_str(),
            results = results.len(),
            "hybrid search"
        );
        Ok(results)
    }
}

fn tag(hits: Vec<(Memory, f64)>, match_type: MatchType) -> Vec<SearchResult> {
    hits.into_iter()
        .map(|(memory, score)| SearchResult {
            memory,
            score,
            match_type,
        })
        .collect()
}

fn validate_search_options(options: &SearchOptions) -> Result<(), Error> {
    if !options.min_score.is_finite() {
        return Err(Error::InvalidInput(format!(
            "min_score must be finite, got {}",
            options.min_score
        )));
    }
    for (name, value) in [
        ("bm25_weight", options.bm25_weight),
        ("vector_weight", options.vector_weight),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(Error::InvalidInput(format!(
                "{} must be a finite non-negative number, got {}",
                name, value
            )));
        }
    }
    Ok(())
}
