//! Storage backend traits.
//!
//! A backend owns the primary record table and both indices. Every mutation
//! goes through it, so the lexical and vector indices cannot drift from the
//! records. Lexical search is mandatory; vector search is a separate
//! capability that a backend may or may not expose.

use chrono::{DateTime, Utc};

use crate::errors::Error;
use crate::memory_types::{Memory, StoreStats};

/// Maximum allowed limit for search and list operations.
pub const MAX_SEARCH_LIMIT: usize = 10_000;

/// Validate a limit is within `1..=MAX_SEARCH_LIMIT`.
pub fn validate_limit(limit: usize) -> Result<(), Error> {
    if limit == 0 {
        return Err(Error::InvalidLimit(
            "Limit must be greater than 0".to_string(),
        ));
    }
    if limit > MAX_SEARCH_LIMIT {
        return Err(Error::InvalidLimit(format!(
            "Limit {} exceeds maximum allowed ({})",
            limit, MAX_SEARCH_LIMIT
        )));
    }
    Ok(())
}

/// BM25 full-text search over memory content.
pub trait LexicalSearchable {
    /// Memories matching `query`, best first, with "higher is better" BM25
    /// scores. A query without matching terms yields an empty list.
    fn search_bm25(&self, query: &str, limit: usize) -> Result<Vec<(Memory, f64)>, Error>;
}

/// Cosine-similarity search over stored embeddings.
pub trait VectorSearchable {
    /// Memories with an embedding, by descending cosine similarity to
    /// `embedding`. Linear scan over every stored embedding.
    fn search_vector(&self, embedding: &[f32], limit: usize) -> Result<Vec<(Memory, f64)>, Error>;
}

/// Primary table plus indices, kept consistent under every write.
pub trait StorageBackend: LexicalSearchable {
    /// Insert or replace by id, updating every index in the same transaction.
    ///
    /// Returns the memory as persisted: a replaced memory keeps its original
    /// `created_at` and gets `updated_at` set.
    fn upsert(&mut self, memory: Memory) -> Result<Memory, Error>;

    /// Upsert many memories as one atomic unit.
    fn upsert_batch(&mut self, memories: Vec<Memory>) -> Result<Vec<Memory>, Error>;

    /// Memory by id, `None` when absent.
    fn get(&self, id: &str) -> Result<Option<Memory>, Error>;

    /// Remove a memory and its index entries. Returns whether anything was removed.
    fn delete(&mut self, id: &str) -> Result<bool, Error>;

    /// Memories by recency (`created_at` descending), optionally capped.
    fn list(&self, limit: Option<usize>) -> Result<Vec<Memory>, Error>;

    /// Record counts.
    fn stats(&self) -> Result<StoreStats, Error>;

    /// Release resources. Every later call fails with `Error::StoreClosed`.
    fn close(&mut self) -> Result<(), Error>;

    /// Whether `close` has not been called yet.
    fn is_open(&self) -> bool;

    /// The vector capability, if this backend stores embeddings.
    fn vector_index(&self) -> Option<&dyn VectorSearchable> {
        None
    }
}

/// Apply replace-on-conflict timestamp rules.
///
/// `incoming.created_at` is the time of the write. When a record with the
/// same id already exists, its creation time wins and the write time becomes
/// `updated_at`.
pub(crate) fn resolve_version(mut incoming: Memory, existing_created_at: Option<DateTime<Utc>>) -> Memory {
    if let Some(created_at) = existing_created_at {
        incoming.updated_at = Some(incoming.created_at);
        incoming.created_at = created_at;
    }
    incoming
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn memory_at(created_at: DateTime<Utc>) -> Memory {
        Memory {
            id: "m-1".to_string(),
            content: "content".to_string(),
            embedding: None,
            metadata: Default::default(),
            created_at,
            updated_at: None,
        }
    }

    #[test]
    fn test_validate_limit_zero() {
        assert!(matches!(validate_limit(0), Err(Error::InvalidLimit(_))));
    }

    #[test]
    fn test_validate_limit_too_large() {
        assert!(validate_limit(MAX_SEARCH_LIMIT + 1).is_err());
    }

    #[test]
    fn test_validate_limit_valid() {
        assert!(validate_limit(1).is_ok());
        assert!(validate_limit(MAX_SEARCH_LIMIT).is_ok());
    }

    #[test]
    fn test_resolve_version_new_record() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let resolved = resolve_version(memory_at(now), None);
        assert_eq!(resolved.created_at, now);
        assert_eq!(resolved.updated_at, None);
    }

    #[test]
    fn test_resolve_version_replacement_keeps_created_at() {
        let original = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let resolved = resolve_version(memory_at(now), Some(original));
        assert_eq!(resolved.created_at, original);
        assert_eq!(resolved.updated_at, Some(now));
    }
}
