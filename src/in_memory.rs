//! In-process storage backend built on [`InvertedIndex`].
//!
//! Keeps everything in hash maps; nothing is persisted. Useful as a test
//! double and for short-lived stores that should not touch SQLite.

use std::collections::HashMap;

use crate::backend::{
    resolve_version, validate_limit, LexicalSearchable, StorageBackend, VectorSearchable,
};
use crate::errors::Error;
use crate::lexical::InvertedIndex;
use crate::memory_types::{Memory, StoreStats};
use crate::vector::rank_by_similarity;

#[derive(Debug, Clone)]
struct Entry {
    memory: Memory,
    /// Insertion order; kept when the id is replaced.
    seq: u64,
}

/// Memory table plus native inverted index.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    records: HashMap<String, Entry>,
    lexical: InvertedIndex,
    next_seq: u64,
    use_vectors: bool,
    closed: bool,
}

impl InMemoryBackend {
    /// Backend with lexical and vector search.
    pub fn new() -> Self {
        Self::with_vectors(true)
    }

    /// Backend whose vector capability is switched on or off.
    pub fn with_vectors(use_vectors: bool) -> Self {
        Self {
            use_vectors,
            ..Self::default()
        }
    }

    fn ensure_open(&self) -> Result<(), Error> {
        if self.closed {
            return Err(Error::StoreClosed);
        }
        Ok(())
    }

    fn write(&mut self, memory: Memory) -> Memory {
        let existing = self.records.get(&memory.id).map(|e| (e.memory.created_at, e.seq));
        let memory = resolve_version(memory, existing.map(|(created_at, _)| created_at));
        let seq = match existing {
            Some((_, seq)) => seq,
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                seq
            }
        };

        self.lexical.insert(&memory.id, &memory.content);
        self.records.insert(
            memory.id.clone(),
            Entry {
                memory: memory.clone(),
                seq,
            },
        );
        memory
    }

    /// Entries in insertion order.
    fn entries_in_order(&self) -> Vec<&Entry> {
        let mut entries: Vec<&Entry> = self.records.values().collect();
        entries.sort_by_key(|e| e.seq);
        entries
    }
}

impl LexicalSearchable for InMemoryBackend {
    fn search_bm25(&self, query: &str, limit: usize) -> Result<Vec<(Memory, f64)>, Error> {
        self.ensure_open()?;
        validate_limit(limit)?;

        Ok(self
            .lexical
            .search(query, limit)
            .into_iter()
            .filter_map(|(id, score)| {
                self.records
                    .get(&id)
                    .map(|entry| (entry.memory.clone(), score))
            })
            .collect())
    }
}

impl VectorSearchable for InMemoryBackend {
    fn search_vector(&self, embedding: &[f32], limit: usize) -> Result<Vec<(Memory, f64)>, Error> {
        self.ensure_open()?;
        validate_limit(limit)?;

        let candidates = self
            .entries_in_order()
            .into_iter()
            .filter(|entry| entry.memory.embedding.is_some());

        Ok(rank_by_similarity(
            embedding,
            candidates,
            |entry| entry.memory.embedding.as_deref().unwrap_or(&[]),
            limit,
        )
        .into_iter()
        .map(|(entry, score)| (entry.memory.clone(), score))
        .collect())
    }
}

impl StorageBackend for InMemoryBackend {
    fn upsert(&mut self, memory: Memory) -> Result<Memory, Error> {
        self.ensure_open()?;
        Ok(self.write(memory))
    }

    fn upsert_batch(&mut self, memories: Vec<Memory>) -> Result<Vec<Memory>, Error> {
        self.ensure_open()?;
        // Writes cannot fail past this point, so the batch applies fully
        Ok(memories.into_iter().map(|m| self.write(m)).collect())
    }

    fn get(&self, id: &str) -> Result<Option<Memory>, Error> {
        self.ensure_open()?;
        Ok(self.records.get(id).map(|e| e.memory.clone()))
    }

    fn delete(&mut self, id: &str) -> Result<bool, Error> {
        self.ensure_open()?;
        self.lexical.remove(id);
        Ok(self.records.remove(id).is_some())
    }

    fn list(&self, limit: Option<usize>) -> Result<Vec<Memory>, Error> {
        self.ensure_open()?;
        if let Some(limit) = limit {
            validate_limit(limit)?;
        }

        let mut entries = self.entries_in_order();
        entries.sort_by(|a, b| {
            b.memory
                .created_at
                .cmp(&a.memory.created_at)
                .then_with(|| b.seq.cmp(&a.seq))
        });

        Ok(entries
            .into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|e| e.memory.clone())
            .collect())
    }

    fn stats(&self) -> Result<StoreStats, Error> {
        self.ensure_open()?;
        Ok(StoreStats {
            total_memories: self.records.len(),
            memories_with_embeddings: self
                .records
                .values()
                .filter(|e| e.memory.has_embedding())
                .count(),
        })
    }

    fn close(&mut self) -> Result<(), Error> {
        self.ensure_open()?;
        self.records.clear();
        self.lexical = InvertedIndex::new();
        self.closed = true;
        Ok(())
    }

    fn is_open(&self) -> bool {
        !self.closed
    }

    fn vector_index(&self) -> Option<&dyn VectorSearchable> {
        self.use_vectors.then_some(self as &dyn VectorSearchable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn memory(id: &str, content: &str, day: u32) -> Memory {
        Memory {
            id: id.to_string(),
            content: content.to_string(),
            embedding: None,
            metadata: Default::default(),
            created_at: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            updated_at: None,
        }
    }

    #[test]
    fn test_upsert_get_delete() {
        let mut backend = InMemoryBackend::new();
        let m = memory("m-1", "hello world", 1);
        assert_eq!(backend.upsert(m.clone()).unwrap(), m);
        assert_eq!(backend.get("m-1").unwrap(), Some(m));

        assert!(backend.delete("m-1").unwrap());
        assert!(!backend.delete("m-1").unwrap());
        assert!(backend.get("m-1").unwrap().is_none());
        assert!(backend.search_bm25("hello", 10).unwrap().is_empty());
    }

    #[test]
    fn test_replace_keeps_created_at_and_reindexes() {
        let mut backend = InMemoryBackend::new();
        backend.upsert(memory("m-1", "first draft", 1)).unwrap();
        let replaced = backend.upsert(memory("m-1", "final version", 3)).unwrap();

        assert_eq!(replaced.created_at, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(
            replaced.updated_at,
            Some(Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap())
        );
        assert!(backend.search_bm25("draft", 10).unwrap().is_empty());
        assert_eq!(backend.search_bm25("final", 10).unwrap().len(), 1);
    }

    #[test]
    fn test_list_by_recency() {
        let mut backend = InMemoryBackend::new();
        backend.upsert(memory("old", "a", 1)).unwrap();
        backend.upsert(memory("new", "b", 9)).unwrap();
        backend.upsert(memory("tie", "c", 1)).unwrap();

        let ids: Vec<String> = backend
            .list(None)
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec!["new", "tie", "old"]);
        assert_eq!(backend.list(Some(1)).unwrap().len(), 1);
    }

    #[test]
    fn test_vector_search_and_capability() {
        let mut backend = InMemoryBackend::new();
        let mut a = memory("a", "alpha", 1);
        a.embedding = Some(vec![1.0, 0.0]);
        let mut b = memory("b", "beta", 1);
        b.embedding = Some(vec![0.0, 1.0]);
        backend.upsert_batch(vec![a, b, memory("c", "gamma", 1)]).unwrap();

        let vectors = backend.vector_index().unwrap();
        let results = vectors.search_vector(&[0.1, 0.9], 10).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0.id, "b");

        assert_eq!(
            backend.stats().unwrap(),
            StoreStats {
                total_memories: 3,
                memories_with_embeddings: 2
            }
        );
        assert!(InMemoryBackend::with_vectors(false).vector_index().is_none());
    }

    #[test]
    fn test_close_fails_fast() {
        let mut backend = InMemoryBackend::new();
        backend.upsert(memory("m-1", "content", 1)).unwrap();
        backend.close().unwrap();

        assert!(matches!(backend.get("m-1"), Err(Error::StoreClosed)));
        assert!(matches!(backend.list(None), Err(Error::StoreClosed)));
        assert!(matches!(backend.close(), Err(Error::StoreClosed)));
    }
}
