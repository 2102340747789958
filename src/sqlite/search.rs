//! Semantic (cosine) search over stored embeddings.

use super::{MemoryRow, SqliteBackend, MEMORY_COLUMNS};
use crate::backend::{validate_limit, VectorSearchable};
use crate::errors::Error;
use crate::memory_types::Memory;
use crate::vector::rank_by_similarity;

impl VectorSearchable for SqliteBackend {
    /// Loads every memory with an embedding, computes cosine similarity with
    /// the query embedding, sorts by similarity (highest first), and returns
    /// the top `limit` results.
    ///
    /// Cost is linear in the number of stored embeddings.
    fn search_vector(&self, embedding: &[f32], limit: usize) -> Result<Vec<(Memory, f64)>, Error> {
        validate_limit(limit)?;

        let sql = format!(
            "SELECT {MEMORY_COLUMNS} FROM memories m \
             WHERE m.embedding IS NOT NULL ORDER BY m.rowid"
        );
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let memories = stmt
            .query_map([], MemoryRow::from_row)?
            .map(|row| row.map_err(Error::from).and_then(MemoryRow::into_memory))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rank_by_similarity(
            embedding,
            memories,
            |m| m.embedding.as_deref().unwrap_or(&[]),
            limit,
        ))
    }
}
