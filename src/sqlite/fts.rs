//! FTS5 full-text search and BM25 ranking.
//!
//! FTS5's `bm25()` returns "lower is better" scores (more relevant rows are
//! more negative). This module negates them once, on the way out, so every
//! score leaving the lexical index is "higher is better".

use rusqlite::params;
use tracing::warn;

use super::{MemoryRow, SqliteBackend, MEMORY_COLUMNS};
use crate::backend::{validate_limit, LexicalSearchable};
use crate::errors::Error;
use crate::memory_types::Memory;

impl SqliteBackend {
    /// Verify the FTS5 index matches the record table, rebuilding it if not.
    ///
    /// Covers databases created before the index existed and indexes left
    /// inconsistent by external edits. The rebuild runs in one transaction.
    pub(crate) fn ensure_fts_consistency(&self) -> Result<(), Error> {
        let conn = self.conn()?;
        let check = conn.execute(
            "INSERT INTO memories_fts(memories_fts, rank) VALUES ('integrity-check', 1)",
            [],
        );

        if let Err(e) = check {
            warn!(error = %e, "full-text index out of sync, rebuilding");

            let tx = conn.unchecked_transaction()?;
            tx.execute("INSERT INTO memories_fts(memories_fts) VALUES ('rebuild')", [])
                .map_err(|e| Error::Storage(format!("FTS5 rebuild failed: {}", e)))?;
            tx.commit()?;
        }

        Ok(())
    }

    /// Escape and normalize an FTS5 query string.
    ///
    /// Each whitespace-separated word becomes a quoted string, so FTS5
    /// operators and punctuation in user input are matched literally; words
    /// are OR-ed together. Words without any alphanumeric character are
    /// dropped since the tokenizer would discard them anyway.
    pub(crate) fn escape_fts_query(query: &str) -> String {
        query
            .split_whitespace()
            .filter(|word| word.chars().any(char::is_alphanumeric))
            .map(|word| format!("\"{}\"", word.replace('"', "\"\"")))
            .collect::<Vec<_>>()
            .join(" OR ")
    }
}

impl LexicalSearchable for SqliteBackend {
    fn search_bm25(&self, query: &str, limit: usize) -> Result<Vec<(Memory, f64)>, Error> {
        validate_limit(limit)?;
        let conn = self.conn()?;

        let escaped_query = Self::escape_fts_query(query);

        // Empty query returns no results (avoid FTS5 syntax error)
        if escaped_query.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            r#"
            SELECT {MEMORY_COLUMNS}, bm25(memories_fts) AS raw_score
            FROM memories_fts
            JOIN memories m ON m.rowid = memories_fts.rowid
            WHERE memories_fts MATCH ?1
            ORDER BY raw_score, m.rowid
            LIMIT ?2
            "#
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![escaped_query, limit as i64], |row| {
                Ok((MemoryRow::from_row(row)?, row.get::<_, f64>(6)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(row, raw_score)| Ok((row.into_memory()?, -raw_score)))
            .collect()
    }
}
