//! SQLite backend for memrank storage.
//!
//! This module provides:
//! - `SqliteBackend`: connection, schema and the primary record table
//! - `fts`: FTS5 full-text search with BM25 ranking
//! - `search`: cosine-similarity vector search (linear scan)
//!
//! The FTS5 table uses `memories` as external content and is maintained by
//! triggers, so every write to the record table updates the lexical index in
//! the same transaction.

pub mod fts;
pub mod search;

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use crate::backend::{resolve_version, validate_limit, StorageBackend, VectorSearchable};
use crate::errors::Error;
use crate::memory_types::{Memory, StoreStats};
use crate::vector::{blob_to_vec, vec_to_blob};

/// Path that opens a private in-memory database.
pub const IN_MEMORY_PATH: &str = ":memory:";

/// Columns selected for every `Memory` read, in `MemoryRow::from_row` order.
pub(crate) const MEMORY_COLUMNS: &str =
    "m.id, m.content, m.embedding, m.metadata, m.created_at, m.updated_at";

/// SQLite database backend.
pub struct SqliteBackend {
    conn: Option<Connection>,
    use_vectors: bool,
}

/// Initialize database schema and create necessary tables and triggers.
fn create_schema(conn: &Connection) -> Result<(), Error> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS memories (
            id TEXT PRIMARY KEY,
            content TEXT NOT NULL,
            embedding BLOB,
            metadata TEXT NOT NULL DEFAULT '{}',
            created_at TEXT NOT NULL,
            updated_at TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_memories_created_at ON memories(created_at);

        CREATE VIRTUAL TABLE IF NOT EXISTS memories_fts USING fts5(
            content,
            tokenize='porter unicode61',
            content='memories',
            content_rowid='rowid'
        );

        CREATE TRIGGER IF NOT EXISTS memories_fts_insert AFTER INSERT ON memories BEGIN
            INSERT INTO memories_fts(rowid, content) VALUES (new.rowid, new.content);
        END;

        CREATE TRIGGER IF NOT EXISTS memories_fts_delete AFTER DELETE ON memories BEGIN
            INSERT INTO memories_fts(memories_fts, rowid, content)
            VALUES ('delete', old.rowid, old.content);
        END;

        CREATE TRIGGER IF NOT EXISTS memories_fts_update AFTER UPDATE ON memories BEGIN
            INSERT INTO memories_fts(memories_fts, rowid, content)
            VALUES ('delete', old.rowid, old.content);
            INSERT INTO memories_fts(rowid, content) VALUES (new.rowid, new.content);
        END;
        "#,
    )?;
    Ok(())
}

/// Fixed-width RFC 3339 so that text order equals chronological order.
pub(crate) fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, Error> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}

/// Raw column values of one `memories` row, decoded outside the row closure.
pub(crate) struct MemoryRow {
    id: String,
    content: String,
    embedding: Option<Vec<u8>>,
    metadata: String,
    created_at: String,
    updated_at: Option<String>,
}

impl MemoryRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            content: row.get(1)?,
            embedding: row.get(2)?,
            metadata: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    pub(crate) fn into_memory(self) -> Result<Memory, Error> {
        let embedding = self.embedding.as_deref().map(blob_to_vec).transpose()?;
        let metadata = serde_json::from_str(&self.metadata).map_err(|e| {
            Error::Storage(format!("Corrupt metadata for memory {}: {}", self.id, e))
        })?;
        let updated_at = self.updated_at.as_deref().map(parse_timestamp).transpose()?;

        Ok(Memory {
            created_at: parse_timestamp(&self.created_at)?,
            id: self.id,
            content: self.content,
            embedding,
            metadata,
            updated_at,
        })
    }
}

/// Write one memory inside the caller's transaction.
fn write_memory(conn: &Connection, memory: Memory) -> Result<Memory, Error> {
    let existing: Option<String> = conn
        .query_row(
            "SELECT created_at FROM memories WHERE id = ?1",
            [&memory.id],
            |row| row.get(0),
        )
        .optional()?;
    let existing = existing.as_deref().map(parse_timestamp).transpose()?;
    let memory = resolve_version(memory, existing);

    let blob = memory.embedding.as_deref().map(vec_to_blob);
    let metadata = serde_json::to_string(&memory.metadata)?;
    let updated_at = memory.updated_at.as_ref().map(format_timestamp);

    conn.execute(
        r#"
        INSERT INTO memories (id, content, embedding, metadata, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(id) DO UPDATE SET
            content = excluded.content,
            embedding = excluded.embedding,
            metadata = excluded.metadata,
            updated_at = excluded.updated_at
        "#,
        params![
            &memory.id,
            &memory.content,
            blob,
            metadata,
            format_timestamp(&memory.created_at),
            updated_at
        ],
    )?;

    Ok(memory)
}

impl SqliteBackend {
    /// Open or create a SQLite database at the given path.
    ///
    /// `:memory:` opens a private in-memory database. File databases run in
    /// WAL mode so readers in other connections only see committed writes.
    /// Initializes the schema if the database is new and repairs the
    /// full-text index if it has drifted from the record table.
    ///
    /// # Errors
    ///
    /// Returns error if the database cannot be opened or schema initialization fails.
    pub fn open(path: &Path, use_vectors: bool) -> Result<Self, Error> {
        let conn = if path.as_os_str() == IN_MEMORY_PATH {
            Connection::open_in_memory()?
        } else {
            let conn = Connection::open(path)?;
            let mode: String =
                conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
            debug!(journal_mode = %mode, "journal mode set");
            conn
        };
        conn.busy_timeout(Duration::from_secs(5))?;
        create_schema(&conn)?;

        let backend = Self {
            conn: Some(conn),
            use_vectors,
        };
        backend.ensure_fts_consistency()?;

        info!(path = %path.display(), use_vectors, "memory database opened");
        Ok(backend)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory(use_vectors: bool) -> Result<Self, Error> {
        Self::open(Path::new(IN_MEMORY_PATH), use_vectors)
    }

    pub(crate) fn conn(&self) -> Result<&Connection, Error> {
        self.conn.as_ref().ok_or(Error::StoreClosed)
    }

    fn conn_mut(&mut self) -> Result<&mut Connection, Error> {
        self.conn.as_mut().ok_or(Error::StoreClosed)
    }

    /// Insert a memory with explicit timestamps (for testing).
    #[cfg(test)]
    pub(crate) fn insert_raw(&self, memory: &Memory) -> Result<(), Error> {
        self.conn()?.execute(
            r#"
            INSERT INTO memories (id, content, embedding, metadata, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                &memory.id,
                &memory.content,
                memory.embedding.as_deref().map(vec_to_blob),
                serde_json::to_string(&memory.metadata)?,
                format_timestamp(&memory.created_at),
                memory.updated_at.as_ref().map(format_timestamp)
            ],
        )?;
        Ok(())
    }
}

impl StorageBackend for SqliteBackend {
    fn upsert(&mut self, memory: Memory) -> Result<Memory, Error> {
        let tx = self.conn_mut()?.transaction()?;
        let memory = write_memory(&tx, memory)?;
        tx.commit()?;
        debug!(id = %memory.id, replaced = memory.updated_at.is_some(), "memory written");
        Ok(memory)
    }

    fn upsert_batch(&mut self, memories: Vec<Memory>) -> Result<Vec<Memory>, Error> {
        let tx = self.conn_mut()?.transaction()?;
        let written = memories
            .into_iter()
            .map(|memory| write_memory(&tx, memory))
            .collect::<Result<Vec<_>, _>>()?;
        tx.commit()?;
        debug!(count = written.len(), "memory batch written");
        Ok(written)
    }

    fn get(&self, id: &str) -> Result<Option<Memory>, Error> {
        let sql = format!("SELECT {MEMORY_COLUMNS} FROM memories m WHERE m.id = ?1");
        let row = self
            .conn()?
            .query_row(&sql, [id], MemoryRow::from_row)
            .optional()?;
        row.map(MemoryRow::into_memory).transpose()
    }

    fn delete(&mut self, id: &str) -> Result<bool, Error> {
        let rows = self
            .conn()?
            .execute("DELETE FROM memories WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    fn list(&self, limit: Option<usize>) -> Result<Vec<Memory>, Error> {
        if let Some(limit) = limit {
            validate_limit(limit)?;
        }
        // LIMIT -1 means no limit in SQLite
        let limit = limit.map_or(-1, |l| l as i64);

        let sql = format!(
            "SELECT {MEMORY_COLUMNS} FROM memories m \
             ORDER BY m.created_at DESC, m.rowid DESC LIMIT ?1"
        );
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([limit], MemoryRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter().map(MemoryRow::into_memory).collect()
    }

    fn stats(&self) -> Result<StoreStats, Error> {
        let (total, with_embeddings): (i64, i64) = self.conn()?.query_row(
            "SELECT COUNT(*), COUNT(embedding) FROM memories",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(StoreStats {
            total_memories: total as usize,
            memories_with_embeddings: with_embeddings as usize,
        })
    }

    fn close(&mut self) -> Result<(), Error> {
        let conn = self.conn.take().ok_or(Error::StoreClosed)?;
        conn.close().map_err(|(_, e)| Error::SQLite(e))?;
        info!("memory database closed");
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    fn vector_index(&self) -> Option<&dyn VectorSearchable> {
        self.use_vectors.then_some(self as &dyn VectorSearchable)
    }
}
