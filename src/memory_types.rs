//! Memory store data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque caller metadata attached to a memory. Never indexed.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A single stored memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    /// Unique identifier (caller-supplied or UUID v4).
    pub id: String,
    /// Text content, indexed for lexical search.
    pub content: String,
    /// Embedding produced by the provider at write time, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    /// Pass-through metadata.
    #[serde(default)]
    pub metadata: Metadata,
    /// Set once at creation; preserved when the id is replaced.
    pub created_at: DateTime<Utc>,
    /// Set when an existing id is replaced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Memory {
    /// Whether this memory carries an embedding.
    pub fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }
}

/// Which retrieval path produced a search result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Bm25,
    Vector,
    Hybrid,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Bm25 => "bm25",
            MatchType::Vector => "vector",
            MatchType::Hybrid => "hybrid",
        }
    }
}

/// A memory returned by a search, with a "higher is better" score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub memory: Memory,
    pub score: f64,
    pub match_type: MatchType,
}

/// Counts reported by `MemoryStore::stats()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub total_memories: usize,
    pub memories_with_embeddings: usize,
}

/// Options for `MemoryStore::add`.
#[derive(Debug, Clone)]
pub struct AddOptions {
    /// Explicit id; an existing memory with this id is replaced.
    pub id: Option<String>,
    /// Compute an embedding when a provider is configured.
    pub embed: bool,
}

impl Default for AddOptions {
    fn default() -> Self {
        Self {
            id: None,
            embed: true,
        }
    }
}

impl AddOptions {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn without_embedding() -> Self {
        Self {
            embed: false,
            ..Self::default()
        }
    }
}

/// One item of an `add_batch` call.
#[derive(Debug, Clone, Default)]
pub struct NewMemory {
    pub content: String,
    pub metadata: Option<Metadata>,
}

impl NewMemory {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Options for `MemoryStore::add_batch`.
#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    pub embed: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self { embed: true }
    }
}

/// Options for hybrid search.
#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    /// Maximum number of results.
    pub limit: usize,
    /// Weight of the BM25 ranking in fusion.
    pub bm25_weight: f64,
    /// Weight of the vector ranking in fusion.
    pub vector_weight: f64,
    /// Results scoring below this floor are dropped before truncation.
    pub min_score: f64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            bm25_weight: 1.0,
            vector_weight: 1.0,
            min_score: 0.0,
        }
    }
}

impl SearchOptions {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }
}
