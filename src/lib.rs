//! memrank - a hybrid lexical + semantic memory store.
//!
//! Memories are short texts with optional JSON metadata and an optional
//! embedding. Retrieval combines BM25 keyword ranking with cosine similarity
//! over embeddings, fused with Reciprocal Rank Fusion (RRF). Without an
//! embedding provider the store runs lexical-only and hybrid search returns
//! the BM25 ranking unchanged.
//!
//! All operations are synchronous (no async/await required).
//!
//! # Example
//!
//! ```no_run
//! use memrank::{AddOptions, MemoryStore, OnnxEmbedder, SearchOptions, StoreOptions};
//! use std::path::Path;
//!
//! let embedder = OnnxEmbedder::new("BAAI/bge-small-en-v1.5", Path::new("/tmp/models"))
//!     .expect("Failed to load model");
//! let mut store = MemoryStore::open(
//!     StoreOptions::new("/tmp/memories.db").with_provider(embedder),
//! )
//! .expect("Failed to initialize store");
//!
//! store
//!     .add("Alice works at Microsoft", None, AddOptions::default())
//!     .expect("Failed to add memory");
//!
//! for result in store.search("where does alice work", SearchOptions::default()).unwrap() {
//!     println!("{:.4} {:?}: {}", result.score, result.match_type, result.memory.content);
//! }
//! ```
//!
//! # Mutability Requirements
//!
//! Methods that generate embeddings (`add`, `add_batch`, `search`,
//! `search_vector`) require `&mut self` because embedding providers may
//! mutate internal state (the ONNX engine allocates tensors per call).

pub mod backend;
pub mod config;
pub mod embedding;
pub mod errors;
pub mod in_memory;
pub mod lexical;
pub mod memory;
pub mod memory_types;
pub mod rrf;
pub mod sqlite;
pub mod vector;

// Re-export public API
pub use backend::{LexicalSearchable, StorageBackend, VectorSearchable, MAX_SEARCH_LIMIT};
pub use config::Config;
pub use embedding::{EmbeddingProvider, OnnxEmbedder, ProviderError, DEFAULT_MODEL_ID, EMBEDDING_DIMS};
pub use errors::Error;
pub use in_memory::InMemoryBackend;
pub use memory::{open_store, MemoryStore, StoreOptions, MAX_INPUT_LENGTH};
pub use memory_types::{
    AddOptions, BatchOptions, MatchType, Memory, Metadata, NewMemory, SearchOptions, SearchResult,
    StoreStats,
};
pub use rrf::{reciprocal_rank_fusion, weighted_rrf, RankedItem, RrfConfig, WeightedRanking};
pub use sqlite::SqliteBackend;
