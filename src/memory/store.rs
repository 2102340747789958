//! Core memory store struct combining embedding generation and persistence.

use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, SubsecRound, Utc};

use crate::backend::StorageBackend;
use crate::embedding::EmbeddingProvider;
use crate::errors::Error;
use crate::rrf::RrfConfig;
use crate::sqlite::{SqliteBackend, IN_MEMORY_PATH};

/// Maximum allowed input length (100,000 bytes).
pub const MAX_INPUT_LENGTH: usize = 100_000;

/// Everything needed to open a SQLite-backed store.
pub struct StoreOptions {
    /// Database file, or `:memory:` for a private in-memory database.
    pub path: PathBuf,
    /// Provider used to embed content and queries. `None` means lexical-only.
    pub embedding_provider: Option<Box<dyn EmbeddingProvider>>,
    /// Store embeddings and serve vector search.
    pub use_vectors: bool,
}

impl StoreOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            embedding_provider: None,
            use_vectors: true,
        }
    }

    /// Options for a private in-memory database.
    pub fn in_memory() -> Self {
        Self::new(IN_MEMORY_PATH)
    }

    pub fn with_provider(mut self, provider: impl EmbeddingProvider + 'static) -> Self {
        self.embedding_provider = Some(Box::new(provider));
        self
    }

    pub fn with_boxed_provider(mut self, provider: Option<Box<dyn EmbeddingProvider>>) -> Self {
        self.embedding_provider = provider;
        self
    }

    pub fn use_vectors(mut self, use_vectors: bool) -> Self {
        self.use_vectors = use_vectors;
        self
    }
}

/// Open a SQLite-backed memory store.
pub fn open_store(options: StoreOptions) -> Result<MemoryStore, Error> {
    MemoryStore::open(options)
}

/// Core memory store combining embedding generation and persistence.
///
/// The single handle through which all reads and writes flow. Mutating
/// methods take `&mut self`, so one handle is one writer. Methods that call
/// the embedding provider also need `&mut self` because providers may mutate
/// internal state.
pub struct MemoryStore<B: StorageBackend = SqliteBackend> {
    pub(crate) backend: B,
    pub(crate) provider: Option<Box<dyn EmbeddingProvider>>,
    pub(crate) rrf: RrfConfig,
}

impl MemoryStore<SqliteBackend> {
    /// Open a store at `options.path`.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Database path contains path traversal sequences (e.g., "../")
    /// - Parent directory cannot be canonicalized
    /// - Database cannot be opened or its schema cannot be created
    pub fn open(options: StoreOptions) -> Result<Self, Error> {
        let StoreOptions {
            path,
            embedding_provider,
            use_vectors,
        } = options;

        if path.as_os_str() != IN_MEMORY_PATH {
            validate_database_path(&path)?;
        }

        let backend = SqliteBackend::open(&path, use_vectors)?;
        Ok(Self::with_backend(backend, embedding_provider))
    }
}

impl<B: StorageBackend> MemoryStore<B> {
    /// Wrap any backend.
    pub fn with_backend(backend: B, provider: Option<Box<dyn EmbeddingProvider>>) -> Self {
        Self {
            backend,
            provider,
            rrf: RrfConfig::default(),
        }
    }

    /// Override the RRF smoothing constant used by hybrid search.
    pub fn with_rrf_config(mut self, rrf: RrfConfig) -> Self {
        self.rrf = rrf;
        self
    }

    /// The underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Whether writes and queries will be embedded: needs both a provider
    /// and a backend with vector capability.
    pub fn vectors_enabled(&self) -> bool {
        self.provider.is_some() && self.backend.vector_index().is_some()
    }

    /// Release the backend and the provider. Later calls fail with
    /// `Error::StoreClosed`.
    pub fn close(&mut self) -> Result<(), Error> {
        self.provider = None;
        self.backend.close()
    }

    pub(crate) fn ensure_open(&self) -> Result<(), Error> {
        if !self.backend.is_open() {
            return Err(Error::StoreClosed);
        }
        Ok(())
    }

    /// The provider, if vectors are enabled.
    pub(crate) fn embedder(&mut self) -> Option<&mut (dyn EmbeddingProvider + 'static)> {
        self.backend.vector_index()?;
        self.provider.as_deref_mut()
    }

    /// Validate content length (rejects empty and whitespace-only inputs).
    pub(crate) fn validate_input_length(text: &str) -> Result<(), Error> {
        if text.trim().is_empty() {
            return Err(Error::EmptyInput);
        }
        Self::validate_query_length(text)
    }

    /// Queries may be empty but share the content length ceiling.
    pub(crate) fn validate_query_length(text: &str) -> Result<(), Error> {
        if text.len() > MAX_INPUT_LENGTH {
            return Err(Error::InputTooLong {
                max_length: MAX_INPUT_LENGTH,
                actual_length: text.len(),
            });
        }
        Ok(())
    }
}

/// Current time at the precision timestamps are persisted with.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Reject `..` components and inaccessible parent directories.
fn validate_database_path(db_path: &Path) -> Result<(), Error> {
    if db_path
        .components()
        .any(|component| matches!(component, Component::ParentDir))
    {
        return Err(Error::Config(
            "Invalid database path: contains '..' which may escape the intended directory"
                .to_string(),
        ));
    }

    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::canonicalize(parent).map_err(|e| {
            Error::Config(format!(
                "Invalid database path: parent directory not accessible: {}",
                e
            ))
        })?;
    }

    Ok(())
}
