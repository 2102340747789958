//! CRUD operations for the memory store.

use tracing::debug;
use uuid::Uuid;

use crate::backend::{validate_limit, StorageBackend};
use crate::embedding::{check_dimension, ProviderError};
use crate::errors::Error;
use crate::memory_types::{AddOptions, BatchOptions, Memory, Metadata, NewMemory, StoreStats};

use super::store::{now, MemoryStore};

impl<B: StorageBackend> MemoryStore<B> {
    #[must_use = "handle the error or results may be lost"]
    /// Add a memory, replacing any existing memory with the same id.
    ///
    /// The embedding is computed before anything is written, so a provider
    /// failure leaves the store untouched.
    ///
    /// # Arguments
    ///
    /// * `content` - Text content to store (1 to 100,000 bytes)
    /// * `metadata` - Optional JSON object stored alongside the content
    /// * `options` - Caller-supplied id and whether to embed
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Input is empty or exceeds 100,000 bytes
    /// - Supplied id is blank
    /// - Embedding generation fails or returns the wrong dimension
    /// - Backend write fails
    pub fn add(
        &mut self,
        content: &str,
        metadata: Option<Metadata>,
        options: AddOptions,
    ) -> Result<Memory, Error> {
        Self::validate_input_length(content)?;
        let id = resolve_id(options.id)?;

        let embedding = match (options.embed, self.embedder()) {
            (true, Some(provider)) => {
                let vector = provider.embed(content)?;
                check_dimension(provider.dimension(), &vector)?;
                Some(vector)
            }
            _ => None,
        };

        let stored = self.backend.upsert(Memory {
            id,
            content: content.to_string(),
            embedding,
            metadata: metadata.unwrap_or_default(),
            created_at: now(),
            updated_at: None,
        })?;

        debug!(
            id = %stored.id,
            embedded = stored.has_embedding(),
            replaced = stored.updated_at.is_some(),
            "memory added"
        );
        Ok(stored)
    }

    #[must_use = "handle the error or results may be lost"]
    /// Add several memories atomically.
    ///
    /// Every item is validated and embedded (one `embed_batch` call) before
    /// the backend sees any of them; the backend then writes all or none.
    pub fn add_batch(
        &mut self,
        items: Vec<NewMemory>,
        options: BatchOptions,
    ) -> Result<Vec<Memory>, Error> {
        for item in &items {
            Self::validate_input_length(&item.content)?;
        }
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings: Vec<Option<Vec<f32>>> = match (options.embed, self.embedder()) {
            (true, Some(provider)) => {
                let texts: Vec<String> = items.iter().map(|i| i.content.clone()).collect();
                let vectors = provider.embed_batch(&texts)?;
                if vectors.len() != texts.len() {
                    return Err(ProviderError::BatchSize {
                        expected: texts.len(),
                        actual: vectors.len(),
                    }
                    .into());
                }
                let dimension = provider.dimension();
                for vector in &vectors {
                    check_dimension(dimension, vector)?;
                }
                vectors.into_iter().map(Some).collect()
            }
            _ => vec![None; items.len()],
        };

        let created_at = now();
        let memories = items
            .into_iter()
            .zip(embeddings)
            .map(|(item, embedding)| Memory {
                id: Uuid::new_v4().to_string(),
                content: item.content,
                embedding,
                metadata: item.metadata.unwrap_or_default(),
                created_at,
                updated_at: None,
            })
            .collect();

        let stored = self.backend.upsert_batch(memories)?;
        debug!(count = stored.len(), "memory batch added");
        Ok(stored)
    }

    #[must_use = "handle the error or results may be lost"]
    /// Get a specific memory by ID.
    ///
    /// Returns `None` if the memory doesn't exist.
    pub fn get(&self, id: &str) -> Result<Option<Memory>, Error> {
        self.backend.get(id)
    }

    #[must_use = "handle the error or results may be lost"]
    /// Delete a memory.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` if memory was deleted
    /// - `Ok(false)` if memory didn't exist
    pub fn delete(&mut self, id: &str) -> Result<bool, Error> {
        let deleted = self.backend.delete(id)?;
        debug!(id, deleted, "memory delete");
        Ok(deleted)
    }

    #[must_use = "handle the error or results may be lost"]
    /// List memories, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if `limit` is 0 or exceeds `MAX_SEARCH_LIMIT`.
    pub fn list(&self, limit: Option<usize>) -> Result<Vec<Memory>, Error> {
        if let Some(limit) = limit {
            validate_limit(limit)?;
        }
        self.backend.list(limit)
    }

    #[must_use = "handle the error or results may be lost"]
    pub fn stats(&self) -> Result<StoreStats, Error> {
        self.backend.stats()
    }
}

fn resolve_id(id: Option<String>) -> Result<String, Error> {
    match id {
        Some(id) if id.trim().is_empty() => {
            Err(Error::InvalidInput("memory id cannot be blank".to_string()))
        }
        Some(id) => Ok(id),
        None => Ok(Uuid::new_v4().to_string()),
    }
}
