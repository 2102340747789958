//! Configuration system for memrank.

mod env_parser;
mod loader;
mod overrides;
mod paths;
mod validation;

#[cfg(test)]
mod tests_utils;

use crate::embedding::DEFAULT_MODEL_ID;
use crate::errors::Error;
use crate::memory_types::SearchOptions;
use crate::rrf::{RrfConfig, DEFAULT_RRF_K};
use std::path::PathBuf;

pub use loader::ConfigFile;

/// Configuration values with priority: defaults < config file < env vars.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Path to the SQLite database.
    pub database_path: PathBuf,

    /// HuggingFace embedding model identifier.
    pub embedding_model: String,

    /// Directory for caching ONNX models.
    pub model_cache: PathBuf,

    /// Store embeddings and run vector search. `false` keeps the store
    /// lexical-only and never loads the model.
    pub use_vectors: bool,

    /// RRF smoothing constant.
    pub rrf_k: f64,

    /// Default weight of the BM25 ranking in hybrid search.
    pub bm25_weight: f64,

    /// Default weight of the vector ranking in hybrid search.
    pub vector_weight: f64,

    /// Default score floor for hybrid search results.
    pub min_score: f64,
}

impl Default for Config {
    fn default() -> Self {
        // Use home directory with sensible fallback for systems without HOME
        let home = dirs::home_dir().unwrap_or_else(|| {
            std::env::var("HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("."))
        });
        let data_dir = home.join(".memrank");

        Self {
            database_path: data_dir.join("memories.db"),
            embedding_model: DEFAULT_MODEL_ID.to_string(),
            model_cache: data_dir.join("models"),
            use_vectors: true,
            rrf_k: DEFAULT_RRF_K,
            bm25_weight: 1.0,
            vector_weight: 1.0,
            min_score: 0.0,
        }
    }
}

impl Config {
    /// Load configuration with defaults, file values, and environment overrides.
    pub fn load() -> Result<Self, Error> {
        let file_config = loader::load_from_file()?;
        Self::from_sources(file_config)
    }

    /// Layer an already-parsed file and the environment over the defaults.
    pub(crate) fn from_sources(file_config: Option<ConfigFile>) -> Result<Self, Error> {
        let mut config = Config::default();

        if let Some(mut file) = file_config {
            paths::expand_tilde(&mut file.database_path);
            paths::expand_tilde(&mut file.model_cache);
            config.merge_from_file(file);
        }

        overrides::apply_env_overrides(&mut config)?;

        config.validate()?;

        Ok(config)
    }

    /// Merge configuration from a file into this config.
    fn merge_from_file(&mut self, file: ConfigFile) {
        if !file.database_path.as_os_str().is_empty() {
            self.database_path = file.database_path;
        }
        if !file.embedding_model.is_empty() {
            self.embedding_model = file.embedding_model;
        }
        if !file.model_cache.as_os_str().is_empty() {
            self.model_cache = file.model_cache;
        }
        if let Some(use_vectors) = file.use_vectors {
            self.use_vectors = use_vectors;
        }
        if let Some(rrf_k) = file.rrf_k {
            self.rrf_k = rrf_k;
        }
        if let Some(bm25_weight) = file.bm25_weight {
            self.bm25_weight = bm25_weight;
        }
        if let Some(vector_weight) = file.vector_weight {
            self.vector_weight = vector_weight;
        }
        if let Some(min_score) = file.min_score {
            self.min_score = min_score;
        }
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<(), Error> {
        let validator = validation::ConfigValidator {
            database_path: self.database_path.clone(),
            embedding_model: self.embedding_model.clone(),
            rrf_k: self.rrf_k,
            bm25_weight: self.bm25_weight,
            vector_weight: self.vector_weight,
            min_score: self.min_score,
        };

        validator.validate()
    }

    /// Fusion settings for the store.
    pub fn rrf_config(&self) -> RrfConfig {
        RrfConfig { k: self.rrf_k }
    }

    /// Hybrid search options seeded from the configured defaults.
    pub fn search_options(&self, limit: usize) -> SearchOptions {
        SearchOptions {
            limit,
            bm25_weight: self.bm25_weight,
            vector_weight: self.vector_weight,
            min_score: self.min_score,
        }
    }

    /// Ensure parent directories for database and cache paths exist.
    pub fn ensure_directories(&self) -> Result<(), Error> {
        if let Some(parent) = self.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::Config(format!(
                        "Failed to create database directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        if self.use_vectors && !self.model_cache.as_os_str().is_empty() {
            std::fs::create_dir_all(&self.model_cache).map_err(|e| {
                Error::Config(format!(
                    "Failed to create model cache directory {}: {e}",
                    self.model_cache.display()
                ))
            })?;
        }

        Ok(())
    }
}
