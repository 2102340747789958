//! Configuration validation logic.

use crate::errors::Error;
use std::path::PathBuf;

/// Validates configuration values.
pub struct ConfigValidator {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,
    /// HuggingFace embedding model identifier.
    pub embedding_model: String,
    /// RRF smoothing constant.
    pub rrf_k: f64,
    /// Weight of the BM25 ranking.
    pub bm25_weight: f64,
    /// Weight of the vector ranking.
    pub vector_weight: f64,
    /// Hybrid search score floor.
    pub min_score: f64,
}

impl ConfigValidator {
    /// Validate all configuration values for correctness and constraints.
    ///
    /// Checks that:
    /// - `rrf_k` is strictly positive
    /// - Both ranking weights are non-negative
    /// - Embedding model is not empty
    /// - Database path is not empty
    /// - No NaN or infinite values
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if any validation check fails.
    pub fn validate(&self) -> Result<(), Error> {
        self.validate_rrf_k()?;
        validate_weight("bm25_weight", self.bm25_weight)?;
        validate_weight("vector_weight", self.vector_weight)?;
        validate_finite("min_score", self.min_score)?;
        self.validate_embedding_model()?;
        self.validate_database_path()?;

        Ok(())
    }

    fn validate_rrf_k(&self) -> Result<(), Error> {
        validate_finite("rrf_k", self.rrf_k)?;

        if self.rrf_k <= 0.0 {
            return Err(Error::Config(format!(
                "Invalid rrf_k: {} (must be greater than 0.0)",
                self.rrf_k
            )));
        }

        Ok(())
    }

    fn validate_embedding_model(&self) -> Result<(), Error> {
        if self.embedding_model.trim().is_empty() {
            return Err(Error::Config("Embedding model cannot be empty".to_string()));
        }

        Ok(())
    }

    fn validate_database_path(&self) -> Result<(), Error> {
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("Database path cannot be empty".to_string()));
        }

        Ok(())
    }
}

fn validate_finite(name: &str, value: f64) -> Result<(), Error> {
    if value.is_nan() || value.is_infinite() {
        return Err(Error::Config(format!(
            "Invalid {name}: NaN and infinity are not allowed"
        )));
    }
    Ok(())
}

fn validate_weight(name: &str, value: f64) -> Result<(), Error> {
    validate_finite(name, value)?;

    if value < 0.0 {
        return Err(Error::Config(format!(
            "Invalid {name}: {value} (must be 0.0 or greater)"
        )));
    }

    Ok(())
}
