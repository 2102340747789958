//! Environment variable overrides for configuration.

use crate::errors::Error;

use super::env_parser::{self as env, override_bool, override_float, override_path, override_string};
use super::Config;

/// Apply `MEMRANK_*` environment variable overrides to configuration.
pub fn apply_env_overrides(config: &mut Config) -> Result<(), Error> {
    override_path(env::DATABASE_PATH, &mut config.database_path)?;
    override_string(env::EMBEDDING_MODEL, &mut config.embedding_model)?;
    override_path(env::MODEL_CACHE, &mut config.model_cache)?;
    override_bool(env::USE_VECTORS, &mut config.use_vectors)?;
    override_float(env::RRF_K, &mut config.rrf_k)?;
    override_float(env::BM25_WEIGHT, &mut config.bm25_weight)?;
    override_float(env::VECTOR_WEIGHT, &mut config.vector_weight)?;
    override_float(env::MIN_SCORE, &mut config.min_score)?;
    Ok(())
}
