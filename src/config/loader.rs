//! Configuration file loading and parsing.

use crate::errors::Error;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration loaded from TOML file.
///
/// Empty paths and strings, and absent numeric keys, leave the default in
/// place.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub database_path: PathBuf,

    #[serde(default)]
    pub embedding_model: String,

    #[serde(default)]
    pub model_cache: PathBuf,

    #[serde(default)]
    pub use_vectors: Option<bool>,

    #[serde(default)]
    pub rrf_k: Option<f64>,

    #[serde(default)]
    pub bm25_weight: Option<f64>,

    #[serde(default)]
    pub vector_weight: Option<f64>,

    #[serde(default)]
    pub min_score: Option<f64>,
}

/// Location of the config file: `<config_dir>/memrank/config.toml`.
pub fn config_path() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    let config_dir = dirs::config_dir().unwrap_or_else(|| home.join(".config"));
    config_dir.join("memrank/config.toml")
}

/// Load configuration from the default TOML file, if it exists.
pub fn load_from_file() -> Result<Option<ConfigFile>, Error> {
    load_from_path(&config_path())
}

/// Load configuration from a TOML file, if it exists.
pub fn load_from_path(config_path: &Path) -> Result<Option<ConfigFile>, Error> {
    if !config_path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(config_path).map_err(|e| {
        Error::Config(format!(
            "Failed to read config file {}: {e}",
            config_path.display()
        ))
    })?;

    let config: ConfigFile = toml::from_str(&content).map_err(|e| {
        Error::Config(format!(
            "Failed to parse config file {}: {e}",
            config_path.display()
        ))
    })?;

    Ok(Some(config))
}
