//! Environment variable parsing utilities for configuration.

use crate::errors::Error;
use std::path::PathBuf;

use super::paths;

pub const DATABASE_PATH: &str = "MEMRANK_DATABASE_PATH";
pub const EMBEDDING_MODEL: &str = "MEMRANK_EMBEDDING_MODEL";
pub const MODEL_CACHE: &str = "MEMRANK_MODEL_CACHE";
pub const USE_VECTORS: &str = "MEMRANK_USE_VECTORS";
pub const RRF_K: &str = "MEMRANK_RRF_K";
pub const BM25_WEIGHT: &str = "MEMRANK_BM25_WEIGHT";
pub const VECTOR_WEIGHT: &str = "MEMRANK_VECTOR_WEIGHT";
pub const MIN_SCORE: &str = "MEMRANK_MIN_SCORE";

/// Every variable the config layer reads.
#[cfg(test)]
pub const ALL: [&str; 8] = [
    DATABASE_PATH,
    EMBEDDING_MODEL,
    MODEL_CACHE,
    USE_VECTORS,
    RRF_K,
    BM25_WEIGHT,
    VECTOR_WEIGHT,
    MIN_SCORE,
];

/// Parse environment variable value or return error if empty/whitespace.
fn parse_env_string(name: &str, value: &str) -> Result<String, Error> {
    if value.trim().is_empty() {
        return Err(Error::Config(format!("{name} cannot be empty")));
    }
    Ok(value.to_string())
}

/// Parse environment variable as a path, expanding tilde.
fn parse_env_path(name: &str, value: &str) -> Result<PathBuf, Error> {
    if value.trim().is_empty() {
        return Err(Error::Config(format!("{name} cannot be empty")));
    }
    Ok(paths::expand_tilde_path(&PathBuf::from(value)))
}

/// Parse environment variable as a f64. Range checks happen in validation.
fn parse_env_float(name: &str, value: &str) -> Result<f64, Error> {
    if value.trim().is_empty() {
        return Err(Error::Config(format!("{name} cannot be empty")));
    }
    value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("Invalid {name} value: {e}")))
}

/// Parse environment variable as a boolean (`true/false`, `1/0`, `yes/no`, `on/off`).
fn parse_env_bool(name: &str, value: &str) -> Result<bool, Error> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!(
            "Invalid {name} value: {other:?} (expected true or false)"
        ))),
    }
}

pub fn override_string(name: &str, target: &mut String) -> Result<(), Error> {
    if let Ok(val) = std::env::var(name) {
        *target = parse_env_string(name, &val)?;
    }
    Ok(())
}

pub fn override_path(name: &str, target: &mut PathBuf) -> Result<(), Error> {
    if let Ok(val) = std::env::var(name) {
        *target = parse_env_path(name, &val)?;
    }
    Ok(())
}

pub fn override_float(name: &str, target: &mut f64) -> Result<(), Error> {
    if let Ok(val) = std::env::var(name) {
        *target = parse_env_float(name, &val)?;
    }
    Ok(())
}

pub fn override_bool(name: &str, target: &mut bool) -> Result<(), Error> {
    if let Ok(val) = std::env::var(name) {
        *target = parse_env_bool(name, &val)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_string_empty() {
        let result = parse_env_string("TEST_VAR", "");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_parse_env_string_whitespace() {
        let result = parse_env_string("TEST_VAR", "   ");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_parse_env_string_valid() {
        let result = parse_env_string("TEST_VAR", "valid");
        assert_eq!(result.unwrap(), "valid");
    }

    #[test]
    fn test_parse_env_float_invalid() {
        let result = parse_env_float("TEST_FLOAT", "invalid");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_parse_env_float_valid() {
        assert_eq!(parse_env_float("TEST_FLOAT", " 0.5 ").unwrap(), 0.5);
    }

    #[test]
    fn test_parse_env_bool() {
        assert!(parse_env_bool("TEST_BOOL", "TRUE").unwrap());
        assert!(parse_env_bool("TEST_BOOL", "1").unwrap());
        assert!(!parse_env_bool("TEST_BOOL", "off").unwrap());
        assert!(!parse_env_bool("TEST_BOOL", "no").unwrap());
        assert!(matches!(
            parse_env_bool("TEST_BOOL", "maybe"),
            Err(Error::Config(_))
        ));
    }
}
