//! Shared test utilities for config module tests.

use std::sync::Mutex;

use super::env_parser;

/// Mutex to serialize environment variable tests and prevent race conditions.
pub static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Set an environment variable. Callers must hold `ENV_MUTEX`.
pub fn set_env_var(name: &str, value: &str) {
    // SAFETY: ENV_MUTEX serializes every test that touches the environment
    unsafe { std::env::set_var(name, value) };
}

/// Clean up environment variables used by memrank config.
pub fn cleanup_env_vars() {
    for var in env_parser::ALL {
        // SAFETY: ENV_MUTEX serializes every test that touches the environment
        unsafe { std::env::remove_var(var) };
    }
}
