//! Core memory store orchestrating embedding, persistence and ranking.
//!
//! Provides a high-level API for storing, searching, and retrieving memories
//! over any [`StorageBackend`](crate::backend::StorageBackend), with optional
//! embedding generation through an
//! [`EmbeddingProvider`](crate::embedding::EmbeddingProvider).

mod crud;
mod search;

// pub(crate): module internals hidden; public items re-exported explicitly via lib.rs
pub(crate) mod store;

pub use store::{open_store, MemoryStore, StoreOptions, MAX_INPUT_LENGTH};
