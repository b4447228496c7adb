//! Embedding providers.
//!
//! Providers are created once per process and shared read-only behind an
//! `Arc`; embedding never mutates provider state.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};
pub use providers::{OllamaProvider, TrigramProvider};
