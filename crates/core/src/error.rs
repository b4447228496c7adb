//! Error types for dossier.
//!
//! This module defines a unified error enum that covers every failure
//! category in the workspace: configuration, I/O, LLM calls, retrieval,
//! prompts, web search, report generation and document export.

use thiserror::Error;

/// Unified error type for dossier.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
/// Fail-soft stages convert these into degraded values at their own
/// boundary; nothing below the CLI panics on bad input.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors (missing credentials, bad YAML, unknown provider)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Chunking, embedding, indexing and reranking errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Web search errors
    #[error("Search error: {0}")]
    Search(String),

    /// Report generation errors (planning, orchestration)
    #[error("Report error: {0}")]
    Report(String),

    /// Document export errors
    #[error("Export error: {0}")]
    Export(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
