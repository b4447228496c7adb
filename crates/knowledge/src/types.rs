//! Core types for evidence selection.

use serde::{Deserialize, Serialize};

/// A retrieved web document: page text plus the URL it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    pub source: String,
}

impl Document {
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: source.into(),
        }
    }
}

/// A bounded passage cut from one [`Document`].
///
/// `source` is always the parent document's URL, unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    pub source: String,
}

/// A chunk selected by the RAG pipeline, with its reranker score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub content: String,
    pub source: String,
    pub score: f32,
}

impl From<Evidence> for Chunk {
    fn from(evidence: Evidence) -> Self {
        Chunk {
            content: evidence.content,
            source: evidence.source,
        }
    }
}
