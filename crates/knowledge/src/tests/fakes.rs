//! Scripted collaborators for pipeline tests.

use crate::embeddings::EmbeddingProvider;
use crate::rerank::Reranker;
use async_trait::async_trait;
use dossier_core::AppResult;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Embeds a text as keyword counts over a fixed vocabulary.
#[derive(Debug)]
pub(crate) struct KeywordEmbedder {
    vocabulary: Vec<&'static str>,
    pub(crate) batches: AtomicUsize,
    short_by: usize,
}

impl KeywordEmbedder {
    pub(crate) fn new(vocabulary: &[&'static str]) -> Self {
        Self {
            vocabulary: vocabulary.to_vec(),
            batches: AtomicUsize::new(0),
            short_by: 0,
        }
    }

    /// Returns `n` fewer vectors than requested.
    pub(crate) fn dropping(mut self, n: usize) -> Self {
        self.short_by = n;
        self
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    fn provider_name(&self) -> &str {
        "keyword"
    }

    fn model_name(&self) -> &str {
        "keyword-test"
    }

    fn dimensions(&self) -> usize {
        self.vocabulary.len()
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        let keep = texts.len().saturating_sub(self.short_by);
        Ok(texts[..keep]
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                self.vocabulary
                    .iter()
                    .map(|word| lower.matches(word).count() as f32)
                    .collect()
            })
            .collect())
    }
}

/// Scores passages by a fixed function and records what it was shown.
pub(crate) struct ScriptedReranker {
    score_fn: fn(&str) -> f32,
    pub(crate) seen: Mutex<Vec<Vec<String>>>,
}

impl ScriptedReranker {
    pub(crate) fn new(score_fn: fn(&str) -> f32) -> Self {
        Self {
            score_fn,
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Reranker for ScriptedReranker {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-test"
    }

    async fn score(&self, _query: &str, passages: &[String]) -> AppResult<Vec<f32>> {
        self.seen.lock().unwrap().push(passages.to_vec());
        Ok(passages.iter().map(|p| (self.score_fn)(p)).collect())
    }
}
