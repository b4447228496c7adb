//! Relevance reranking.
//!
//! A [`Reranker`] scores each (query, passage) pair jointly, which is more
//! precise than the vector-distance proxy used for first-stage retrieval.
//! Scores come back in input order; [`rank_by_score`] turns them into a
//! final selection.

pub mod http;
pub mod lexical;

pub use http::HttpReranker;
pub use lexical::LexicalReranker;

use dossier_core::config::RerankerSettings;
use dossier_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Trait for relevance scorers.
#[async_trait::async_trait]
pub trait Reranker: Send + Sync {
    /// Reranker identifier (e.g. "lexical", "http").
    fn name(&self) -> &str;

    /// Model or algorithm in use.
    fn model(&self) -> &str;

    /// One score per passage, in input order. Higher means more relevant.
    async fn score(&self, query: &str, passages: &[String]) -> AppResult<Vec<f32>>;
}

/// Input positions sorted by score, highest first, truncated to `top_k`.
///
/// The sort is stable, so equal scores keep their input order. NaN scores
/// rank below every number.
pub fn rank_by_score(scores: &[f32], top_k: usize) -> Vec<usize> {
    let key = |s: f32| if s.is_nan() { f32::NEG_INFINITY } else { s };

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| key(scores[b]).total_cmp(&key(scores[a])));
    order.truncate(top_k);
    order
}

/// Create the reranker named by `settings.provider`.
pub fn create_reranker(settings: &RerankerSettings) -> AppResult<Arc<dyn Reranker>> {
    match settings.provider.as_str() {
        "lexical" => Ok(Arc::new(LexicalReranker::new())),

        "http" => {
            let endpoint = settings.endpoint.as_deref().ok_or_else(|| {
                AppError::Config("rag.reranker.endpoint is required for the http reranker".to_string())
            })?;

            let api_key = match settings.api_key_env.as_deref() {
                Some(var) => Some(std::env::var(var).map_err(|_| {
                    AppError::Config(format!("Reranker API key variable {} is not set", var))
                })?),
                None => None,
            };

            let reranker = HttpReranker::new(
                endpoint,
                &settings.model,
                api_key,
                Duration::from_secs(settings.timeout_secs),
            )?;
            Ok(Arc::new(reranker))
        }

        other => Err(AppError::Config(format!(
            "Unknown reranker: '{}'. Supported rerankers: lexical, http",
            other
        ))),
    }
}
