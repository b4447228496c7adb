//! Hosted cross-encoder reranker.
//!
//! Speaks the request/response shape shared by Jina, Cohere and Hugging
//! Face TEI rerank endpoints:
//!
//! ```text
//! POST {endpoint}  {"model", "query", "documents": [...], "top_n"}
//! 200              {"results": [{"index": 0, "relevance_score": 0.93}, ...]}
//! ```

use super::Reranker;
use async_trait::async_trait;
use dossier_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    documents: &'a [String],
    top_n: usize,
}

#[derive(Debug, Deserialize)]
struct RerankResponse {
    results: Vec<RerankResult>,
}

#[derive(Debug, Deserialize)]
struct RerankResult {
    index: usize,
    relevance_score: f64,
}

/// Reranker backed by a cross-encoder served over HTTP.
pub struct HttpReranker {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl HttpReranker {
    pub fn new(
        endpoint: &str,
        model: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Knowledge(format!("Failed to build reranker HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            api_key,
        })
    }

    /// Map the provider's sorted results back onto input positions.
    fn scores_in_input_order(results: Vec<RerankResult>, len: usize) -> AppResult<Vec<f32>> {
        let mut scores = vec![f32::NEG_INFINITY; len];
        let mut missing = len;

        for result in results {
            let slot = scores.get_mut(result.index).ok_or_else(|| {
                AppError::Knowledge(format!(
                    "Reranker returned index {} for {} passages",
                    result.index, len
                ))
            })?;
            if *slot == f32::NEG_INFINITY {
                missing -= 1;
            }
            *slot = result.relevance_score as f32;
        }

        if missing > 0 {
            tracing::warn!(missing, "Reranker omitted passages; they rank last");
        }

        Ok(scores)
    }
}

#[async_trait]
impl Reranker for HttpReranker {
    fn name(&self) -> &str {
        "http"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn score(&self, query: &str, passages: &[String]) -> AppResult<Vec<f32>> {
        if passages.is_empty() {
            return Ok(Vec::new());
        }

        let body = RerankRequest {
            model: &self.model,
            query,
            documents: passages,
            top_n: passages.len(),
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Knowledge(format!("Rerank request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Knowledge(format!(
                "Rerank API error ({}): {}",
                status, text
            )));
        }

        let parsed: RerankResponse = response
            .json()
            .await
            .map_err(|e| AppError::Knowledge(format!("Failed to parse rerank response: {}", e)))?;

        tracing::debug!(
            model = %self.model,
            passages = passages.len(),
            "Scored passages with hosted reranker"
        );

        Self::scores_in_input_order(parsed.results, passages.len())
    }
}
