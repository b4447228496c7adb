//! Web search collaborator.

use async_trait::async_trait;
use dossier_core::config::SearchSettings;
use dossier_core::{AppError, AppResult};
use dossier_knowledge::Document;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Page URL. Empty when the provider omitted it.
    #[serde(default)]
    pub url: String,

    /// Relevant snippet extracted by the provider.
    #[serde(default)]
    pub content: String,

    /// Full page text, when requested and available.
    #[serde(default)]
    pub raw_content: Option<String>,
}

/// Trait for web search backends.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Backend identifier (e.g. "tavily").
    fn name(&self) -> &str;

    /// Run one query, returning at most `max_results` hits.
    async fn search(&self, query: &str, max_results: usize) -> AppResult<Vec<SearchHit>>;
}

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'a str,
    max_results: usize,
    include_raw_content: bool,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

/// Tavily search API client.
pub struct TavilyClient {
    client: Client,
    endpoint: String,
    api_key: String,
    search_depth: String,
    include_raw_content: bool,
}

impl TavilyClient {
    pub fn new(settings: &SearchSettings, api_key: impl Into<String>) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| AppError::Search(format!("Failed to build search HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            search_depth: settings.search_depth.clone(),
            include_raw_content: settings.include_raw_content,
        })
    }
}

#[async_trait]
impl SearchClient for TavilyClient {
    fn name(&self) -> &str {
        "tavily"
    }

    async fn search(&self, query: &str, max_results: usize) -> AppResult<Vec<SearchHit>> {
        let url = format!("{}/search", self.endpoint);
        let body = TavilyRequest {
            api_key: &self.api_key,
            query,
            search_depth: &self.search_depth,
            max_results,
            include_raw_content: self.include_raw_content,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Search(format!("Tavily request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Search(format!(
                "Tavily search error ({}): {}",
                status, text
            )));
        }

        let parsed: TavilyResponse = response
            .json()
            .await
            .map_err(|e| AppError::Search(format!("Failed to parse Tavily response: {}", e)))?;

        Ok(parsed.results)
    }
}

/// Run every query and pool the results as documents.
///
/// Empty queries are skipped, as are hits missing either snippet or URL.
/// A failing query is logged and skipped; the batch never fails.
pub async fn gather_documents(
    client: &dyn SearchClient,
    queries: &[String],
    max_results: usize,
) -> Vec<Document> {
    tracing::info!(queries = queries.len(), "Gathering research");

    let mut documents = Vec::new();
    for query in queries {
        if query.is_empty() {
            continue;
        }

        match client.search(query, max_results).await {
            Ok(hits) => {
                let before = documents.len();
                documents.extend(
                    hits.into_iter()
                        .filter(|hit| !hit.content.is_empty() && !hit.url.is_empty())
                        .map(|hit| Document::new(hit.content, hit.url)),
                );
                tracing::debug!(query = %query, kept = documents.len() - before, "Search returned");
            }
            Err(e) => {
                tracing::warn!(query = %query, error = %e, backend = client.name(), "Search failed");
            }
        }
    }

    documents
}
