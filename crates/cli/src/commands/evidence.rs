//! Evidence command handler.
//!
//! Runs web search and the RAG pipeline for a single query and prints what
//! a section writer would see.

use super::search_client;
use clap::Args;
use dossier_core::{config::AppConfig, AppResult};
use dossier_knowledge::{Evidence, RagPipeline};
use dossier_research::gather_documents;

/// Show the passages the RAG pipeline selects for one query
#[derive(Args, Debug)]
pub struct EvidenceCommand {
    /// Query to search and rank for
    pub query: String,

    /// Number of passages to keep (default: research.chunksToUseForWriting)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Search results per query (default: research.deepDiveSearchResults)
    #[arg(long)]
    pub max_results: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl EvidenceCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing evidence command");

        let top_k = self
            .top_k
            .unwrap_or(config.research.chunks_to_use_for_writing);
        let max_results = self
            .max_results
            .unwrap_or(config.research.deep_dive_search_results);

        let search = search_client(config)?;
        let rag = RagPipeline::from_settings(&config.rag).await?;

        let documents =
            gather_documents(search.as_ref(), std::slice::from_ref(&self.query), max_results).await;
        tracing::debug!("Gathered {} documents", documents.len());

        let evidence = rag.run_scored(&documents, &self.query, top_k).await?;

        if self.json {
            let output = serde_json::json!({
                "query": self.query,
                "documents": documents.len(),
                "embedder": rag.embedder().model_name(),
                "reranker": rag.reranker().model(),
                "evidence": evidence,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            print!(
                "{}",
                render_evidence(&self.query, documents.len(), &pipeline_label(&rag), &evidence)
            );
        }

        Ok(())
    }
}

/// Which embedder and reranker produced the ranking.
fn pipeline_label(rag: &RagPipeline) -> String {
    let embedder = rag.embedder();
    let reranker = rag.reranker();
    format!(
        "{} ({}) + {} ({})",
        embedder.provider_name(),
        embedder.model_name(),
        reranker.name(),
        reranker.model()
    )
}

fn render_evidence(query: &str, documents: usize, pipeline: &str, evidence: &[Evidence]) -> String {
    let mut text = format!(
        "Query: {}\nDocuments searched: {}\nRanked by: {}\n\n",
        query, documents, pipeline
    );

    if evidence.is_empty() {
        text.push_str("No passages selected.\n");
        return text;
    }

    for (i, item) in evidence.iter().enumerate() {
        text.push_str(&format!(
            "[{}] score {:.4}  {}\n{}\n\n",
            i + 1,
            item.score,
            item.source,
            item.content.trim()
        ));
    }
    text
}
