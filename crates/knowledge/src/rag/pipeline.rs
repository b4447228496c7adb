//! Evidence selection: chunk, embed, retrieve, rerank.

use crate::chunker::{chunk_documents, ChunkConfig};
use crate::embeddings::{create_provider, EmbeddingProvider};
use crate::index::FlatL2Index;
use crate::rerank::{create_reranker, rank_by_score, Reranker};
use crate::types::{Chunk, Document, Evidence};
use crate::vector_index::VectorIndex;
use dossier_core::config::RagSettings;
use dossier_core::{AppError, AppResult};
use std::sync::Arc;

/// Reusable "top-k relevant passages" primitive.
///
/// The embedder and reranker are created once and shared read-only. Every
/// call builds its own index over its own documents, so concurrent calls
/// never see each other's chunks.
#[derive(Clone)]
pub struct RagPipeline {
    embedder: Arc<dyn EmbeddingProvider>,
    reranker: Arc<dyn Reranker>,
    chunk_config: ChunkConfig,
    retrieve_width: usize,
}

impl RagPipeline {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        reranker: Arc<dyn Reranker>,
        chunk_config: ChunkConfig,
        retrieve_width: usize,
    ) -> Self {
        Self {
            embedder,
            reranker,
            chunk_config,
            retrieve_width,
        }
    }

    /// Wire the configured embedding provider and reranker.
    pub async fn from_settings(settings: &RagSettings) -> AppResult<Self> {
        settings.validate()?;

        let embedder = create_provider(&settings.embedding).await?;
        let reranker = create_reranker(&settings.reranker)?;

        tracing::info!(
            embedder = embedder.provider_name(),
            embedding_model = embedder.model_name(),
            reranker = reranker.name(),
            reranker_model = reranker.model(),
            "RAG pipeline ready"
        );

        Ok(Self::new(
            embedder,
            reranker,
            ChunkConfig::from_settings(settings)?,
            settings.chunks_to_retrieve,
        ))
    }

    pub fn embedder(&self) -> &dyn EmbeddingProvider {
        self.embedder.as_ref()
    }

    pub fn reranker(&self) -> &dyn Reranker {
        self.reranker.as_ref()
    }

    /// Top `top_k` chunks for `query`, most relevant first.
    pub async fn run(&self, documents: &[Document], query: &str, top_k: usize) -> AppResult<Vec<Chunk>> {
        let evidence = self.run_scored(documents, query, top_k).await?;
        Ok(evidence.into_iter().map(Chunk::from).collect())
    }

    /// Like [`run`](Self::run), keeping each chunk's reranker score.
    pub async fn run_scored(
        &self,
        documents: &[Document],
        query: &str,
        top_k: usize,
    ) -> AppResult<Vec<Evidence>> {
        if documents.is_empty() {
            tracing::debug!("No documents supplied; nothing to retrieve");
            return Ok(Vec::new());
        }

        let chunks = chunk_documents(documents, &self.chunk_config);
        if chunks.is_empty() {
            tracing::debug!(documents = documents.len(), "Documents produced no chunks");
            return Ok(Vec::new());
        }

        let width = self.retrieve_width.min(chunks.len());
        if width == 0 {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;
        if vectors.len() != chunks.len() {
            return Err(AppError::Knowledge(format!(
                "Embedder returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        let index = FlatL2Index::build(vectors)?;
        let query_vector = self.embedder.embed(query).await?;
        let neighbors = index.search(&query_vector, width)?;

        let candidates: Vec<&Chunk> = neighbors.iter().map(|n| &chunks[n.index]).collect();
        let passages: Vec<String> = candidates.iter().map(|c| c.content.clone()).collect();
        let scores = self.reranker.score(query, &passages).await?;
        if scores.len() != candidates.len() {
            return Err(AppError::Knowledge(format!(
                "Reranker returned {} scores for {} passages",
                scores.len(),
                candidates.len()
            )));
        }

        let selected: Vec<Evidence> = rank_by_score(&scores, top_k)
            .into_iter()
            .map(|i| Evidence {
                content: candidates[i].content.clone(),
                source: candidates[i].source.clone(),
                score: scores[i],
            })
            .collect();

        tracing::debug!(
            documents = documents.len(),
            chunks = chunks.len(),
            retrieved = candidates.len(),
            selected = selected.len(),
            top_score = selected.first().map(|e| e.score),
            "Selected evidence"
        );

        Ok(selected)
    }
}

impl std::fmt::Debug for RagPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagPipeline")
            .field("embedder", &self.embedder)
            .field("reranker", &self.reranker.name())
            .field("chunk_config", &self.chunk_config)
            .field("retrieve_width", &self.retrieve_width)
            .finish()
    }
}
