//! Scripted collaborators shared by the research tests.

use crate::plan::Planner;
use crate::search::{SearchClient, SearchHit};
use crate::writer::SectionWriter;
use async_trait::async_trait;
use dossier_core::config::ResearchSettings;
use dossier_core::AppResult;
use dossier_knowledge::embeddings::TrigramProvider;
use dossier_knowledge::rerank::LexicalReranker;
use dossier_knowledge::{ChunkConfig, RagPipeline};
use dossier_llm::{Completer, LlmClient, LlmRequest, LlmResponse, LlmUsage};
use dossier_prompt::PromptLibrary;
use std::sync::{Arc, Mutex};

type Reply = dyn Fn(&LlmRequest) -> AppResult<String> + Send + Sync;

/// LLM whose reply is computed from the request.
pub(crate) struct ScriptedLlm {
    reply: Box<Reply>,
    seen: Mutex<Vec<LlmRequest>>,
}

impl ScriptedLlm {
    pub(crate) fn new(
        reply: impl Fn(&LlmRequest) -> AppResult<String> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            reply: Box::new(reply),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn requests(&self) -> Vec<LlmRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.seen.lock().unwrap().push(request.clone());
        let content = (self.reply)(request)?;
        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage: LlmUsage::default(),
        })
    }
}

type Results = dyn Fn(&str) -> Vec<(&'static str, String)> + Send + Sync;

/// Search backend answering from a function of the query.
pub(crate) struct ScriptedSearch {
    results: Box<Results>,
    queries: Mutex<Vec<String>>,
}

impl ScriptedSearch {
    pub(crate) fn new(
        results: impl Fn(&str) -> Vec<(&'static str, String)> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            results: Box::new(results),
            queries: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn empty() -> Arc<Self> {
        Self::new(|_| Vec::new())
    }

    pub(crate) fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchClient for ScriptedSearch {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn search(&self, query: &str, max_results: usize) -> AppResult<Vec<SearchHit>> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok((self.results)(query)
            .into_iter()
            .take(max_results)
            .map(|(url, content)| SearchHit {
                url: url.to_string(),
                content,
                raw_content: None,
            })
            .collect())
    }
}

fn completer(llm: Arc<ScriptedLlm>) -> Completer {
    Completer::new(llm, "test-model", ResearchSettings::default().planner_temperature)
}

fn prompts() -> Arc<PromptLibrary> {
    Arc::new(PromptLibrary::builtin().unwrap())
}

/// Offline RAG pipeline: trigram embeddings, BM25 reranking.
pub(crate) fn offline_rag() -> RagPipeline {
    RagPipeline::new(
        Arc::new(TrigramProvider::new(384)),
        Arc::new(LexicalReranker::new()),
        ChunkConfig::new(1000, 150).unwrap(),
        20,
    )
}

pub(crate) fn planner_with(llm: Arc<ScriptedLlm>, search: Arc<ScriptedSearch>) -> Planner {
    Planner::new(completer(llm), prompts(), search, ResearchSettings::default())
}

pub(crate) fn writer_with(llm: Arc<ScriptedLlm>, search: Arc<ScriptedSearch>) -> SectionWriter {
    writer_with_prompts(llm, search, prompts())
}

pub(crate) fn writer_with_prompts(
    llm: Arc<ScriptedLlm>,
    search: Arc<ScriptedSearch>,
    prompts: Arc<PromptLibrary>,
) -> SectionWriter {
    SectionWriter::new(
        completer(llm),
        prompts,
        search,
        offline_rag(),
        ResearchSettings::default(),
    )
}
