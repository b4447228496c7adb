//! Per-section research and drafting.

use crate::citations::CitationTable;
use crate::plan::{truncate_chars, Section};
use crate::search::{gather_documents, SearchClient};
use dossier_core::config::ResearchSettings;
use dossier_core::{AppError, AppResult};
use dossier_knowledge::{Chunk, RagPipeline};
use dossier_llm::Completer;
use dossier_prompt::{ids, PromptLibrary};
use serde_json::json;
use std::sync::Arc;

/// A written section before its citations are remapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionDraft {
    /// Markdown citing evidence as `[Source <n>]`.
    pub text: String,
    pub citations: CitationTable,
    pub queries: Vec<String>,
}

impl SectionDraft {
    /// Stand-in for a section whose drafting failed. Cites nothing.
    pub fn failed(title: &str, error: &AppError) -> Self {
        Self {
            text: format!("## {}\n\n[Error: this section could not be written. {}]", title, error),
            citations: CitationTable::new(),
            queries: Vec::new(),
        }
    }
}

/// Search queries for one section.
///
/// The brief joined with the section title, then the last
/// `max_description_queries` lines of the description; each truncated to
/// `max_query_chars` characters, empty ones dropped.
pub fn build_queries(brief: &str, section: &Section, settings: &ResearchSettings) -> Vec<String> {
    let lines: Vec<&str> = section.description().split('\n').collect();
    let tail = &lines[lines.len().saturating_sub(settings.max_description_queries)..];

    std::iter::once(format!("{} - {}", brief, section.title()))
        .chain(tail.iter().map(|line| line.to_string()))
        .filter(|q| !q.is_empty())
        .map(|q| truncate_chars(&q, settings.max_query_chars).to_string())
        .collect()
}

/// Placeholder for a section with no usable evidence.
pub fn no_evidence_text(title: &str) -> String {
    format!(
        "## {}\n\nNo relevant research material could be found for this section.\n\n",
        title
    )
}

fn render_evidence(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("Source [{}]: {}\n\n", i + 1, chunk.content))
        .collect()
}

/// Researches and drafts single sections.
#[derive(Clone)]
pub struct SectionWriter {
    completer: Completer,
    prompts: Arc<PromptLibrary>,
    search: Arc<dyn SearchClient>,
    rag: RagPipeline,
    settings: ResearchSettings,
}

impl SectionWriter {
    pub fn new(
        completer: Completer,
        prompts: Arc<PromptLibrary>,
        search: Arc<dyn SearchClient>,
        rag: RagPipeline,
        settings: ResearchSettings,
    ) -> Self {
        Self {
            completer,
            prompts,
            search,
            rag,
            settings,
        }
    }

    /// Search, select evidence and draft one section.
    ///
    /// `prior` is the report text so far, given to the model for continuity.
    pub async fn write_section(&self, brief: &str, section: &Section, prior: &str) -> AppResult<SectionDraft> {
        tracing::info!(section = section.title(), "Processing section");

        let queries = build_queries(brief, section, &self.settings);
        let documents = gather_documents(
            self.search.as_ref(),
            &queries,
            self.settings.deep_dive_search_results,
        )
        .await;

        // Retrieval is keyed on the expanded description, not the queries.
        let chunks = match self
            .rag
            .run(&documents, section.description(), self.settings.chunks_to_use_for_writing)
            .await
        {
            Ok(chunks) => chunks,
            Err(e) => {
                tracing::warn!(section = section.title(), error = %e, "Evidence selection failed");
                Vec::new()
            }
        };

        if chunks.is_empty() {
            tracing::info!(section = section.title(), "No evidence found");
            return Ok(SectionDraft {
                text: no_evidence_text(section.title()),
                citations: CitationTable::new(),
                queries,
            });
        }

        let citations: CitationTable = chunks.iter().map(|c| c.source.as_str()).collect();
        let system = self.prompts.render(ids::WRITER_SYSTEM, &json!({}))?;
        let body = self.prompts.render(
            ids::WRITER_SECTION,
            &json!({
                "topic": brief,
                "section_title": section.title(),
                "previous_sections": prior,
                "research": render_evidence(&chunks),
            }),
        )?;
        let prompt = format!("{}\n\n{}", system, body);

        let text = self
            .completer
            .text_completion(&prompt, self.settings.writer_temperature)
            .await;

        tracing::debug!(
            section = section.title(),
            sources = citations.len(),
            chars = text.len(),
            "Section drafted"
        );

        Ok(SectionDraft {
            text,
            citations,
            queries,
        })
    }
}
