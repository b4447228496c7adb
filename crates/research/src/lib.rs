//! Research report generation.
//!
//! A [`ReportAgent`] asks clarifying questions, turns the answers into a
//! brief, plans an outline, then researches and writes every section in
//! order. Each section draws its own evidence through the RAG pipeline and
//! cites it locally; citations are renumbered against one report-wide
//! bibliography as sections are appended.

pub mod agent;
pub mod citations;
pub mod export;
pub mod plan;
pub mod search;
pub mod writer;

#[cfg(test)]
mod tests;

pub use agent::{AgentState, ReportAgent, ReportEvent, ReportStream, RunLease};
pub use citations::{remap_citations, CitationTable, MasterBibliography};
pub use export::{export_markdown, report_file_stem, ExportOutcome};
pub use plan::{parse_outline, OutlineParse, Planner, Section};
pub use search::{gather_documents, SearchClient, SearchHit, TavilyClient};
pub use writer::{build_queries, SectionDraft, SectionWriter};
