//! Command handlers for the dossier CLI.
//!
//! Each subcommand lives in its own submodule. The shared wiring that turns
//! an [`AppConfig`] into live collaborators is kept here.

pub mod evidence;
pub mod export;
pub mod research;

pub use evidence::EvidenceCommand;
pub use export::ExportCommand;
pub use research::ResearchCommand;

use dossier_core::{config::AppConfig, AppError, AppResult};
use dossier_knowledge::RagPipeline;
use dossier_llm::{create_client_from_config, Completer};
use dossier_prompt::PromptLibrary;
use dossier_research::{Planner, ReportAgent, SearchClient, SectionWriter, TavilyClient};
use std::sync::Arc;

/// Web search client for the configured provider.
pub(crate) fn search_client(config: &AppConfig) -> AppResult<Arc<dyn SearchClient>> {
    let api_key = config.resolve_search_api_key().ok_or_else(|| {
        AppError::Config(format!(
            "Search API key not found in environment variable: {}",
            config.search.api_key_env
        ))
    })?;

    Ok(Arc::new(TavilyClient::new(&config.search, api_key)?))
}

/// Assemble a report agent from configuration.
///
/// Providers are created once here and shared by every stage of the run.
pub(crate) async fn build_agent(config: &AppConfig) -> AppResult<ReportAgent> {
    let client = create_client_from_config(config)?;
    let completer = Completer::new(client, &config.model, config.research.planner_temperature);
    let prompts = Arc::new(PromptLibrary::load(&config.workspace)?);
    let search = search_client(config)?;
    let rag = RagPipeline::from_settings(&config.rag).await?;

    let planner = Planner::new(
        completer.clone(),
        prompts.clone(),
        search.clone(),
        config.research.clone(),
    );
    let writer = SectionWriter::new(completer, prompts, search, rag, config.research.clone());

    Ok(ReportAgent::new(planner, writer))
}
