//! Report planning: brief, outline and outline expansion.

use crate::search::{gather_documents, SearchClient};
use dossier_core::config::ResearchSettings;
use dossier_core::{AppError, AppResult};
use dossier_llm::Completer;
use dossier_prompt::{ids, PromptLibrary};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// One planned report section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    title: String,
    description: String,
}

impl Section {
    /// The title is trimmed and must not be empty.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> AppResult<Self> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(AppError::Report("Section title must not be empty".to_string()));
        }

        Ok(Self {
            title,
            description: description.into(),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Append sub-topics under a "Key areas to investigate" heading.
    pub fn expanded(mut self, subtopics: &str) -> Self {
        self.description.push_str("\n\nKey areas to investigate:\n");
        self.description.push_str(subtopics);
        self
    }
}

/// Result of checking a planner response against the outline schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutlineParse {
    Sections(Vec<Section>),
    ParseFailure(String),
}

#[derive(Debug, Deserialize)]
struct OutlineResponse {
    sections: Vec<OutlineEntry>,
}

#[derive(Debug, Deserialize)]
struct OutlineEntry {
    title: String,
    description: String,
}

/// Strictly parse `{"sections": [{"title", "description"}, ...]}`.
///
/// One bad entry fails the whole outline.
pub fn parse_outline(value: &Value) -> OutlineParse {
    let response: OutlineResponse = match serde_json::from_value(value.clone()) {
        Ok(response) => response,
        Err(e) => return OutlineParse::ParseFailure(format!("unexpected outline shape: {}", e)),
    };

    if response.sections.is_empty() {
        return OutlineParse::ParseFailure("no sections".to_string());
    }

    let mut sections = Vec::with_capacity(response.sections.len());
    for (i, entry) in response.sections.into_iter().enumerate() {
        match Section::new(entry.title, entry.description) {
            Ok(section) => sections.push(section),
            Err(_) => return OutlineParse::ParseFailure(format!("section {} has an empty title", i + 1)),
        }
    }

    OutlineParse::Sections(sections)
}

/// Takes the first `max_chars` characters of `text`.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}

/// Brief construction and outline planning.
#[derive(Clone)]
pub struct Planner {
    completer: Completer,
    prompts: Arc<PromptLibrary>,
    search: Arc<dyn SearchClient>,
    settings: ResearchSettings,
}

impl Planner {
    pub fn new(
        completer: Completer,
        prompts: Arc<PromptLibrary>,
        search: Arc<dyn SearchClient>,
        settings: ResearchSettings,
    ) -> Self {
        Self {
            completer,
            prompts,
            search,
            settings,
        }
    }

    /// Questions that help the user narrow the topic.
    pub async fn clarifying_questions(&self, topic: &str) -> AppResult<String> {
        tracing::info!("Generating clarifying questions");
        let prompt = self.prompts.render(ids::CLARIFY, &json!({ "topic": topic }))?;
        Ok(self
            .completer
            .text_completion(&prompt, self.settings.clarify_temperature)
            .await)
    }

    /// Condense topic and answers into a one-line research brief.
    pub async fn construct_brief(&self, topic: &str, answers: &str) -> AppResult<String> {
        tracing::info!("Constructing research brief");
        let prompt = self
            .prompts
            .render(ids::BRIEF, &json!({ "topic": topic, "answers": answers }))?;
        let brief = self
            .completer
            .text_completion(&prompt, self.settings.brief_temperature)
            .await;

        let brief = brief.trim().to_string();
        tracing::info!(brief = %brief, "Research brief ready");
        Ok(brief)
    }

    /// Outline for `brief`, grounded in one broad search.
    ///
    /// An unusable planner response yields no sections.
    pub async fn plan_outline(&self, brief: &str) -> AppResult<Vec<Section>> {
        tracing::info!("Performing broad research for planning");
        let documents = gather_documents(
            self.search.as_ref(),
            &[brief.to_string()],
            self.settings.initial_search_results,
        )
        .await;

        let context = documents
            .iter()
            .map(|d| d.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let context = truncate_chars(&context, self.settings.planning_context_chars);

        tracing::info!("Generating initial plan");
        let prompt = self
            .prompts
            .render(ids::PLANNER, &json!({ "topic": brief, "context": context }))?;
        let response = self.completer.json_completion(&prompt).await;

        match parse_outline(&response) {
            OutlineParse::Sections(sections) => {
                tracing::info!(sections = sections.len(), "Outline planned");
                Ok(sections)
            }
            OutlineParse::ParseFailure(reason) => {
                tracing::warn!(reason = %reason, "Planner response rejected");
                Ok(Vec::new())
            }
        }
    }

    /// Append 3-5 sub-topics to every section's description, in order.
    pub async fn expand_outline(&self, sections: Vec<Section>) -> AppResult<Vec<Section>> {
        tracing::info!("Expanding outline for depth");
        let mut expanded = Vec::with_capacity(sections.len());

        for section in sections {
            let prompt = self.prompts.render(
                ids::EXPAND,
                &json!({
                    "section_title": section.title(),
                    "section_description": section.description(),
                }),
            )?;
            let subtopics = self
                .completer
                .text_completion(&prompt, self.settings.expander_temperature)
                .await;

            tracing::debug!(section = section.title(), "Refined section");
            expanded.push(section.expanded(&subtopics));
        }

        Ok(expanded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fakes::{planner_with, ScriptedLlm, ScriptedSearch};

    #[test]
    fn test_section_rejects_blank_title() {
        assert!(Section::new("  ", "d").is_err());
        assert_eq!(Section::new(" Costs ", "d").unwrap().title(), "Costs");
    }

    #[test]
    fn test_parse_outline_ok() {
        let value = json!({"sections": [
            {"title": "Introduction", "description": "Scope"},
            {"title": "Cost Analysis", "description": "Levelized cost"}
        ]});

        let OutlineParse::Sections(sections) = parse_outline(&value) else {
            panic!("expected sections");
        };
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].title(), "Cost Analysis");
        assert_eq!(sections[1].description(), "Levelized cost");
    }

    #[test]
    fn test_parse_outline_failures() {
        let cases = [
            json!({}),
            json!({"sections": []}),
            json!({"sections": "Introduction"}),
            json!({"sections": [{"title": "A", "description": "x"}, {"description": "no title"}]}),
            json!({"sections": [{"title": "", "description": "x"}]}),
            json!({"sections": [{"title": "A"}]}),
        ];

        for case in cases {
            assert!(
                matches!(parse_outline(&case), OutlineParse::ParseFailure(_)),
                "accepted {}",
                case
            );
        }
    }

    #[test]
    fn test_expanded_appends_subtopics() {
        let section = Section::new("Costs", "Overview").unwrap().expanded("- capex\n- opex");
        assert_eq!(
            section.description(),
            "Overview\n\nKey areas to investigate:\n- capex\n- opex"
        );
    }

    #[test]
    fn test_truncate_chars_is_char_safe() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[tokio::test]
    async fn test_construct_brief_trims() {
        let llm = ScriptedLlm::new(|_| Ok("  Solar desalination costs in the Global South \n".to_string()));
        let planner = planner_with(llm.clone(), ScriptedSearch::empty());

        let brief = planner
            .construct_brief("solar desalination", "focus on cost, global south")
            .await
            .unwrap();

        assert_eq!(brief, "Solar desalination costs in the Global South");
        let seen = llm.requests();
        assert!(seen[0].prompt.contains("focus on cost, global south"));
        assert_eq!(seen[0].temperature, Some(0.2));
    }

    #[tokio::test]
    async fn test_plan_outline_uses_bounded_context() {
        let llm = ScriptedLlm::new(|_| {
            Ok(r#"{"sections":[{"title":"Introduction","description":"Scope"}]}"#.to_string())
        });
        let search = ScriptedSearch::new(|_| vec![("https://p.example", "x".repeat(30_000))]);
        let planner = planner_with(llm.clone(), search.clone());

        let sections = planner.plan_outline("Solar desalination").await.unwrap();

        assert_eq!(sections.len(), 1);
        assert_eq!(search.queries(), vec!["Solar desalination"]);
        let request = &llm.requests()[0];
        assert!(request.json);
        assert!(request.prompt.contains(&"x".repeat(20_000)));
        assert!(!request.prompt.contains(&"x".repeat(20_001)));
    }

    #[tokio::test]
    async fn test_plan_outline_malformed_is_empty() {
        let llm = ScriptedLlm::new(|_| Ok("I cannot do that".to_string()));
        let planner = planner_with(llm, ScriptedSearch::empty());

        assert!(planner.plan_outline("anything").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expand_outline_keeps_order() {
        let llm = ScriptedLlm::new(|req| {
            if req.prompt.contains("'Cost Analysis:") {
                Ok("- capex".to_string())
            } else {
                Ok("- history".to_string())
            }
        });
        let planner = planner_with(llm.clone(), ScriptedSearch::empty());

        let sections = vec![
            Section::new("Introduction", "Scope").unwrap(),
            Section::new("Cost Analysis", "Money").unwrap(),
        ];
        let expanded = planner.expand_outline(sections).await.unwrap();

        assert_eq!(expanded[0].title(), "Introduction");
        assert!(expanded[0].description().ends_with("Key areas to investigate:\n- history"));
        assert!(expanded[1].description().ends_with("Key areas to investigate:\n- capex"));
        assert!(llm.requests().iter().all(|r| r.temperature == Some(0.6)));
    }
}
