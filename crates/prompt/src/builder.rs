//! Prompt library: template registration and rendering.

use crate::builtin::{builtin_definitions, ids};
use crate::loader::{list_prompts, load_prompt, prompts_dir};
use crate::types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition, PromptSource};
use dossier_core::{AppError, AppResult};
use handlebars::Handlebars;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

const PREVIEW_CHARS: usize = 80;

/// Registry of the active prompt templates.
///
/// Starts from the built-in set; [`PromptLibrary::load`] layers workspace
/// overrides on top. Templates are compiled once at construction.
pub struct PromptLibrary {
    handlebars: Handlebars<'static>,
    sources: HashMap<String, PromptSource>,
}

impl PromptLibrary {
    /// Library with only the built-in templates.
    pub fn builtin() -> AppResult<Self> {
        let mut library = Self {
            handlebars: new_registry(),
            sources: HashMap::new(),
        };

        for definition in builtin_definitions() {
            library.register(&definition, PromptSource::BuiltIn)?;
        }

        Ok(library)
    }

    /// Built-in templates plus any overrides in `<workspace>/.dossier/prompts/`.
    ///
    /// Override files must be named after a known prompt ID; others are
    /// ignored with a warning.
    pub fn load(workspace_path: &Path) -> AppResult<Self> {
        let mut library = Self::builtin()?;

        for id in list_prompts(workspace_path)? {
            if !ids::ALL.contains(&id.as_str()) {
                tracing::warn!(prompt_id = %id, "Ignoring override for unknown prompt");
                continue;
            }

            let definition = load_prompt(workspace_path, &id)?;
            if definition.id != id {
                return Err(AppError::Prompt(format!(
                    "Prompt file {}.yml declares id '{}'",
                    id, definition.id
                )));
            }

            let path = prompts_dir(workspace_path).join(format!("{}.yml", id));
            library.register(&definition, PromptSource::Workspace(path))?;
            tracing::info!(prompt_id = %id, "Using workspace prompt override");
        }

        Ok(library)
    }

    fn register(&mut self, definition: &PromptDefinition, source: PromptSource) -> AppResult<()> {
        self.handlebars
            .register_template_string(&definition.id, &definition.template)
            .map_err(|e| {
                AppError::Prompt(format!(
                    "Failed to register template {}: {}",
                    definition.id, e
                ))
            })?;
        self.sources.insert(definition.id.clone(), source);
        Ok(())
    }

    /// Where the active template for `id` came from.
    pub fn source(&self, id: &str) -> Option<&PromptSource> {
        self.sources.get(id)
    }

    /// Render template `id` with `data` (any serializable map or struct).
    pub fn render<T: Serialize>(&self, id: &str, data: &T) -> AppResult<String> {
        if !self.handlebars.has_template(id) {
            return Err(AppError::Prompt(format!("Unknown prompt: {}", id)));
        }

        self.handlebars
            .render(id, data)
            .map_err(|e| AppError::Prompt(format!("Failed to render template {}: {}", id, e)))
    }

    /// Render template `id` and record what went into it.
    pub fn build(&self, id: &str, variables: &BTreeMap<String, String>) -> AppResult<BuiltPrompt> {
        tracing::debug!("Building prompt: {}", id);

        let text = self.render(id, variables)?;
        let resolved_variables = variables
            .iter()
            .map(|(k, v)| (k.clone(), preview(v)))
            .collect();

        Ok(BuiltPrompt {
            text,
            metadata: BuiltPromptMetadata {
                source_prompt_id: id.to_string(),
                source: self.sources.get(id).cloned().unwrap_or(PromptSource::BuiltIn),
                resolved_variables,
            },
        })
    }
}

fn new_registry() -> Handlebars<'static> {
    let mut handlebars = Handlebars::new();
    // Prompts are plain text, not HTML.
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars
}

fn preview(value: &str) -> String {
    if value.chars().count() <= PREVIEW_CHARS {
        return value.to_string();
    }
    let mut short: String = value.chars().take(PREVIEW_CHARS).collect();
    short.push_str("...");
    short
}
