//! Prompt system for dossier.
//!
//! This crate provides the report pipeline's prompt templates:
//! - Built-in Handlebars templates for every generation stage
//! - Per-workspace YAML overrides in `.dossier/prompts/<id>.yml`
//! - A [`PromptLibrary`] that renders templates by ID

pub mod builder;
pub mod builtin;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::PromptLibrary;
pub use builtin::ids;
pub use loader::{list_prompts, load_prompt};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition, PromptSource};
