//! Built-in prompt templates for the research pipeline.
//!
//! Each template is a Handlebars string. Variables per template:
//!
//! | ID | Variables |
//! |----|-----------|
//! | `research.clarify` | `topic` |
//! | `research.brief` | `topic`, `answers` |
//! | `research.planner` | `topic`, `context` |
//! | `research.expand` | `section_title`, `section_description` |
//! | `research.writer.system` | none |
//! | `research.writer.section` | `topic`, `previous_sections`, `section_title`, `research` |

use crate::types::PromptDefinition;

/// Prompt identifiers.
pub mod ids {
    pub const CLARIFY: &str = "research.clarify";
    pub const BRIEF: &str = "research.brief";
    pub const PLANNER: &str = "research.planner";
    pub const EXPAND: &str = "research.expand";
    pub const WRITER_SYSTEM: &str = "research.writer.system";
    pub const WRITER_SECTION: &str = "research.writer.section";

    pub const ALL: [&str; 6] = [
        CLARIFY,
        BRIEF,
        PLANNER,
        EXPAND,
        WRITER_SYSTEM,
        WRITER_SECTION,
    ];
}

const CLARIFY_TEMPLATE: &str = "You are a research assistant. To provide the most relevant \
report on '{{topic}}', please generate 3-4 clarifying questions for the user to help narrow \
down the scope, perspective, and focus. Present them as a simple, clear, numbered list.";

const BRIEF_TEMPLATE: &str = "Synthesize the user's request into a single, concise, and \
factual research topic string suitable for a report title. Do NOT add conversational \
preamble. Initial Topic: '{{topic}}'. User's Refinements: '{{answers}}'. Synthesized Topic String:";

const PLANNER_TEMPLATE: &str = "Your sole task is to create a report outline for the topic: \
'{{topic}}'. Use context: {{context}}. You MUST respond with ONLY a valid JSON object with a \
\"sections\" key. Each section MUST have a \"title\" and a \"description\".";

const EXPAND_TEMPLATE: &str = "Given the report section '{{section_title}}: \
{{section_description}}', generate 3-5 specific sub-topics or key questions to investigate. \
Respond with a simple bulleted list.";

const WRITER_SYSTEM_TEMPLATE: &str = "You are a distinguished academic researcher. Your \
primary function is to synthesize information ONLY from the provided research materials. You \
MUST ignore prior knowledge and base your writing exclusively on the text provided. You are \
meticulous about citing sources. Every factual statement MUST be followed by an in-text \
citation in the format [Source X].";

const WRITER_SECTION_TEMPLATE: &str = "**Report So Far (for context and to avoid repetition):**
---
{{previous_sections}}
---

Now, using the following research material, write the next section of the report on \
'{{topic}}': '## {{section_title}}'. CITE EVERY FACT. Ensure your writing flows naturally.

**Research Material for this Section:**
---
{{research}}
---";

fn definition(id: &str, title: &str, template: &str, output: &str) -> PromptDefinition {
    PromptDefinition {
        id: id.to_string(),
        title: title.to_string(),
        api_version: "1.0".to_string(),
        created_by: "dossier".to_string(),
        template: template.to_string(),
        output: output.to_string(),
    }
}

/// All built-in definitions, in pipeline order.
pub fn builtin_definitions() -> Vec<PromptDefinition> {
    vec![
        definition(ids::CLARIFY, "Clarifying Questions", CLARIFY_TEMPLATE, "markdown"),
        definition(ids::BRIEF, "Research Brief", BRIEF_TEMPLATE, "text"),
        definition(ids::PLANNER, "Report Planner", PLANNER_TEMPLATE, "json"),
        definition(ids::EXPAND, "Outline Expander", EXPAND_TEMPLATE, "markdown"),
        definition(ids::WRITER_SYSTEM, "Writer System Instruction", WRITER_SYSTEM_TEMPLATE, "text"),
        definition(ids::WRITER_SECTION, "Section Writer", WRITER_SECTION_TEMPLATE, "markdown"),
    ]
}
