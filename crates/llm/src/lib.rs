//! LLM integration crate for dossier.
//!
//! Provider-agnostic access to Large Language Models through a trait-based
//! interface, plus the fail-soft [`Completer`] used by the report pipeline.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//! - **OpenAI-compatible**: OpenAI, Gemini's OpenAI endpoint, vLLM, LM Studio
//!
//! # Example
//! ```no_run
//! use dossier_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Hello, world!", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod completion;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use completion::{Completer, ERROR_MARKER_PREFIX};
pub use factory::{create_client, create_client_from_config, ProviderType};
pub use providers::{OllamaClient, OpenAiClient};
