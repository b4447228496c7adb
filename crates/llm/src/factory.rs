//! LLM provider factory.
//!
//! Builds an [`LlmClient`] from the resolved application configuration.
//! Provider resolution and secret lookup happen once at startup; a
//! misconfigured provider is a fatal configuration error.

use crate::client::LlmClient;
use crate::providers::openai::DEFAULT_OPENAI_ENDPOINT;
use crate::providers::{OllamaClient, OpenAiClient};
use dossier_core::config::ProviderConfig;
use dossier_core::{AppConfig, AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Supported LLM provider types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    OpenAI,
    Ollama,
}

impl ProviderType {
    /// Parse provider type from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Some(Self::OpenAI),
            "ollama" => Some(Self::Ollama),
            _ => None,
        }
    }

    /// Get the canonical provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Ollama => "ollama",
        }
    }
}

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("ollama", "openai")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - API key, required by OpenAI-compatible providers
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or a required
/// secret is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn LlmClient>> {
    match ProviderType::parse(provider) {
        Some(ProviderType::Ollama) => {
            let base_url = endpoint.unwrap_or("http://localhost:11434");
            Ok(Arc::new(OllamaClient::with_base_url(base_url)))
        }
        Some(ProviderType::OpenAI) => {
            let key = api_key
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| {
                    AppError::Config("OpenAI provider requires API key".to_string())
                })?;
            let endpoint = endpoint.unwrap_or(DEFAULT_OPENAI_ENDPOINT);
            Ok(Arc::new(OpenAiClient::new(endpoint, key)))
        }
        None => Err(AppError::Config(format!("Unknown provider: {}", provider))),
    }
}

/// Create the client for the active provider of a loaded configuration.
pub fn create_client_from_config(config: &AppConfig) -> AppResult<Arc<dyn LlmClient>> {
    if let Some(ProviderConfig::Ollama {
        endpoint,
        timeout: Some(secs),
        ..
    }) = config.get_provider_config(&config.provider)
    {
        let client = OllamaClient::with_timeout(endpoint.as_str(), Duration::from_secs(*secs))?;
        return Ok(Arc::new(client));
    }

    let api_key = config.resolve_api_key(&config.provider);
    let client = create_client(
        &config.provider,
        config.provider_endpoint(),
        api_key.as_deref(),
    )?;

    tracing::info!(
        provider = client.provider_name(),
        model = %config.model,
        "LLM client ready"
    );

    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_type_parsing() {
        assert_eq!(ProviderType::parse("openai"), Some(ProviderType::OpenAI));
        assert_eq!(ProviderType::parse("Ollama"), Some(ProviderType::Ollama));
        assert_eq!(ProviderType::parse("claude"), None);
        assert_eq!(ProviderType::Ollama.as_str(), "ollama");
    }

    #[test]
    fn test_create_ollama_client() {
        let client = create_client("ollama", None, None).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_create_ollama_with_custom_endpoint() {
        let client = create_client("ollama", Some("http://localhost:8080"), None);
        assert!(client.is_ok());
    }

    #[test]
    fn test_openai_requires_api_key() {
        match create_client("openai", None, None) {
            Err(AppError::Config(msg)) => assert!(msg.contains("requires API key")),
            _ => panic!("Expected config error for OpenAI without API key"),
        }

        assert!(create_client("openai", None, Some("  ")).is_err());
    }

    #[test]
    fn test_create_openai_client() {
        let client = create_client("openai", None, Some("sk-test")).unwrap();
        assert_eq!(client.provider_name(), "openai");
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("unknown", None, None) {
            Err(AppError::Config(msg)) => assert!(msg.contains("Unknown provider")),
            _ => panic!("Expected error for unknown provider"),
        }
    }

    #[test]
    fn test_from_default_config() {
        let config = AppConfig::default();
        let client = create_client_from_config(&config).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }
}
