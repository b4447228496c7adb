//! Configuration management for dossier.
//!
//! Configuration is layered, later sources winning:
//! - Built-in defaults
//! - Config file (`.dossier/config.yaml`, or `DOSSIER_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! The configuration is workspace-centric; prompt overrides and exported
//! reports live under the workspace.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Providers the LLM factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 2] = ["ollama", "openai"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .dossier/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Active LLM provider ("ollama" or "openai")
    pub provider: String,

    /// Model identifier for the active provider
    pub model: String,

    /// Explicit API key for the LLM provider
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// LLM provider configurations
    pub llm: Option<LlmConfig>,

    /// Report generation settings
    pub research: ResearchSettings,

    /// Retrieval pipeline settings
    pub rag: RagSettings,

    /// Web search settings
    pub search: SearchSettings,

    /// PDF export settings
    pub export: ExportSettings,
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    /// Any OpenAI-compatible chat completions endpoint (OpenAI, Gemini, vLLM, ...)
    OpenAI {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
    },
    Ollama {
        endpoint: String,
        model: String,
        timeout: Option<u64>,
    },
}

/// Settings for the report planner and section writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResearchSettings {
    /// Results per query for the broad planning search
    pub initial_search_results: usize,

    /// Results per query for each section's search
    pub deep_dive_search_results: usize,

    /// Evidence passages handed to the section writer
    pub chunks_to_use_for_writing: usize,

    pub writer_temperature: f32,
    pub planner_temperature: f32,
    pub clarify_temperature: f32,
    pub brief_temperature: f32,
    pub expander_temperature: f32,

    /// Character budget for the planning context sent to the planner
    pub planning_context_chars: usize,

    /// Maximum characters per search query
    pub max_query_chars: usize,

    /// Number of trailing description lines turned into extra queries
    pub max_description_queries: usize,
}

impl Default for ResearchSettings {
    fn default() -> Self {
        Self {
            initial_search_results: 5,
            deep_dive_search_results: 5,
            chunks_to_use_for_writing: 7,
            writer_temperature: 0.4,
            planner_temperature: 0.2,
            clarify_temperature: 0.5,
            brief_temperature: 0.2,
            expander_temperature: 0.6,
            planning_context_chars: 20_000,
            max_query_chars: 400,
            max_description_queries: 4,
        }
    }
}

/// Settings for chunking, embedding, retrieval and reranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RagSettings {
    /// Maximum chunk length in characters
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    pub chunk_overlap: usize,

    /// Candidates pulled from the vector index before reranking
    pub chunks_to_retrieve: usize,

    pub embedding: EmbeddingSettings,

    pub reranker: RerankerSettings,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 150,
            chunks_to_retrieve: 20,
            embedding: EmbeddingSettings::default(),
            reranker: RerankerSettings::default(),
        }
    }
}

impl RagSettings {
    /// Check the numeric invariants the pipeline relies on.
    pub fn validate(&self) -> AppResult<()> {
        if self.chunk_size == 0 {
            return Err(AppError::Config("rag.chunkSize must be positive".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(AppError::Config(format!(
                "rag.chunkOverlap ({}) must be smaller than rag.chunkSize ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "rag.embedding.dimensions must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Embedding model selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbeddingSettings {
    /// "trigram" (offline) or "ollama"
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
    pub endpoint: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            endpoint: None,
        }
    }
}

/// Relevance reranker selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RerankerSettings {
    /// "lexical" (local) or "http" (hosted cross-encoder)
    pub provider: String,
    pub model: String,
    pub endpoint: Option<String>,
    pub api_key_env: Option<String>,
    pub timeout_secs: u64,
}

impl Default for RerankerSettings {
    fn default() -> Self {
        Self {
            provider: "lexical".to_string(),
            model: "bm25".to_string(),
            endpoint: None,
            api_key_env: None,
            timeout_secs: 30,
        }
    }
}

/// Web search settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchSettings {
    pub provider: String,
    pub api_key_env: String,
    pub endpoint: String,
    pub search_depth: String,
    pub include_raw_content: bool,
    pub timeout_secs: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            provider: "tavily".to_string(),
            api_key_env: "TAVILY_API_KEY".to_string(),
            endpoint: "https://api.tavily.com".to_string(),
            search_depth: "advanced".to_string(),
            include_raw_content: true,
            timeout_secs: 30,
        }
    }
}

/// Markdown-to-PDF export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportSettings {
    pub pandoc: String,
    pub pdf_engine: String,
    pub margin: String,
    pub font_size: String,
    pub main_font: String,
    pub sans_font: String,
    pub mono_font: String,
    pub toc: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            pandoc: "pandoc".to_string(),
            pdf_engine: "xelatex".to_string(),
            margin: "1in".to_string(),
            font_size: "12pt".to_string(),
            main_font: "Latin Modern Roman".to_string(),
            sans_font: "Latin Modern Sans".to_string(),
            mono_font: "Latin Modern Mono".to_string(),
            toc: true,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    research: Option<ResearchSettings>,
    rag: Option<RagSettings>,
    search: Option<SearchSettings>,
    export: Option<ExportSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "ollama".to_string(),
            model: "llama3.2".to_string(),
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            llm: None,
            research: ResearchSettings::default(),
            rag: RagSettings::default(),
            search: SearchSettings::default(),
            export: ExportSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables, the config file and defaults.
    ///
    /// Environment variables:
    /// - `DOSSIER_WORKSPACE`: Override workspace path
    /// - `DOSSIER_CONFIG`: Path to config file
    /// - `DOSSIER_PROVIDER`: LLM provider
    /// - `DOSSIER_MODEL`: Model identifier
    /// - `DOSSIER_API_KEY`: API key for the LLM provider
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use dossier_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("DOSSIER_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("DOSSIER_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.dossier_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("DOSSIER_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("DOSSIER_MODEL") {
            config.model = model;
        }

        config.api_key = std::env::var("DOSSIER_API_KEY").ok();
        if config.log_level.is_none() {
            config.log_level = std::env::var("RUST_LOG").ok();
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    pub fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config file {:?}: {}", path, e)))
    }

    fn merge_yaml_str(&self, contents: &str) -> AppResult<Self> {
        let config_file: ConfigFile = serde_yaml::from_str(contents)?;
        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();

            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                result.model = match provider_config {
                    ProviderConfig::OpenAI { model, .. } => model.clone(),
                    ProviderConfig::Ollama { model, .. } => model.clone(),
                };
            }

            result.llm = Some(llm);
        }

        if let Some(research) = config_file.research {
            result.research = research;
        }
        if let Some(rag) = config_file.rag {
            result.rag = rag;
        }
        if let Some(search) = config_file.search {
            result.search = search;
        }
        if let Some(export) = config_file.export {
            result.export = export;
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables and the
    /// config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .dossier directory.
    pub fn dossier_dir(&self) -> PathBuf {
        self.workspace.join(".dossier")
    }

    /// Get the configuration block for a provider, if the config file defined one.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm.as_ref().and_then(|llm| llm.providers.get(provider))
    }

    /// Endpoint configured for the active provider.
    pub fn provider_endpoint(&self) -> Option<&str> {
        match self.get_provider_config(&self.provider)? {
            ProviderConfig::Ollama { endpoint, .. } => Some(endpoint.as_str()),
            ProviderConfig::OpenAI { endpoint, .. } => endpoint.as_deref(),
        }
    }

    /// Resolve the LLM API key: `DOSSIER_API_KEY` first, then the provider's `apiKeyEnv`.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        let env_var = match self.get_provider_config(provider) {
            Some(ProviderConfig::OpenAI { api_key_env, .. }) => api_key_env.clone(),
            Some(ProviderConfig::Ollama { .. }) => return None,
            None if provider == "openai" => "OPENAI_API_KEY".to_string(),
            None => return None,
        };

        std::env::var(env_var).ok().filter(|key| !key.trim().is_empty())
    }

    /// Resolve the web search API key from `search.apiKeyEnv`.
    pub fn resolve_search_api_key(&self) -> Option<String> {
        std::env::var(&self.search.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    /// Validate the LLM side of the configuration.
    ///
    /// A failure here is fatal at startup: no report request is accepted.
    pub fn validate(&self) -> AppResult<()> {
        if !KNOWN_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if self.provider == "openai" && self.resolve_api_key(&self.provider).is_none() {
            return Err(AppError::Config(
                "API key not found for provider 'openai'. Set DOSSIER_API_KEY or the configured apiKeyEnv"
                    .to_string(),
            ));
        }

        self.rag.validate()
    }

    /// Validate everything a report run needs, including search credentials.
    pub fn validate_for_research(&self) -> AppResult<()> {
        self.validate()?;

        if self.search.provider != "tavily" {
            return Err(AppError::Config(format!(
                "Unknown search provider: {}. Supported: tavily",
                self.search.provider
            )));
        }

        if self.resolve_search_api_key().is_none() {
            return Err(AppError::Config(format!(
                "Search API key not found in environment variable: {}",
                self.search.api_key_env
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.research.chunks_to_use_for_writing, 7);
        assert_eq!(config.rag.chunks_to_retrieve, 20);
        assert_eq!(config.rag.chunk_size, 1000);
        assert_eq!(config.rag.chunk_overlap, 150);
        assert!(!config.verbose);
    }

    #[test]
    fn test_dossier_dir() {
        let config = AppConfig::default();
        assert!(config.dossier_dir().ends_with(".dossier"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            None,
            None,
            Some("openai".to_string()),
            Some("gpt-4o-mini".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.provider, "openai");
        assert_eq!(overridden.model, "gpt-4o-mini");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_ollama() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_openai_requires_key() {
        let mut config = AppConfig::default();
        config.provider = "openai".to_string();
        config.llm = Some(LlmConfig {
            active_provider: "openai".to_string(),
            providers: HashMap::from([(
                "openai".to_string(),
                ProviderConfig::OpenAI {
                    api_key_env: "DOSSIER_TEST_KEY_THAT_IS_NOT_SET".to_string(),
                    model: "gpt-4o-mini".to_string(),
                    endpoint: None,
                },
            )]),
        });
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        config.api_key = Some("sk-test".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_for_research_requires_search_key() {
        let mut config = AppConfig::default();
        config.search.api_key_env = "DOSSIER_TEST_SEARCH_KEY_THAT_IS_NOT_SET".to_string();
        let err = config.validate_for_research().unwrap_err();
        assert!(err.to_string().contains("DOSSIER_TEST_SEARCH_KEY_THAT_IS_NOT_SET"));
    }

    #[test]
    fn test_rag_overlap_must_be_smaller_than_chunk() {
        let mut rag = RagSettings::default();
        rag.chunk_overlap = rag.chunk_size;
        assert!(rag.validate().is_err());
    }

    #[test]
    fn test_merge_yaml_sections() {
        let yaml = r#"
llm:
  activeProvider: openai
  providers:
    openai:
      apiKeyEnv: GEMINI_API_KEY
      model: gemini-2.5-flash-lite
      endpoint: https://generativelanguage.googleapis.com/v1beta/openai
research:
  chunksToUseForWriting: 5
  writerTemperature: 0.3
rag:
  chunkSize: 800
  reranker:
    provider: http
    endpoint: http://localhost:8080/rerank
logging:
  level: warn
  color: false
"#;
        let merged = AppConfig::default().merge_yaml_str(yaml).unwrap();

        assert_eq!(merged.provider, "openai");
        assert_eq!(merged.model, "gemini-2.5-flash-lite");
        assert_eq!(
            merged.provider_endpoint(),
            Some("https://generativelanguage.googleapis.com/v1beta/openai")
        );
        assert_eq!(merged.research.chunks_to_use_for_writing, 5);
        assert_eq!(merged.research.deep_dive_search_results, 5);
        assert_eq!(merged.rag.chunk_size, 800);
        assert_eq!(merged.rag.chunk_overlap, 150);
        assert_eq!(merged.rag.reranker.provider, "http");
        assert_eq!(merged.log_level, Some("warn".to_string()));
        assert!(merged.no_color);
    }

    #[test]
    fn test_merge_yaml_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "search:\n  searchDepth: basic\n").unwrap();

        let merged = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(merged.search.search_depth, "basic");
        assert_eq!(merged.search.api_key_env, "TAVILY_API_KEY");
    }

    #[test]
    fn test_resolving_config_leaves_workspace_untouched() {
        let workspace = tempfile::TempDir::new().unwrap();
        let path = workspace.path().join("dossier.yaml");
        std::fs::write(&path, "research:\n  chunksToUseForWriting: 3\n").unwrap();

        let config = AppConfig::default()
            .merge_yaml(&path)
            .unwrap()
            .with_overrides(
                Some(workspace.path().to_path_buf()),
                Some(path),
                None,
                None,
                None,
                true,
                false,
            );
        config.validate().unwrap();

        assert_eq!(config.research.chunks_to_use_for_writing, 3);
        assert!(!config.dossier_dir().exists());
    }
}
