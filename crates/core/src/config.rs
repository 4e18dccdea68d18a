//! Configuration management for ragdesk.
//!
//! Configuration is layered, later layers winning:
//! - Built-in defaults
//! - YAML config file (`ragdesk.yaml` in the working directory, or `RAGDESK_CONFIG`)
//! - Environment variables
//! - Command-line flags

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "ragdesk.yaml";

/// Embedding providers the knowledge crate can construct.
pub const EMBEDDING_PROVIDERS: [&str; 2] = ["trigram", "ollama"];

/// Generation providers the llm crate can construct.
pub const GENERATION_PROVIDERS: [&str; 1] = ["ollama"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Config file that was merged, if any
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Corpus, chunking and retrieval settings
    pub knowledge: KnowledgeSettings,

    /// Embedding model settings
    pub embedding: EmbeddingSettings,

    /// Generation model settings
    pub generation: GenerationSettings,
}

/// Corpus, chunking and retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct KnowledgeSettings {
    /// Directory scanned at startup
    pub documents_dir: PathBuf,

    /// Maximum chunk length in characters
    pub chunk_size: usize,

    /// Characters shared between adjacent chunks
    pub chunk_overlap: usize,

    /// Number of chunks retrieved per query
    pub top_k: usize,

    /// Optional directory with prompt template overrides
    pub prompts_dir: Option<PathBuf>,

    /// Largest accepted upload in bytes
    pub max_upload_bytes: usize,
}

impl Default for KnowledgeSettings {
    fn default() -> Self {
        Self {
            documents_dir: PathBuf::from("documents"),
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 3,
            prompts_dir: None,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Embedding model settings.
///
/// Indexing and querying always share one provider instance, so these values
/// describe the model for the whole lifetime of an index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbeddingSettings {
    /// Provider name: "trigram" or "ollama"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Base URL for network providers
    pub endpoint: String,

    /// Per-call timeout in seconds
    pub timeout_secs: u64,

    /// Attempts per embedding request (1 disables retries)
    pub max_attempts: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            endpoint: "http://localhost:11434".to_string(),
            timeout_secs: 30,
            max_attempts: 1,
        }
    }
}

/// Generation model settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationSettings {
    /// Provider name
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Base URL of the provider API
    pub endpoint: String,

    /// Sampling temperature (0.0 - 2.0)
    pub temperature: f32,

    /// Maximum generated tokens
    pub max_tokens: u32,

    /// Per-call timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "llama3.2:1b".to_string(),
            endpoint: "http://localhost:11434".to_string(),
            temperature: 0.1,
            max_tokens: 256,
            timeout_secs: 120,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    knowledge: Option<KnowledgeSettings>,
    embedding: Option<EmbeddingSettings>,
    generation: Option<GenerationSettings>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            knowledge: KnowledgeSettings::default(),
            embedding: EmbeddingSettings::default(),
            generation: GenerationSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML file and the environment.
    ///
    /// `config_file` takes precedence over `RAGDESK_CONFIG`; when neither is
    /// given, `ragdesk.yaml` in the working directory is merged if present.
    /// An explicitly named file that does not exist is an error.
    ///
    /// Environment variables:
    /// - `RAGDESK_CONFIG`: Path to config file
    /// - `RAGDESK_DOCUMENTS`: Documents directory
    /// - `RAGDESK_MODEL`: Generation model
    /// - `RAGDESK_EMBEDDING_PROVIDER` / `RAGDESK_EMBEDDING_MODEL`: Embedding model
    /// - `OLLAMA_BASE_URL`: Endpoint for both Ollama-backed models
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load(config_file: Option<&Path>) -> AppResult<Self> {
        let mut config = Self::default();

        let explicit = config_file
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("RAGDESK_CONFIG").ok().map(PathBuf::from));

        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "Config file does not exist: {:?}",
                        path
                    )));
                }
                config = config.merge_yaml(&path)?;
            }
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    config = config.merge_yaml(&path)?;
                }
            }
        }

        // Environment variables override YAML config
        if let Ok(dir) = std::env::var("RAGDESK_DOCUMENTS") {
            config.knowledge.documents_dir = PathBuf::from(dir);
        }

        if let Ok(model) = std::env::var("RAGDESK_MODEL") {
            config.generation.model = model;
        }

        if let Ok(provider) = std::env::var("RAGDESK_EMBEDDING_PROVIDER") {
            config.embedding.provider = provider;
        }

        if let Ok(model) = std::env::var("RAGDESK_EMBEDDING_MODEL") {
            config.embedding.model = model;
        }

        if let Ok(base_url) = std::env::var("OLLAMA_BASE_URL") {
            config.generation.endpoint = base_url.clone();
            config.embedding.endpoint = base_url;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();
        result.config_file = Some(path.to_path_buf());

        if let Some(knowledge) = config_file.knowledge {
            result.knowledge = knowledge;
        }

        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }

        if let Some(generation) = config_file.generation {
            result.generation = generation;
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over file and environment values.
    pub fn with_overrides(
        mut self,
        documents_dir: Option<PathBuf>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(dir) = documents_dir {
            self.knowledge.documents_dir = dir;
        }

        if let Some(model) = model {
            self.generation.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Validate the configuration, failing fast on values the pipeline cannot run with.
    pub fn validate(&self) -> AppResult<()> {
        let knowledge = &self.knowledge;

        if knowledge.chunk_size == 0 {
            return Err(AppError::Config("chunkSize must be greater than 0".to_string()));
        }

        if knowledge.chunk_overlap >= knowledge.chunk_size {
            return Err(AppError::Config(format!(
                "chunkOverlap ({}) must be smaller than chunkSize ({})",
                knowledge.chunk_overlap, knowledge.chunk_size
            )));
        }

        if knowledge.top_k == 0 {
            return Err(AppError::Config("topK must be greater than 0".to_string()));
        }

        if knowledge.max_upload_bytes == 0 {
            return Err(AppError::Config(
                "maxUploadBytes must be greater than 0".to_string(),
            ));
        }

        if !EMBEDDING_PROVIDERS.contains(&self.embedding.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding.provider,
                EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "embedding dimensions must be greater than 0".to_string(),
            ));
        }

        if self.embedding.max_attempts == 0 {
            return Err(AppError::Config(
                "embedding maxAttempts must be at least 1".to_string(),
            ));
        }

        if !GENERATION_PROVIDERS.contains(&self.generation.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown generation provider: {}. Supported: {}",
                self.generation.provider,
                GENERATION_PROVIDERS.join(", ")
            )));
        }

        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(AppError::Config(format!(
                "temperature must be within 0.0-2.0, got {}",
                self.generation.temperature
            )));
        }

        if self.embedding.timeout_secs == 0 || self.generation.timeout_secs == 0 {
            return Err(AppError::Config("timeouts must be at least 1 second".to_string()));
        }

        Ok(())
    }
}
