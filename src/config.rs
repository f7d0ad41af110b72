/// Configuration system for repo-rag
///
/// Supports loading from multiple sources with priority:
/// Environment variables > Config file > Defaults
use crate::error::{ConfigError, RagError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Model server (Ollama-compatible) configuration
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Indexing configuration
    #[serde(default)]
    pub indexing: IndexingConfig,

    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

/// Model server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL of the model server
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for embeddings
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Model used for chat completions
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Timeout for embed/chat requests, in minutes
    #[serde(default = "default_request_timeout_minutes")]
    pub request_timeout_minutes: u64,

    /// Maximum attempts per request
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff base: delay before retry N is base^N seconds
    #[serde(default = "default_retry_delay_base_seconds")]
    pub retry_delay_base_seconds: u64,

    /// Dimension of the zero vector substituted when embedding fails
    #[serde(default = "default_fallback_embedding_dimension")]
    pub fallback_embedding_dimension: usize,

    /// How long a healthy probe result is trusted, in seconds
    #[serde(default = "default_health_cache_seconds")]
    pub health_cache_seconds: u64,

    /// Timeout for the health probe, in seconds
    #[serde(default = "default_health_probe_timeout_seconds")]
    pub health_probe_timeout_seconds: u64,
}

/// Indexing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    /// Number of files processed concurrently
    #[serde(default = "default_max_parallelism")]
    pub max_parallelism: usize,

    /// Number of chunks embedded per batch
    #[serde(default = "default_embedding_batch_size")]
    pub embedding_batch_size: usize,

    /// Maximum file size to index, in bytes
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Target chunk size for the line chunker, in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Target chunk size for SQL files, in characters
    #[serde(default = "default_sql_chunk_size")]
    pub sql_chunk_size: usize,
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of chunks retrieved per question
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Results at or below this cosine similarity are treated as noise
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Maximum file paths listed in degraded-mode prompts
    #[serde(default = "default_degraded_file_list_limit")]
    pub degraded_file_list_limit: usize,

    /// Maximum file paths listed in the normal context prompt
    #[serde(default = "default_prompt_file_list_limit")]
    pub prompt_file_list_limit: usize,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP surface binds to
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

// Default value functions
fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_chat_model() -> String {
    "llama3.2".to_string()
}

fn default_request_timeout_minutes() -> u64 {
    5
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_base_seconds() -> u64 {
    2
}

fn default_fallback_embedding_dimension() -> usize {
    384
}

fn default_health_cache_seconds() -> u64 {
    30
}

fn default_health_probe_timeout_seconds() -> u64 {
    10
}

fn default_max_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn default_embedding_batch_size() -> usize {
    50
}

fn default_max_file_size() -> u64 {
    1_048_576 // 1 MiB
}

fn default_chunk_size() -> usize {
    2000
}

fn default_sql_chunk_size() -> usize {
    3000
}

fn default_top_k() -> usize {
    5
}

fn default_similarity_threshold() -> f32 {
    0.1
}

fn default_degraded_file_list_limit() -> usize {
    50
}

fn default_prompt_file_list_limit() -> usize {
    100
}

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            embedding_model: default_embedding_model(),
            chat_model: default_chat_model(),
            request_timeout_minutes: default_request_timeout_minutes(),
            max_retries: default_max_retries(),
            retry_delay_base_seconds: default_retry_delay_base_seconds(),
            fallback_embedding_dimension: default_fallback_embedding_dimension(),
            health_cache_seconds: default_health_cache_seconds(),
            health_probe_timeout_seconds: default_health_probe_timeout_seconds(),
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            max_parallelism: default_max_parallelism(),
            embedding_batch_size: default_embedding_batch_size(),
            max_file_size: default_max_file_size(),
            chunk_size: default_chunk_size(),
            sql_chunk_size: default_sql_chunk_size(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            similarity_threshold: default_similarity_threshold(),
            degraded_file_list_limit: default_degraded_file_list_limit(),
            prompt_file_list_limit: default_prompt_file_list_limit(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self, RagError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed(format!("Invalid TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), RagError> {
        if self.ollama.base_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "ollama.base_url".to_string(),
                reason: "must not be empty".to_string(),
            }
            .into());
        }

        if self.ollama.fallback_embedding_dimension == 0 {
            return Err(ConfigError::InvalidValue {
                key: "ollama.fallback_embedding_dimension".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.indexing.max_parallelism == 0 {
            return Err(ConfigError::InvalidValue {
                key: "indexing.max_parallelism".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.indexing.embedding_batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "indexing.embedding_batch_size".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.indexing.chunk_size == 0 || self.indexing.sql_chunk_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "indexing.chunk_size".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.indexing.max_file_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "indexing.max_file_size".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.retrieval.top_k == 0 {
            return Err(ConfigError::InvalidValue {
                key: "retrieval.top_k".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if !(-1.0..=1.0).contains(&self.retrieval.similarity_threshold) {
            return Err(ConfigError::InvalidValue {
                key: "retrieval.similarity_threshold".to_string(),
                reason: format!(
                    "must be between -1.0 and 1.0, got {}",
                    self.retrieval.similarity_threshold
                ),
            }
            .into());
        }

        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("REPO_RAG_OLLAMA_URL") {
            self.ollama.base_url = url;
        }

        if let Ok(model) = std::env::var("REPO_RAG_EMBEDDING_MODEL") {
            self.ollama.embedding_model = model;
        }

        if let Ok(model) = std::env::var("REPO_RAG_CHAT_MODEL") {
            self.ollama.chat_model = model;
        }

        if let Ok(parallelism) = std::env::var("REPO_RAG_MAX_PARALLELISM")
            && let Ok(n) = parallelism.parse()
        {
            self.indexing.max_parallelism = n;
        }

        if let Ok(batch_size) = std::env::var("REPO_RAG_BATCH_SIZE")
            && let Ok(n) = batch_size.parse()
        {
            self.indexing.embedding_batch_size = n;
        }

        if let Ok(addr) = std::env::var("REPO_RAG_LISTEN_ADDR") {
            self.server.listen_addr = addr;
        }
    }

    /// Create a Config from an optional file, with environment overrides applied
    pub fn load(path: Option<&Path>) -> Result<Self, RagError> {
        let mut config = match path {
            Some(p) => {
                tracing::info!("Loading config from: {}", p.display());
                Self::from_file(p)?
            }
            None => {
                tracing::info!("No config file given, using defaults");
                Self::default()
            }
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }
}
