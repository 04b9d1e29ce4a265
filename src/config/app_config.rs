use std::collections::HashMap;

use serde::Deserialize;

use crate::domain::ingestion::ChunkingConfig;
use crate::domain::tiering::CacheSettings;
use crate::domain::DomainError;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub redis: RedisConfig,
    pub qdrant: QdrantConfig,
    pub cache: CacheConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
    pub chunking: ChunkingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Layer-0 backing store
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub db: i64,
    pub password: Option<String>,
    pub connection_timeout_secs: u64,
}

/// Vector store for Layers 1 and 2
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QdrantConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub semantic_collection: String,
    pub document_collection: String,
}

/// Thresholds and TTL as read from configuration; see [`AppConfig::cache_settings`]
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub semantic_threshold: f32,
    pub document_threshold: f32,
    pub ttl_seconds: u64,
    pub document_top_k: usize,
    /// Capacity of the in-process Layer-0 store used by `--in-memory`
    pub in_memory_capacity: u64,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// OpenAI-compatible `/v1/embeddings`
    #[default]
    OpenAi,
    /// Offline feature hashing
    Hashing,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingBackend,
    pub model: String,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    /// Required for models whose dimension is not known in advance
    pub dimensions: Option<usize>,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Falls back to the first registered provider when not registered
    pub default_provider: Option<String>,
    pub temperature: f32,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub openai_model: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub request_timeout_secs: u64,
    pub remote_endpoints: Vec<RemoteEndpointConfig>,
}

/// A text-completion endpoint reached over HTTP POST
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteEndpointConfig {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Shown as `Custom (<model_label>)`; defaults to the name
    #[serde(default)]
    pub model_label: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Merged into every request body
    #[serde(default)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            db: 0,
            password: None,
            connection_timeout_secs: 5,
        }
    }
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".to_string(),
            api_key: None,
            semantic_collection: "semantic_cache".to_string(),
            document_collection: "rag_documents".to_string(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        let settings = CacheSettings::default();

        Self {
            semantic_threshold: settings.semantic_threshold,
            document_threshold: settings.document_threshold,
            ttl_seconds: settings.ttl_seconds,
            document_top_k: settings.document_top_k,
            in_memory_capacity: 10_000,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingBackend::default(),
            model: "text-embedding-3-small".to_string(),
            base_url: None,
            api_key: None,
            dimensions: None,
            request_timeout_secs: 30,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            default_provider: Some("openai".to_string()),
            temperature: 0.7,
            openai_api_key: None,
            openai_base_url: None,
            openai_model: "gpt-3.5-turbo".to_string(),
            gemini_api_key: None,
            gemini_model: "gemini-pro".to_string(),
            request_timeout_secs: 60,
            remote_endpoints: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Loads `config/default`, `config/local`, then `APP__*` environment variables
    ///
    /// Malformed values are errors; nothing falls back to defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_with_env(Self::environment())
    }

    fn environment() -> config::Environment {
        config::Environment::with_prefix("APP")
            .separator("__")
            .try_parsing(true)
    }

    fn load_with_env(environment: config::Environment) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(environment);

        builder.build()?.try_deserialize()
    }

    /// Validated thresholds and TTL for the orchestrator
    pub fn cache_settings(&self) -> Result<CacheSettings, DomainError> {
        CacheSettings::new(
            self.cache.semantic_threshold,
            self.cache.document_threshold,
            self.cache.ttl_seconds,
        )?
        .with_document_top_k(self.cache.document_top_k)
        .validated()
    }
}
