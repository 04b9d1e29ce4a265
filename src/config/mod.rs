//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, CacheConfig, EmbeddingBackend, EmbeddingConfig, LlmConfig, LogFormat,
    LoggingConfig, QdrantConfig, RedisConfig, RemoteEndpointConfig,
};
