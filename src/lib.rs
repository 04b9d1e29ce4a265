//! PMP LLM Cache
//!
//! Tiered response cache in front of LLM providers:
//! - Layer 0: exact query match (Redis or in-process)
//! - Layer 1: semantic match on query embeddings (Qdrant or in-process)
//! - Layer 2: retrieved document chunks passed to the LLM as context
//! - Provider registry for OpenAI, Gemini, remote endpoints and custom functions

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use infrastructure::services::CacheOrchestrator;

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::EmbeddingBackend;
use crate::domain::cache::Cache;
use crate::domain::embedding::EmbeddingProvider;
use crate::domain::vector::VectorStore;
use crate::infrastructure::cache::{InMemoryCache, InMemoryCacheConfig, RedisCache, RedisCacheConfig};
use crate::infrastructure::embedding::{
    HashingEmbeddingProvider, HttpClient, OpenAiEmbeddingProvider, HASHING_MODEL,
};
use crate::infrastructure::llm::{keyword_responder, LlmProviderFactory, ProviderRegistry};
use crate::infrastructure::services::{
    DocumentCacheService, EmbeddingService, ExactCacheService, SemanticCacheService,
};
use crate::infrastructure::vector::{InMemoryVectorStore, QdrantStoreConfig, QdrantVectorStore};

/// Dimension of the offline hashing embeddings when none is configured
pub const DEFAULT_HASHING_DIMENSION: usize = 384;

/// Name of the offline provider registered in in-memory mode
pub const DEMO_PROVIDER: &str = "demo";

/// Which backends the orchestrator is wired to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    /// Redis, Qdrant, configured embedding and LLM providers
    External,
    /// Process-local stores, hashing embeddings and the keyword provider
    InMemory,
}

/// Create the orchestrator from the default configuration
pub async fn create_orchestrator() -> anyhow::Result<CacheOrchestrator> {
    create_orchestrator_with_config(&AppConfig::default(), BackendMode::External).await
}

/// Create the orchestrator with custom configuration
pub async fn create_orchestrator_with_config(
    config: &AppConfig,
    mode: BackendMode,
) -> anyhow::Result<CacheOrchestrator> {
    info!("Backend mode: {:?}", mode);

    let embeddings = Arc::new(create_embedding_service(config, mode)?);
    let providers = Arc::new(create_provider_registry(config, mode)?);

    let (cache, vectors): (Arc<dyn Cache>, Arc<dyn VectorStore>) = match mode {
        BackendMode::InMemory => (
            Arc::new(InMemoryCache::with_config(
                InMemoryCacheConfig::default().with_max_capacity(config.cache.in_memory_capacity),
            )),
            Arc::new(InMemoryVectorStore::new()),
        ),
        BackendMode::External => {
            let mut redis = RedisCacheConfig::new(&config.redis.host, config.redis.port)
                .with_db(config.redis.db)
                .with_connection_timeout(Duration::from_secs(config.redis.connection_timeout_secs));
            if let Some(ref password) = config.redis.password {
                redis = redis.with_password(password);
            }

            let mut qdrant = QdrantStoreConfig::new(&config.qdrant.url);
            if let Some(ref api_key) = config.qdrant.api_key {
                qdrant = qdrant.with_api_key(api_key);
            }

            info!(
                redis = %format!("{}:{}", config.redis.host, config.redis.port),
                qdrant = %config.qdrant.url,
                "Connecting cache backends"
            );
            (
                Arc::new(RedisCache::new(redis)?),
                Arc::new(QdrantVectorStore::new(qdrant)?),
            )
        }
    };

    let exact = ExactCacheService::new(cache);
    let semantic = SemanticCacheService::new(
        vectors.clone(),
        &config.qdrant.semantic_collection,
        embeddings.dimension(),
    );
    let documents =
        DocumentCacheService::new(vectors, embeddings.clone(), &config.qdrant.document_collection)
            .with_chunking(config.chunking.clone());

    let orchestrator = CacheOrchestrator::new(
        exact,
        semantic,
        documents,
        embeddings,
        providers,
        config.cache_settings()?,
    )?;

    Ok(orchestrator)
}

fn create_embedding_service(config: &AppConfig, mode: BackendMode) -> anyhow::Result<EmbeddingService> {
    let embedding = &config.embedding;

    if mode == BackendMode::InMemory || embedding.provider == EmbeddingBackend::Hashing {
        let dimension = embedding.dimensions.unwrap_or(DEFAULT_HASHING_DIMENSION);
        let provider = HashingEmbeddingProvider::new(dimension)?;
        return Ok(EmbeddingService::new(Arc::new(provider), HASHING_MODEL, dimension));
    }

    let api_key = embedding
        .api_key
        .clone()
        .or_else(|| config.llm.openai_api_key.clone());
    let client = HttpClient::with_timeout(Duration::from_secs(embedding.request_timeout_secs))?;

    let provider = match (embedding.base_url.as_deref(), api_key) {
        (Some(base_url), api_key) => OpenAiEmbeddingProvider::with_base_url(client, api_key, base_url),
        (None, Some(api_key)) => OpenAiEmbeddingProvider::new(client, api_key),
        (None, None) => anyhow::bail!(
            "No embedding credentials: set embedding.api_key or llm.openai_api_key, or use --in-memory"
        ),
    };

    let native = provider.dimensions(&embedding.model);
    let dimension = embedding.dimensions.or(native).ok_or_else(|| {
        anyhow::anyhow!(
            "Embedding dimension for model '{}' is unknown; set embedding.dimensions",
            embedding.model
        )
    })?;

    let service = EmbeddingService::new(Arc::new(provider), &embedding.model, dimension);
    Ok(match native {
        Some(native) if native != dimension => service.with_requested_dimensions(),
        _ => service,
    })
}

fn create_provider_registry(config: &AppConfig, mode: BackendMode) -> anyhow::Result<ProviderRegistry> {
    match mode {
        BackendMode::InMemory => {
            let registry = ProviderRegistry::new();
            registry.register_function(DEMO_PROVIDER, "keyword-responder", keyword_responder)?;
            Ok(registry)
        }
        BackendMode::External => {
            let registry = LlmProviderFactory::create_registry(&config.llm)?;
            if registry.is_empty() {
                warn!("No LLM providers configured; queries that miss every layer will fail");
            }
            Ok(registry)
        }
    }
}
