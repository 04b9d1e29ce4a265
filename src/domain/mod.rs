//! Domain layer - Core types and traits of the tiered cache

pub mod cache;
pub mod embedding;
pub mod error;
pub mod ingestion;
pub mod llm;
pub mod tiering;
pub mod vector;

pub use cache::{Cache, CacheExt, CacheRecord, NormalizedKey};
pub use embedding::{EmbeddingProvider, EmbeddingRequest, EmbeddingResponse};
pub use error::{DomainError, FailureStage};
pub use ingestion::{BatchIngestionReport, ChunkingConfig, DocumentInput, IngestionOutcome};
pub use llm::{
    ChatModel, CompletionProvider, CompletionRequest, LlmRequest, LlmResponse, Message,
    MessageRole, ProviderDescriptor, ProviderKind,
};
pub use tiering::{
    CacheLayer, CacheSettings, ClearReport, HealthReport, HealthStatus, LayerLookup, Query, QueryResult,
    ResolvedLayer,
};
pub use vector::{CollectionSpec, ScoredRecord, VectorPayload, VectorQuery, VectorRecord, VectorStore};
