//! Cache layer services and the orchestrator that composes them

mod document_cache_service;
mod embedding_service;
mod exact_cache_service;
mod orchestrator;
mod semantic_cache_service;
mod vector_layer;

pub use document_cache_service::{build_context, DocumentCacheService, DEFAULT_DOCUMENT_COLLECTION};
pub use embedding_service::EmbeddingService;
pub use exact_cache_service::ExactCacheService;
pub use orchestrator::CacheOrchestrator;
pub use semantic_cache_service::{SemanticCacheService, SemanticHit, DEFAULT_SEMANTIC_COLLECTION};
pub use vector_layer::VectorLayer;
