//! Embedding provider implementations

mod hashing;
mod openai;

pub use hashing::{HashingEmbeddingProvider, HASHING_MODEL};
pub use openai::OpenAiEmbeddingProvider;

// Re-export HTTP client for use by embedding providers
pub use super::llm::{attribute_to, HttpClient, HttpClientTrait};
