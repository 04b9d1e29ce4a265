//! Embedding generation shared by the semantic and document layers

use std::sync::Arc;

use tracing::debug;

use crate::domain::embedding::{EmbeddingProvider, EmbeddingRequest};
use crate::domain::DomainError;

/// Turns text into vectors of a fixed, known dimension
#[derive(Debug, Clone)]
pub struct EmbeddingService {
    provider: Arc<dyn EmbeddingProvider>,
    model: String,
    dimension: usize,
    request_dimensions: bool,
}

impl EmbeddingService {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, model: impl Into<String>, dimension: usize) -> Self {
        Self {
            provider,
            model: model.into(),
            dimension,
            request_dimensions: false,
        }
    }

    /// Uses the provider's default model and its advertised dimension
    pub fn from_provider(provider: Arc<dyn EmbeddingProvider>) -> Result<Self, DomainError> {
        let model = provider.default_model();
        let dimension = provider.dimensions(model).ok_or_else(|| {
            DomainError::configuration(format!(
                "Embedding dimension for model '{}' is unknown; set embedding.dimensions",
                model
            ))
        })?;

        Ok(Self::new(provider, model, dimension))
    }

    /// Asks the provider to shorten its vectors to the configured dimension
    pub fn with_requested_dimensions(mut self) -> Self {
        self.request_dimensions = true;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;

        vectors
            .pop()
            .ok_or_else(|| DomainError::embedding("Provider returned no embedding"))
    }

    /// Embeds every text in one provider call, preserving input order
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(position) = texts.iter().position(|t| t.trim().is_empty()) {
            return Err(DomainError::embedding(format!(
                "Input {} is empty; cannot embed blank text",
                position
            )));
        }

        let mut request = EmbeddingRequest::batch(&self.model, texts.to_vec());
        if self.request_dimensions {
            request = request.with_dimensions(self.dimension);
        }

        let response = self.provider.embed(request).await.map_err(|e| match e {
            DomainError::Embedding { .. } => e,
            other => DomainError::embedding(other.to_string()),
        })?;

        let vectors = response.into_vectors();
        if vectors.len() != texts.len() {
            return Err(DomainError::embedding(format!(
                "Provider returned {} embeddings for {} inputs",
                vectors.len(),
                texts.len()
            )));
        }

        for vector in &vectors {
            if vector.len() != self.dimension {
                return Err(DomainError::dimension_mismatch(
                    format!("embedding:{}", self.model),
                    self.dimension,
                    vector.len(),
                ));
            }
        }

        debug!(
            provider = self.provider.provider_name(),
            model = %self.model,
            count = vectors.len(),
            "Generated embeddings"
        );

        Ok(vectors)
    }
}
