//! Layer 1: previously generated answers keyed by query embedding

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::VectorLayer;
use crate::domain::tiering::{CacheLayer, LayerHealth, LayerLookup};
use crate::domain::vector::{VectorPayload, VectorRecord, VectorStore};
use crate::domain::DomainError;

pub const DEFAULT_SEMANTIC_COLLECTION: &str = "semantic_cache";

/// Best Layer-1 match for a query embedding
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SemanticHit {
    pub id: String,
    pub response: String,
    /// Query text the answer was originally generated for
    pub source_query: Option<String>,
    pub similarity: f32,
}

/// Semantic cache service
///
/// Writes accumulate: every `put` adds a new record even when a near-identical
/// query is already stored.
#[derive(Debug)]
pub struct SemanticCacheService {
    layer: VectorLayer,
}

impl SemanticCacheService {
    pub fn new(store: Arc<dyn VectorStore>, collection: impl Into<String>, dimension: usize) -> Self {
        Self {
            layer: VectorLayer::new(store, CacheLayer::Semantic, collection, dimension),
        }
    }

    pub fn collection(&self) -> &str {
        self.layer.collection()
    }

    pub fn dimension(&self) -> usize {
        self.layer.dimension()
    }

    /// Stores an answer under the query embedding, returning the new record id
    pub async fn put(
        &self,
        query: &str,
        embedding: Vec<f32>,
        response: &str,
        metadata: HashMap<String, serde_json::Value>,
    ) -> Result<String, DomainError> {
        let payload = VectorPayload::new(response)
            .with_query(query)
            .with_metadata(metadata);
        let record = VectorRecord::with_random_id(embedding, payload);
        let id = record.id.clone();

        self.layer.insert(vec![record]).await?;

        debug!(id = %id, "Stored semantic cache entry");
        Ok(id)
    }

    /// Best match at or above `threshold`.
    ///
    /// Store outages become [`LayerLookup::Unavailable`]; dimension mismatches
    /// are returned as errors.
    pub async fn search(
        &self,
        embedding: &[f32],
        threshold: f32,
    ) -> Result<LayerLookup<SemanticHit>, DomainError> {
        let hits = match self.layer.search(embedding, threshold, 1).await {
            Ok(hits) => hits,
            Err(e) if e.is_layer_unavailable() => return Ok(LayerLookup::Unavailable(e.to_string())),
            Err(e) => return Err(e),
        };

        Ok(match hits.into_iter().next() {
            Some(best) => {
                let similarity = best.similarity();
                LayerLookup::Hit(SemanticHit {
                    id: best.id,
                    response: best.payload.content,
                    source_query: best.payload.query,
                    similarity,
                })
            }
            None => LayerLookup::Miss,
        })
    }

    pub async fn clear(&self) -> Result<(), DomainError> {
        self.layer.clear().await
    }

    pub async fn count(&self) -> Result<usize, DomainError> {
        self.layer.count().await
    }

    pub async fn health(&self) -> LayerHealth {
        self.layer.health().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::cosine_similarity;
    use crate::domain::vector::UnavailableVectorStore;
    use crate::infrastructure::vector::InMemoryVectorStore;

    fn service() -> SemanticCacheService {
        SemanticCacheService::new(Arc::new(InMemoryVectorStore::new()), DEFAULT_SEMANTIC_COLLECTION, 2)
    }

    #[tokio::test]
    async fn test_put_then_search_hit() {
        let service = service();
        service
            .put("What is Python?", vec![1.0, 0.0], "A language", HashMap::new())
            .await
            .unwrap();

        match service.search(&[0.9, 0.43589], 0.85).await.unwrap() {
            LayerLookup::Hit(hit) => {
                assert_eq!(hit.response, "A language");
                assert_eq!(hit.source_query.as_deref(), Some("What is Python?"));
                assert!((hit.similarity - 0.9).abs() < 1e-3);
            }
            other => panic!("expected hit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_below_threshold_is_miss() {
        let service = service();
        service
            .put("q", vec![1.0, 0.0], "a", HashMap::new())
            .await
            .unwrap();

        let lookup = service.search(&[0.8, 0.6], 0.85).await.unwrap();
        assert_eq!(lookup, LayerLookup::Miss);
    }

    #[tokio::test]
    async fn test_threshold_is_inclusive() {
        let service = service();
        service
            .put("q", vec![1.0, 0.0], "a", HashMap::new())
            .await
            .unwrap();

        let exact = cosine_similarity(&[0.8, 0.6], &[1.0, 0.0]);
        let just_above = f32::from_bits(exact.to_bits() + 1);

        assert!(service.search(&[0.8, 0.6], exact).await.unwrap().is_hit());
        assert!(!service.search(&[0.8, 0.6], just_above).await.unwrap().is_hit());
    }

    #[tokio::test]
    async fn test_puts_accumulate() {
        let service = service();

        let first = service.put("q", vec![1.0, 0.0], "a", HashMap::new()).await.unwrap();
        let second = service.put("q", vec![1.0, 0.0], "a", HashMap::new()).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(service.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_empty_collection_is_miss() {
        assert_eq!(service().search(&[1.0, 0.0], 0.5).await.unwrap(), LayerLookup::Miss);
    }

    #[tokio::test]
    async fn test_unavailable_store() {
        let service = SemanticCacheService::new(Arc::new(UnavailableVectorStore::new()), "semantic", 2);

        let lookup = service.search(&[1.0, 0.0], 0.85).await.unwrap();
        assert!(matches!(lookup, LayerLookup::Unavailable(_)));

        let error = service.put("q", vec![1.0, 0.0], "a", HashMap::new()).await.unwrap_err();
        assert!(error.is_layer_unavailable());
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_error() {
        let error = service().search(&[1.0, 0.0, 0.0], 0.5).await.unwrap_err();
        assert!(matches!(error, DomainError::DimensionMismatch { .. }));
    }
}
