//! In-memory vector store using linear search

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::embedding::cosine_similarity;
use crate::domain::vector::{CollectionSpec, ScoredRecord, VectorQuery, VectorRecord, VectorStore};
use crate::domain::DomainError;

#[derive(Debug)]
struct Collection {
    dimension: usize,
    /// Insertion order is the tie-break order for equal scores
    records: Vec<VectorRecord>,
}

/// Process-local store; suitable for tests and small deployments
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn missing(collection: &str) -> DomainError {
        DomainError::not_found(format!("Collection '{}' does not exist", collection))
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn ensure_collection(&self, spec: &CollectionSpec) -> Result<(), DomainError> {
        let mut collections = self.collections.write().map_err(|e| {
            DomainError::internal(format!("Failed to acquire write lock: {}", e))
        })?;

        match collections.get(&spec.name) {
            Some(existing) if existing.dimension != spec.dimension => Err(
                DomainError::dimension_mismatch(&spec.name, existing.dimension, spec.dimension),
            ),
            Some(_) => Ok(()),
            None => {
                collections.insert(
                    spec.name.clone(),
                    Collection {
                        dimension: spec.dimension,
                        records: Vec::new(),
                    },
                );
                Ok(())
            }
        }
    }

    async fn upsert(&self, collection: &str, records: Vec<VectorRecord>) -> Result<(), DomainError> {
        let mut collections = self.collections.write().map_err(|e| {
            DomainError::internal(format!("Failed to acquire write lock: {}", e))
        })?;
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| Self::missing(collection))?;

        if let Some(bad) = records.iter().find(|r| r.dimension() != target.dimension) {
            return Err(DomainError::dimension_mismatch(
                collection,
                target.dimension,
                bad.dimension(),
            ));
        }

        for record in records {
            match target.records.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record,
                None => target.records.push(record),
            }
        }

        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        query: &VectorQuery,
    ) -> Result<Vec<ScoredRecord>, DomainError> {
        let collections = self.collections.read().map_err(|e| {
            DomainError::internal(format!("Failed to acquire read lock: {}", e))
        })?;
        let target = collections
            .get(collection)
            .ok_or_else(|| Self::missing(collection))?;

        if query.vector.len() != target.dimension {
            return Err(DomainError::dimension_mismatch(
                collection,
                target.dimension,
                query.vector.len(),
            ));
        }

        let mut results: Vec<ScoredRecord> = target
            .records
            .iter()
            .map(|record| {
                let score = cosine_similarity(&query.vector, &record.embedding);
                ScoredRecord::new(record.id.clone(), record.payload.clone(), score)
            })
            .filter(|hit| query.min_score.is_none_or(|min| hit.score >= min))
            .collect();

        // Stable sort keeps insertion order among equal scores
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(query.top_k);

        Ok(results)
    }

    async fn drop_collection(&self, collection: &str) -> Result<(), DomainError> {
        let mut collections = self.collections.write().map_err(|e| {
            DomainError::internal(format!("Failed to acquire write lock: {}", e))
        })?;
        collections.remove(collection);

        Ok(())
    }

    async fn count(&self, collection: &str) -> Result<usize, DomainError> {
        let collections = self.collections.read().map_err(|e| {
            DomainError::internal(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(collections
            .get(collection)
            .map(|c| c.records.len())
            .unwrap_or(0))
    }

    async fn health_check(&self) -> Result<(), DomainError> {
        Ok(())
    }

    fn store_type(&self) -> &'static str {
        "in_memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::vector::VectorPayload;

    fn record(id: &str, embedding: Vec<f32>) -> VectorRecord {
        VectorRecord::new(id, embedding, VectorPayload::new(format!("content {}", id)))
    }

    async fn store_with(records: Vec<VectorRecord>) -> InMemoryVectorStore {
        let store = InMemoryVectorStore::new();
        store.ensure_collection(&CollectionSpec::new("c", 2)).await.unwrap();
        store.upsert("c", records).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_search_orders_by_score() {
        let store = store_with(vec![
            record("far", vec![0.0, 1.0]),
            record("near", vec![1.0, 0.1]),
            record("exact", vec![1.0, 0.0]),
        ])
        .await;

        let hits = store
            .search("c", &VectorQuery::new(vec![1.0, 0.0], 2))
            .await
            .unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "exact");
        assert_eq!(hits[1].id, "near");
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let store = store_with(vec![
            record("first", vec![1.0, 0.0]),
            record("second", vec![2.0, 0.0]),
        ])
        .await;

        let hits = store
            .search("c", &VectorQuery::new(vec![1.0, 0.0], 1))
            .await
            .unwrap();

        assert_eq!(hits[0].id, "first");
    }

    #[tokio::test]
    async fn test_min_score_filter() {
        let store = store_with(vec![record("a", vec![1.0, 0.0]), record("b", vec![0.0, 1.0])]).await;

        let hits = store
            .search("c", &VectorQuery::new(vec![1.0, 0.0], 10).with_min_score(0.5))
            .await
            .unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "a");
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected_before_insert() {
        let store = store_with(vec![]).await;

        let error = store
            .upsert("c", vec![record("ok", vec![1.0, 0.0]), record("bad", vec![1.0, 0.0, 0.0])])
            .await
            .unwrap_err();

        assert!(matches!(error, DomainError::DimensionMismatch { expected: 2, actual: 3, .. }));
        assert_eq!(store.count("c").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ensure_collection_with_other_dimension_fails() {
        let store = store_with(vec![]).await;

        let error = store
            .ensure_collection(&CollectionSpec::new("c", 3))
            .await
            .unwrap_err();
        assert!(matches!(error, DomainError::DimensionMismatch { .. }));
    }

    #[tokio::test]
    async fn test_upsert_same_id_overwrites() {
        let store = store_with(vec![record("a", vec![1.0, 0.0])]).await;
        store.upsert("c", vec![record("a", vec![0.0, 1.0])]).await.unwrap();

        assert_eq!(store.count("c").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_drop_collection() {
        let store = store_with(vec![record("a", vec![1.0, 0.0])]).await;
        store.drop_collection("c").await.unwrap();

        assert_eq!(store.count("c").await.unwrap(), 0);
        assert!(store.search("c", &VectorQuery::new(vec![1.0, 0.0], 1)).await.is_err());
    }
}
