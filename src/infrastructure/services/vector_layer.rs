//! Collection handling shared by the semantic and document layers

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::domain::tiering::{CacheLayer, LayerHealth};
use crate::domain::vector::{CollectionSpec, ScoredRecord, VectorQuery, VectorRecord, VectorStore};
use crate::domain::DomainError;

/// One vector collection bound to a cache layer.
///
/// The collection is created on first use, again after [`VectorLayer::clear`],
/// and again when the store reports it missing (another handle dropped it).
/// Every insert and search is dimension-checked before it reaches the store.
#[derive(Debug)]
pub struct VectorLayer {
    store: Arc<dyn VectorStore>,
    spec: CollectionSpec,
    layer: CacheLayer,
    ensured: AtomicBool,
}

impl VectorLayer {
    pub fn new(
        store: Arc<dyn VectorStore>,
        layer: CacheLayer,
        collection: impl Into<String>,
        dimension: usize,
    ) -> Self {
        Self {
            store,
            spec: CollectionSpec::new(collection, dimension),
            layer,
            ensured: AtomicBool::new(false),
        }
    }

    pub fn collection(&self) -> &str {
        &self.spec.name
    }

    pub fn dimension(&self) -> usize {
        self.spec.dimension
    }

    pub fn layer(&self) -> CacheLayer {
        self.layer
    }

    /// Inserts records; nothing is written if any record has the wrong dimension
    pub async fn insert(&self, records: Vec<VectorRecord>) -> Result<(), DomainError> {
        if records.is_empty() {
            return Ok(());
        }

        for record in &records {
            self.check_dimension(record.dimension())?;
        }

        self.ensure().await?;

        let count = records.len();
        match self.store.upsert(&self.spec.name, records.clone()).await {
            Err(e) if is_missing_collection(&e) => {
                self.recreate().await?;
                self.store.upsert(&self.spec.name, records).await
            }
            other => other,
        }
        .map_err(|e| self.relabel(e))?;

        debug!(layer = self.layer.index(), collection = %self.spec.name, count, "Inserted vectors");
        Ok(())
    }

    /// Records whose similarity is at least `threshold`, best first, at most `top_k`
    pub async fn search(
        &self,
        vector: &[f32],
        threshold: f32,
        top_k: usize,
    ) -> Result<Vec<ScoredRecord>, DomainError> {
        self.check_dimension(vector.len())?;

        if top_k == 0 {
            return Ok(Vec::new());
        }

        self.ensure().await?;

        // A zero threshold must still admit negative cosine scores, which map to similarity 0
        let mut query = VectorQuery::new(vector.to_vec(), top_k);
        if threshold > 0.0 {
            query = query.with_min_score(threshold);
        }

        let hits = match self.store.search(&self.spec.name, &query).await {
            // Recreated empty, so nothing can match
            Err(e) if is_missing_collection(&e) => {
                self.recreate().await?;
                Vec::new()
            }
            other => other.map_err(|e| self.relabel(e))?,
        };

        Ok(rank_hits(hits, threshold, top_k))
    }

    /// Drops the collection; it is recreated lazily on next use
    pub async fn clear(&self) -> Result<(), DomainError> {
        self.store
            .drop_collection(&self.spec.name)
            .await
            .map_err(|e| self.relabel(e))?;
        self.ensured.store(false, Ordering::SeqCst);

        debug!(layer = self.layer.index(), collection = %self.spec.name, "Dropped collection");
        Ok(())
    }

    pub async fn count(&self) -> Result<usize, DomainError> {
        self.store
            .count(&self.spec.name)
            .await
            .map_err(|e| self.relabel(e))
    }

    pub async fn health(&self) -> LayerHealth {
        let start = Instant::now();
        let result = self.store.health_check().await.map_err(|e| self.relabel(e));

        LayerHealth {
            layer: self.layer,
            name: self.layer.label(),
            backend: self.store.store_type(),
            reachable: result.is_ok(),
            message: result.err().map(|e| e.public_message()),
            latency_ms: start.elapsed().as_millis() as u64,
        }
    }

    async fn ensure(&self) -> Result<(), DomainError> {
        if self.ensured.load(Ordering::SeqCst) {
            return Ok(());
        }

        self.store
            .ensure_collection(&self.spec)
            .await
            .map_err(|e| self.relabel(e))?;
        self.ensured.store(true, Ordering::SeqCst);

        Ok(())
    }

    async fn recreate(&self) -> Result<(), DomainError> {
        self.ensured.store(false, Ordering::SeqCst);
        debug!(layer = self.layer.index(), collection = %self.spec.name, "Collection missing; recreating");
        self.ensure().await
    }

    fn check_dimension(&self, actual: usize) -> Result<(), DomainError> {
        if actual != self.spec.dimension {
            return Err(DomainError::dimension_mismatch(
                &self.spec.name,
                self.spec.dimension,
                actual,
            ));
        }
        Ok(())
    }

    /// Attributes store outages to this layer
    fn relabel(&self, error: DomainError) -> DomainError {
        match error {
            DomainError::LayerUnavailable { message, .. } => {
                DomainError::layer_unavailable(self.layer.to_string(), message)
            }
            other => other,
        }
    }
}

fn is_missing_collection(error: &DomainError) -> bool {
    matches!(error, DomainError::NotFound { .. })
}

/// Keeps hits at or above the threshold, ordered by similarity; ties keep store order
fn rank_hits(hits: Vec<ScoredRecord>, threshold: f32, top_k: usize) -> Vec<ScoredRecord> {
    let mut ranked: Vec<ScoredRecord> = hits
        .into_iter()
        .filter(|hit| hit.similarity() >= threshold)
        .collect();

    ranked.sort_by(|a, b| b.similarity().total_cmp(&a.similarity()));
    ranked.truncate(top_k);
    ranked
}
