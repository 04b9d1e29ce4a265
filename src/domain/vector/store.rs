//! Vector store trait definition

use std::fmt::Debug;

use async_trait::async_trait;

use super::{ScoredRecord, VectorRecord};
use crate::domain::DomainError;

/// Collection definition; every collection uses cosine distance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSpec {
    pub name: String,
    pub dimension: usize,
}

impl CollectionSpec {
    pub fn new(name: impl Into<String>, dimension: usize) -> Self {
        Self {
            name: name.into(),
            dimension,
        }
    }
}

/// Nearest-neighbour query
#[derive(Debug, Clone)]
pub struct VectorQuery {
    pub vector: Vec<f32>,
    pub top_k: usize,
    /// Lower bound on the native score, applied by the store when supported
    pub min_score: Option<f32>,
}

impl VectorQuery {
    pub fn new(vector: Vec<f32>, top_k: usize) -> Self {
        Self {
            vector,
            top_k,
            min_score: None,
        }
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = Some(min_score);
        self
    }
}

/// Client of an external approximate-nearest-neighbour store
///
/// Results are ordered by descending score; ties keep the store's own order.
/// An unreachable store is reported as [`DomainError::LayerUnavailable`].
#[async_trait]
pub trait VectorStore: Send + Sync + Debug {
    /// Creates the collection if missing.
    ///
    /// Fails with [`DomainError::DimensionMismatch`] when it already exists with
    /// another dimension.
    async fn ensure_collection(&self, spec: &CollectionSpec) -> Result<(), DomainError>;

    async fn upsert(&self, collection: &str, records: Vec<VectorRecord>) -> Result<(), DomainError>;

    async fn search(
        &self,
        collection: &str,
        query: &VectorQuery,
    ) -> Result<Vec<ScoredRecord>, DomainError>;

    /// Drops the collection and everything in it
    async fn drop_collection(&self, collection: &str) -> Result<(), DomainError>;

    async fn count(&self, collection: &str) -> Result<usize, DomainError>;

    async fn health_check(&self) -> Result<(), DomainError>;

    fn store_type(&self) -> &'static str;
}
