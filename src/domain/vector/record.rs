use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Data stored alongside an embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorPayload {
    /// Cached answer (Layer 1) or document chunk text (Layer 2)
    pub content: String,
    /// Query that produced the answer, for Layer-1 records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl VectorPayload {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            query: None,
            metadata: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }
}

/// A point in a vector collection
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    pub id: String,
    pub embedding: Vec<f32>,
    pub payload: VectorPayload,
}

impl VectorRecord {
    pub fn new(id: impl Into<String>, embedding: Vec<f32>, payload: VectorPayload) -> Self {
        Self {
            id: id.into(),
            embedding,
            payload,
        }
    }

    /// New record with a random v4 id
    pub fn with_random_id(embedding: Vec<f32>, payload: VectorPayload) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), embedding, payload)
    }

    pub fn dimension(&self) -> usize {
        self.embedding.len()
    }
}

/// Search hit with the store's native cosine score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub id: String,
    pub payload: VectorPayload,
    pub score: f32,
}

impl ScoredRecord {
    pub fn new(id: impl Into<String>, payload: VectorPayload, score: f32) -> Self {
        Self {
            id: id.into(),
            payload,
            score,
        }
    }

    /// Score mapped onto `[0, 1]`
    pub fn similarity(&self) -> f32 {
        similarity_from_cosine(self.score)
    }
}

/// Maps a cosine score in `[-1, 1]` to a similarity in `[0, 1]`.
///
/// Opposed vectors are as dissimilar as orthogonal ones for caching purposes,
/// so negative scores collapse to zero. The mapping is monotonic.
pub fn similarity_from_cosine(score: f32) -> f32 {
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, 1.0)
}
