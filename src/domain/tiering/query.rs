use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize, Serializer};

/// A caller query; never persisted, only its derived forms are stored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    /// Provider to use instead of the registry default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Where a query was answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ResolvedLayer {
    #[serde(rename = "0")]
    Exact,
    #[serde(rename = "1")]
    Semantic,
    #[serde(rename = "2")]
    Document,
    #[serde(rename = "llm")]
    Llm,
}

impl ResolvedLayer {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolvedLayer::Exact => "0",
            ResolvedLayer::Semantic => "1",
            ResolvedLayer::Document => "2",
            ResolvedLayer::Llm => "llm",
        }
    }
}

impl fmt::Display for ResolvedLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ResolvedLayer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Answer returned to the caller
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub query: String,
    pub response: String,
    pub resolved_layer: ResolvedLayer,
    pub cache_hit: bool,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    pub llm_invoked: bool,
    /// Provider that generated the answer, when the LLM was invoked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Number of context chunks, for Layer-2 resolutions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_count: Option<usize>,
    /// Similarity of the matched entry, for Layer-1 resolutions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f32>,
}

fn serialize_millis<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(elapsed.as_micros() as f64 / 1000.0)
}

impl QueryResult {
    pub fn new(query: impl Into<String>, response: impl Into<String>, resolved_layer: ResolvedLayer) -> Self {
        let llm_invoked = matches!(resolved_layer, ResolvedLayer::Document | ResolvedLayer::Llm);

        Self {
            query: query.into(),
            response: response.into(),
            resolved_layer,
            cache_hit: resolved_layer != ResolvedLayer::Llm,
            elapsed: Duration::ZERO,
            llm_invoked,
            provider: None,
            document_count: None,
            similarity: None,
        }
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_document_count(mut self, count: usize) -> Self {
        self.document_count = Some(count);
        self
    }

    pub fn with_similarity(mut self, similarity: f32) -> Self {
        self.similarity = Some(similarity);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_follow_layer() {
        let exact = QueryResult::new("q", "a", ResolvedLayer::Exact);
        assert!(exact.cache_hit);
        assert!(!exact.llm_invoked);

        let document = QueryResult::new("q", "a", ResolvedLayer::Document);
        assert!(document.cache_hit);
        assert!(document.llm_invoked);

        let llm = QueryResult::new("q", "a", ResolvedLayer::Llm);
        assert!(!llm.cache_hit);
        assert!(llm.llm_invoked);
    }

    #[test]
    fn test_serialization() {
        let result = QueryResult::new("q", "a", ResolvedLayer::Llm)
            .with_provider("openai")
            .with_elapsed(Duration::from_millis(12));
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["resolved_layer"], "llm");
        assert_eq!(json["provider"], "openai");
        assert_eq!(json["elapsed_ms"], 12.0);
        assert!(json.get("similarity").is_none());
    }

    #[test]
    fn test_resolved_layer_deserializes() {
        let layer: ResolvedLayer = serde_json::from_str("\"1\"").unwrap();
        assert_eq!(layer, ResolvedLayer::Semantic);
    }
}
