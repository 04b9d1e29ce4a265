//! Embedding request types

use serde::{Deserialize, Serialize};

/// Request for one or more embeddings from a single model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    model: String,
    inputs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

impl EmbeddingRequest {
    pub fn single(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self::batch(model, vec![text.into()])
    }

    pub fn batch(model: impl Into<String>, texts: Vec<String>) -> Self {
        Self {
            model: model.into(),
            inputs: texts,
            dimensions: None,
        }
    }

    /// Requests a truncated output dimension from models that support it
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_request() {
        let request = EmbeddingRequest::single("all-MiniLM-L6-v2", "hello");

        assert_eq!(request.model(), "all-MiniLM-L6-v2");
        assert_eq!(request.inputs(), &["hello".to_string()]);
        assert_eq!(request.dimensions(), None);
    }

    #[test]
    fn test_batch_with_dimensions() {
        let request = EmbeddingRequest::batch("m", vec!["a".into(), "b".into()]).with_dimensions(256);

        assert_eq!(request.inputs().len(), 2);
        assert_eq!(request.dimensions(), Some(256));
    }
}
