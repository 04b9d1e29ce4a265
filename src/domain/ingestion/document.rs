//! Document input and per-item ingestion outcomes

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A document submitted to the document cache
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentInput {
    pub content: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Caller-chosen id; a random one is assigned when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl DocumentInput {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Outcome of ingesting one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionOutcome {
    /// Position of the document in the submitted batch
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    pub chunks: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IngestionOutcome {
    pub fn success(index: usize, document_id: impl Into<String>, chunks: usize) -> Self {
        Self {
            index,
            document_id: Some(document_id.into()),
            chunks,
            error: None,
        }
    }

    pub fn failed(index: usize, error: impl Into<String>) -> Self {
        Self {
            index,
            document_id: None,
            chunks: 0,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-document report for a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchIngestionReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<IngestionOutcome>,
}

impl BatchIngestionReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, outcome: IngestionOutcome) {
        self.total += 1;

        if outcome.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }

        self.outcomes.push(outcome);
    }

    pub fn failures(&self) -> impl Iterator<Item = &IngestionOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn total_chunks(&self) -> usize {
        self.outcomes.iter().map(|o| o.chunks).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let mut report = BatchIngestionReport::new();
        report.add(IngestionOutcome::success(0, "doc-a", 3));
        report.add(IngestionOutcome::failed(1, "document content is empty"));
        report.add(IngestionOutcome::success(2, "doc-c", 1));

        assert_eq!(report.total, 3);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.total_chunks(), 4);
        assert_eq!(report.failures().map(|o| o.index).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_document_input_deserializes_without_metadata() {
        let doc: DocumentInput = serde_json::from_str(r#"{"content": "hello"}"#).unwrap();

        assert_eq!(doc.content, "hello");
        assert!(doc.metadata.is_empty());
        assert!(doc.id.is_none());
    }
}
