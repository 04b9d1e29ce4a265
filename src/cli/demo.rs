//! Demo command - exercises every layer inside one process

use serde::Serialize;
use tracing::info;

use super::print_json;
use crate::domain::ingestion::DocumentInput;
use crate::domain::tiering::{CacheLayer, Query, QueryResult};
use crate::CacheOrchestrator;

const SAMPLE_DOCUMENTS: &[(&str, &str)] = &[
    (
        "rust-history",
        "Rust began as a personal project at Mozilla Research. Rust 1.0 was released in May 2015. \
         The Rust compiler is written in Rust.",
    ),
    (
        "python-facts",
        "Python was created by Guido van Rossum in 1991. Python uses indentation to define code \
         blocks. Python lists are mutable and tuples are immutable.",
    ),
    (
        "caching",
        "An exact cache matches identical requests. A semantic cache matches requests with the \
         same meaning using embedding similarity.",
    ),
];

/// Each entry is run in order; repeats and rephrasings land on cheaper layers
const SCRIPT: &[&str] = &[
    "What is Python?",
    "  what is   PYTHON? ",
    "What is Python",
    "When was Rust 1.0 released?",
    "Explain how a semantic cache matches requests",
];

#[derive(Debug, Serialize)]
pub struct DemoStep {
    pub step: usize,
    #[serde(flatten)]
    pub result: QueryResult,
}

pub async fn run(orchestrator: &CacheOrchestrator) -> anyhow::Result<()> {
    let steps = walkthrough(orchestrator).await?;
    for step in &steps {
        print_json(step)?;
    }
    Ok(())
}

/// Ingests the sample documents and runs the query script
pub async fn walkthrough(orchestrator: &CacheOrchestrator) -> anyhow::Result<Vec<DemoStep>> {
    let documents = SAMPLE_DOCUMENTS
        .iter()
        .map(|(source, content)| {
            DocumentInput::new(*content).with_metadata("source", serde_json::json!(source))
        })
        .collect();

    let report = orchestrator.add_documents_batch(documents).await;
    info!(documents = report.succeeded, chunks = report.total_chunks(), "Sample documents ingested");

    let mut steps = Vec::with_capacity(SCRIPT.len() + 1);
    for text in SCRIPT {
        let result = orchestrator.query(Query::new(*text)).await?;
        steps.push(DemoStep {
            step: steps.len() + 1,
            result,
        });
    }

    // Dropping Layer 0 leaves the semantic copy in place
    let report = orchestrator.clear(Some(CacheLayer::Exact)).await;
    if !report.is_complete() {
        anyhow::bail!("Error clearing the exact cache");
    }
    let result = orchestrator.query(Query::new(SCRIPT[0])).await?;
    steps.push(DemoStep {
        step: steps.len() + 1,
        result,
    });

    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tiering::ResolvedLayer;
    use crate::{create_orchestrator_with_config, AppConfig, BackendMode};

    #[tokio::test]
    async fn test_walkthrough_reaches_cheaper_layers() {
        let orchestrator = create_orchestrator_with_config(&AppConfig::default(), BackendMode::InMemory)
            .await
            .unwrap();

        let steps = walkthrough(&orchestrator).await.unwrap();
        assert_eq!(steps.len(), SCRIPT.len() + 1);

        assert!(steps[0].result.llm_invoked);
        assert_eq!(steps[1].result.resolved_layer, ResolvedLayer::Exact);
        assert_eq!(steps[1].result.response, steps[0].result.response);
        assert_eq!(steps[2].result.resolved_layer, ResolvedLayer::Semantic);
        assert_eq!(steps[5].result.resolved_layer, ResolvedLayer::Semantic);
        assert_eq!(steps[5].step, 6);
    }
}
