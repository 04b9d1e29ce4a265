//! Ingest command - adds files to the document cache

use std::path::{Path, PathBuf};

use clap::Args;
use tracing::{info, warn};

use super::print_json;
use crate::domain::ingestion::DocumentInput;
use crate::CacheOrchestrator;

#[derive(Args, Clone)]
pub struct IngestArgs {
    /// Text files to ingest, one document each
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Store every file as a single chunk
    #[arg(long)]
    pub no_chunking: bool,
}

pub async fn run(orchestrator: &CacheOrchestrator, args: IngestArgs) -> anyhow::Result<()> {
    let mut documents = Vec::with_capacity(args.files.len());
    for path in &args.files {
        documents.push(read_document(path).await?);
    }

    let report = orchestrator.add_documents_batch(documents).await;

    for failure in report.failures() {
        let file = args.files.get(failure.index).map(|p| p.display().to_string());
        warn!(
            file = file.as_deref().unwrap_or("?"),
            "Document not ingested: {}",
            failure.error.as_deref().unwrap_or("unknown error")
        );
    }
    info!(
        succeeded = report.succeeded,
        failed = report.failed,
        chunks = report.total_chunks(),
        "Ingestion finished"
    );

    print_json(&report)?;

    if report.failed > 0 {
        anyhow::bail!("{} of {} documents failed", report.failed, report.total);
    }
    Ok(())
}

async fn read_document(path: &Path) -> anyhow::Result<DocumentInput> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;

    let source = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(DocumentInput::new(content).with_metadata("source", serde_json::json!(source)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_document_sets_source() {
        let path = std::env::temp_dir().join(format!("pmp-llm-cache-{}.txt", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, "Rust has ownership.").await.unwrap();

        let document = read_document(&path).await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();

        assert_eq!(document.content, "Rust has ownership.");
        let expected = path.file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(document.metadata["source"], serde_json::json!(expected));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let error = read_document(Path::new("/nonexistent/doc.txt")).await.unwrap_err();
        assert!(error.to_string().contains("/nonexistent/doc.txt"));
    }
}
