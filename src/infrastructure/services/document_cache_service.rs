//! Layer 2: document chunks retrieved as grounding context

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{EmbeddingService, VectorLayer};
use crate::domain::ingestion::{
    BatchIngestionReport, Chunk, ChunkingConfig, DocumentInput, IngestionOutcome,
};
use crate::domain::tiering::{CacheLayer, LayerHealth, LayerLookup};
use crate::domain::vector::{ScoredRecord, VectorPayload, VectorRecord, VectorStore};
use crate::domain::DomainError;
use crate::infrastructure::ingestion::ChunkerFactory;

pub const DEFAULT_DOCUMENT_COLLECTION: &str = "rag_documents";

/// Metadata keys tried, in order, to name a chunk's source in the context block
const SOURCE_KEYS: [&str; 3] = ["source", "title", "parent_doc_id"];

/// Document cache service: chunking, embedding and retrieval
#[derive(Debug)]
pub struct DocumentCacheService {
    layer: VectorLayer,
    embeddings: Arc<EmbeddingService>,
    chunking: ChunkingConfig,
}

impl DocumentCacheService {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embeddings: Arc<EmbeddingService>,
        collection: impl Into<String>,
    ) -> Self {
        let dimension = embeddings.dimension();

        Self {
            layer: VectorLayer::new(store, CacheLayer::Document, collection, dimension),
            embeddings,
            chunking: ChunkingConfig::default(),
        }
    }

    pub fn with_chunking(mut self, chunking: ChunkingConfig) -> Self {
        self.chunking = chunking;
        self
    }

    pub fn collection(&self) -> &str {
        self.layer.collection()
    }

    /// Chunks, embeds and stores one document
    pub async fn add_document(&self, document: DocumentInput) -> Result<IngestionOutcome, DomainError> {
        self.ingest(0, document).await
    }

    /// Ingests documents concurrently; each succeeds or fails on its own
    pub async fn add_documents_batch(&self, documents: Vec<DocumentInput>) -> BatchIngestionReport {
        let tasks = documents
            .into_iter()
            .enumerate()
            .map(|(index, document)| async move {
                match self.ingest(index, document).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!(index, "Document ingestion failed: {}", e);
                        IngestionOutcome::failed(index, e.public_message())
                    }
                }
            });

        let mut report = BatchIngestionReport::new();
        for outcome in join_all(tasks).await {
            report.add(outcome);
        }

        info!(
            total = report.total,
            succeeded = report.succeeded,
            failed = report.failed,
            chunks = report.total_chunks(),
            "Batch ingestion finished"
        );

        report
    }

    /// Chunks at or above `threshold`, best first, at most `top_k`
    pub async fn search(
        &self,
        embedding: &[f32],
        threshold: f32,
        top_k: usize,
    ) -> Result<LayerLookup<Vec<ScoredRecord>>, DomainError> {
        match self.layer.search(embedding, threshold, top_k).await {
            Ok(hits) if hits.is_empty() => Ok(LayerLookup::Miss),
            Ok(hits) => Ok(LayerLookup::Hit(hits)),
            Err(e) if e.is_layer_unavailable() => Ok(LayerLookup::Unavailable(e.to_string())),
            Err(e) => Err(e),
        }
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

    async fn ingest(&self, index: usize, document: DocumentInput) -> Result<IngestionOutcome, DomainError> {
        if document.content.trim().is_empty() {
            return Err(DomainError::validation(format!(
                "Document {} has no content",
                index
            )));
        }

        let chunks = ChunkerFactory::chunk(&document.content, &self.chunking)?;
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = self.embeddings.embed_batch(&texts).await?;

        let document_id = document
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let records: Vec<VectorRecord> = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| {
                let metadata = chunk_metadata(&document_id, chunk, &document.metadata);
                VectorRecord::new(
                    chunk_id(&document_id, chunk),
                    vector,
                    VectorPayload::new(chunk.content.clone()).with_metadata(metadata),
                )
            })
            .collect();

        let count = records.len();
        // One upsert per document so a failure never leaves a partial document behind
        self.layer.insert(records).await?;

        debug!(document_id = %document_id, chunks = count, "Ingested document");
        Ok(IngestionOutcome::success(index, document_id, count))
    }
}

fn chunk_id(document_id: &str, chunk: &Chunk) -> String {
    if chunk.is_chunked() {
        format!("{}_chunk_{}", document_id, chunk.index)
    } else {
        document_id.to_string()
    }
}

/// Chunk bookkeeping first, then caller metadata, which wins on key collisions
fn chunk_metadata(
    document_id: &str,
    chunk: &Chunk,
    caller: &HashMap<String, serde_json::Value>,
) -> HashMap<String, serde_json::Value> {
    let mut metadata = HashMap::from([
        ("parent_doc_id".to_string(), serde_json::json!(document_id)),
        ("chunk_index".to_string(), serde_json::json!(chunk.index)),
        ("total_chunks".to_string(), serde_json::json!(chunk.total)),
        ("is_chunked".to_string(), serde_json::json!(chunk.is_chunked())),
    ]);

    metadata.extend(caller.iter().map(|(k, v)| (k.clone(), v.clone())));
    metadata
}

/// Joins retrieved chunks in rank order, each tagged with relevance and source
pub fn build_context(hits: &[ScoredRecord]) -> String {
    hits.iter()
        .enumerate()
        .map(|(i, hit)| {
            let source = SOURCE_KEYS
                .iter()
                .find_map(|key| hit.payload.metadata_str(key))
                .unwrap_or("unknown");

            format!(
                "Document {} (Relevance: {:.2}, Source: {}):\n{}",
                i + 1,
                hit.similarity(),
                source,
                hit.payload.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
