//! Factory for chunkers

use std::sync::Arc;

use crate::domain::ingestion::{Chunk, ChunkingConfig, ChunkingStrategy, ChunkingType};
use crate::domain::DomainError;

use super::chunkers::{FixedSizeChunker, RecursiveChunker};

#[derive(Debug, Default)]
pub struct ChunkerFactory;

impl ChunkerFactory {
    pub fn create(chunking_type: ChunkingType) -> Arc<dyn ChunkingStrategy> {
        match chunking_type {
            ChunkingType::Recursive => Arc::new(RecursiveChunker::new()),
            ChunkingType::Fixed => Arc::new(FixedSizeChunker::new()),
        }
    }

    /// Splits a document per `config`; a disabled config yields the whole text
    pub fn chunk(content: &str, config: &ChunkingConfig) -> Result<Vec<Chunk>, DomainError> {
        if content.trim().is_empty() {
            return Ok(vec![]);
        }

        let texts = if config.enabled {
            Self::create(config.strategy).split(content, config)?
        } else {
            vec![content.to_string()]
        };

        Ok(Chunk::from_texts(texts))
    }
}
