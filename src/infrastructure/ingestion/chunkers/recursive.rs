//! Recursive chunking strategy

use super::merge::merge_splits;
use crate::domain::ingestion::chunker::helpers::char_len;
use crate::domain::ingestion::{ChunkingConfig, ChunkingStrategy};
use crate::domain::DomainError;

/// Paragraphs, lines, sentences, words, then single characters
const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", " ", ""];

/// Chunking strategy that recursively splits text hierarchically
///
/// Uses the coarsest separator present in the text and only descends to a
/// finer one for pieces that still exceed `chunk_size`.
#[derive(Debug, Clone, Default)]
pub struct RecursiveChunker;

impl RecursiveChunker {
    pub fn new() -> Self {
        Self
    }

    fn split_recursive(text: &str, separators: &[&str], config: &ChunkingConfig) -> Vec<String> {
        let position = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep));
        let (separator, finer) = match position {
            Some(i) => (separators[i], &separators[i + 1..]),
            None => ("", &[][..]),
        };

        let mut chunks = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();

        for piece in text.split(separator).filter(|p| !p.is_empty()) {
            if char_len(piece) < config.chunk_size {
                fitting.push(piece);
                continue;
            }

            if !fitting.is_empty() {
                chunks.extend(merge_splits(&fitting, separator, config));
                fitting.clear();
            }

            if finer.is_empty() {
                chunks.push(piece.to_string());
            } else {
                chunks.extend(Self::split_recursive(piece, finer, config));
            }
        }

        if !fitting.is_empty() {
            chunks.extend(merge_splits(&fitting, separator, config));
        }

        chunks
    }
}

impl ChunkingStrategy for RecursiveChunker {
    fn split(&self, content: &str, config: &ChunkingConfig) -> Result<Vec<String>, DomainError> {
        config.validate()?;

        let content = content.trim();
        if content.is_empty() {
            return Ok(vec![]);
        }

        if char_len(content) <= config.chunk_size {
            return Ok(vec![content.to_string()]);
        }

        Ok(Self::split_recursive(content, SEPARATORS, config))
    }

    fn name(&self) -> &'static str {
        "recursive"
    }
}
