//! Chunking strategy trait and types

use std::fmt::Debug;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Splitting strategy for Layer-2 documents
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChunkingType {
    /// Separator hierarchy: paragraphs, lines, sentences, words, characters
    #[default]
    Recursive,
    /// Line-joined windows of roughly `chunk_size` characters
    Fixed,
}

impl FromStr for ChunkingType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "recursive" => Ok(Self::Recursive),
            "fixed" | "fixed_size" => Ok(Self::Fixed),
            other => Err(DomainError::validation(format!(
                "Unknown chunking strategy: {}. Valid strategies: recursive, fixed",
                other
            ))),
        }
    }
}

/// Configuration for chunking, sizes in characters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkingConfig {
    /// When disabled every document is stored as a single chunk
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default)]
    pub strategy: ChunkingType,
}

fn default_enabled() -> bool {
    true
}

fn default_chunk_size() -> usize {
    512
}

fn default_chunk_overlap() -> usize {
    50
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            strategy: ChunkingType::default(),
        }
    }
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            ..Default::default()
        }
    }

    pub fn with_strategy(mut self, strategy: ChunkingType) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.chunk_size == 0 {
            return Err(DomainError::validation("chunk_size must be greater than 0"));
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(DomainError::validation(
                "chunk_overlap must be less than chunk_size",
            ));
        }

        Ok(())
    }
}

/// A chunk of a source document
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub content: String,
    pub index: usize,
    pub total: usize,
}

impl Chunk {
    /// Numbers a list of chunk texts
    pub fn from_texts(texts: Vec<String>) -> Vec<Chunk> {
        let total = texts.len();
        texts
            .into_iter()
            .enumerate()
            .map(|(index, content)| Chunk {
                content,
                index,
                total,
            })
            .collect()
    }

    pub fn is_chunked(&self) -> bool {
        self.total > 1
    }
}

/// Trait for chunking strategies
pub trait ChunkingStrategy: Send + Sync + Debug {
    /// Split content into chunk texts; blank content yields no chunks
    fn split(&self, content: &str, config: &ChunkingConfig) -> Result<Vec<String>, DomainError>;

    fn name(&self) -> &'static str;
}

/// Helpers shared by the chunkers
pub mod helpers {
    /// Number of characters (not bytes)
    pub fn char_len(text: &str) -> usize {
        text.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_len_counts_chars() {
        assert_eq!(helpers::char_len("héllo"), 5);
    }

    #[test]
    fn test_validate() {
        assert!(ChunkingConfig::default().validate().is_ok());
        assert!(ChunkingConfig::new(0, 0).validate().is_err());
        assert!(ChunkingConfig::new(100, 100).validate().is_err());
    }

    #[test]
    fn test_chunking_type_from_str() {
        assert_eq!("Recursive".parse::<ChunkingType>().unwrap(), ChunkingType::Recursive);
        assert_eq!("fixed".parse::<ChunkingType>().unwrap(), ChunkingType::Fixed);
        assert!("semantic".parse::<ChunkingType>().is_err());
    }

    #[test]
    fn test_from_texts_numbers_chunks() {
        let chunks = Chunk::from_texts(vec!["a".into(), "b".into()]);

        assert_eq!(chunks[1].index, 1);
        assert_eq!(chunks[1].total, 2);
        assert!(chunks[0].is_chunked());
        assert!(!Chunk::from_texts(vec!["solo".into()])[0].is_chunked());
    }
}
