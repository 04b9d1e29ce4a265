//! Document ingestion domain types and traits

pub mod chunker;
mod document;

pub use chunker::{Chunk, ChunkingConfig, ChunkingStrategy, ChunkingType};
pub use document::{BatchIngestionReport, DocumentInput, IngestionOutcome};
