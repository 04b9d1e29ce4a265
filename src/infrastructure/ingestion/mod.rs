//! Document chunking infrastructure

pub mod chunkers;
pub mod factory;

pub use chunkers::{FixedSizeChunker, RecursiveChunker};
pub use factory::ChunkerFactory;
