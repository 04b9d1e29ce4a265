//! Fixed-size chunking strategy

use super::merge::merge_splits;
use crate::domain::ingestion::chunker::helpers::char_len;
use crate::domain::ingestion::{ChunkingConfig, ChunkingStrategy};
use crate::domain::DomainError;

/// Joins whole lines into windows of up to `chunk_size` characters
///
/// Lines are never broken, so a single line longer than `chunk_size` becomes
/// its own chunk.
#[derive(Debug, Clone, Default)]
pub struct FixedSizeChunker;

impl FixedSizeChunker {
    pub fn new() -> Self {
        Self
    }
}

impl ChunkingStrategy for FixedSizeChunker {
    fn split(&self, content: &str, config: &ChunkingConfig) -> Result<Vec<String>, DomainError> {
        config.validate()?;

        let content = content.trim();
        if content.is_empty() {
            return Ok(vec![]);
        }

        if char_len(content) <= config.chunk_size {
            return Ok(vec![content.to_string()]);
        }

        let lines: Vec<&str> = content.split('\n').filter(|l| !l.trim().is_empty()).collect();
        Ok(merge_splits(&lines, "\n", config))
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_content() {
        let chunks = FixedSizeChunker::new().split("", &ChunkingConfig::default()).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_lines_are_grouped() {
        let text = "line one\nline two\nline three\nline four";
        let config = ChunkingConfig::new(20, 0);

        let chunks = FixedSizeChunker::new().split(text, &config).unwrap();

        assert_eq!(chunks, vec!["line one\nline two", "line three\nline four"]);
    }

    #[test]
    fn test_overlap_repeats_last_line() {
        let text = "line one\nline two\nline three\nline four";
        let config = ChunkingConfig::new(20, 10);

        let chunks = FixedSizeChunker::new().split(text, &config).unwrap();

        assert_eq!(chunks[0], "line one\nline two");
        assert!(chunks[1].starts_with("line two"));
    }

    #[test]
    fn test_long_line_kept_whole() {
        let text = "short\nthis line is much longer than the limit\nend";
        let config = ChunkingConfig::new(10, 0);

        let chunks = FixedSizeChunker::new().split(text, &config).unwrap();

        assert_eq!(chunks[1], "this line is much longer than the limit");
    }

    #[test]
    fn test_name() {
        assert_eq!(FixedSizeChunker::new().name(), "fixed");
    }
}
