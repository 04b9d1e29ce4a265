//! Window merging shared by the separator-based chunkers

use std::collections::VecDeque;

use crate::domain::ingestion::chunker::helpers::char_len;
use crate::domain::ingestion::ChunkingConfig;

/// Greedily joins pieces with `separator` into windows of at most `chunk_size`
/// characters. After a window is emitted, trailing pieces totalling no more
/// than `chunk_overlap` characters carry over into the next one.
///
/// A single piece longer than `chunk_size` becomes its own window.
pub(super) fn merge_splits(pieces: &[&str], separator: &str, config: &ChunkingConfig) -> Vec<String> {
    let separator_len = char_len(separator);
    let mut windows = Vec::new();
    let mut current: VecDeque<(&str, usize)> = VecDeque::new();
    let mut total = 0usize;

    for piece in pieces {
        let len = char_len(piece);
        let joined = |current: &VecDeque<(&str, usize)>, total: usize| {
            total + len + if current.is_empty() { 0 } else { separator_len }
        };

        if joined(&current, total) > config.chunk_size && !current.is_empty() {
            push_window(&mut windows, &current, separator);

            while total > config.chunk_overlap
                || (total > 0 && joined(&current, total) > config.chunk_size)
            {
                let Some((_, removed)) = current.pop_front() else {
                    break;
                };
                total -= removed + if current.is_empty() { 0 } else { separator_len };
            }
        }

        total += len + if current.is_empty() { 0 } else { separator_len };
        current.push_back((piece, len));
    }

    push_window(&mut windows, &current, separator);
    windows
}

fn push_window(windows: &mut Vec<String>, current: &VecDeque<(&str, usize)>, separator: &str) {
    let text = current
        .iter()
        .map(|(piece, _)| *piece)
        .collect::<Vec<_>>()
        .join(separator);
    let text = text.trim();

    if !text.is_empty() {
        windows.push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merges_up_to_chunk_size() {
        let config = ChunkingConfig::new(11, 0);
        let windows = merge_splits(&["aaa", "bbb", "ccc", "ddd"], " ", &config);

        assert_eq!(windows, vec!["aaa bbb ccc", "ddd"]);
    }

    #[test]
    fn test_carries_overlap_into_next_window() {
        let config = ChunkingConfig::new(11, 4);
        let windows = merge_splits(&["aaa", "bbb", "ccc", "ddd"], " ", &config);

        assert_eq!(windows, vec!["aaa bbb ccc", "ccc ddd"]);
    }

    #[test]
    fn test_oversized_piece_stands_alone() {
        let config = ChunkingConfig::new(5, 0);
        let windows = merge_splits(&["ab", "abcdefgh", "cd"], " ", &config);

        assert_eq!(windows, vec!["ab", "abcdefgh", "cd"]);
    }
}
