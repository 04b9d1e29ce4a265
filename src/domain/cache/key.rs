//! Exact-match cache key derivation

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Namespace shared by every Layer-0 key
pub const EXACT_CACHE_NAMESPACE: &str = "exact_cache";

/// Deterministic key derived from normalized query text
///
/// Identical text after normalization (lower-casing, trimming and collapsing
/// whitespace runs) always yields the identical key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedKey(String);

impl NormalizedKey {
    /// Derives the key for a raw query
    pub fn from_query(query: &str) -> Self {
        let normalized = normalize_query(query);
        let digest = Sha256::digest(normalized.as_bytes());

        Self(format!("{}:{}", EXACT_CACHE_NAMESPACE, hex::encode(digest)))
    }

    /// Glob pattern matching every key in the namespace
    pub fn namespace_pattern() -> String {
        format!("{}:*", EXACT_CACHE_NAMESPACE)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lower-cases the text and collapses whitespace runs to single spaces
pub fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}
