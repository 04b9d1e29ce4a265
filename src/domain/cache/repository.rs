//! Key-value store trait backing the exact-match layer

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::domain::DomainError;

/// Key-value store with per-entry TTL
///
/// Values are JSON strings so the trait stays dyn-compatible; use [`CacheExt`]
/// for typed access. Implementations report an unreachable backend as
/// [`DomainError::LayerUnavailable`].
#[async_trait]
pub trait Cache: Send + Sync + Debug {
    /// Gets a raw JSON value
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Stores a raw JSON value, replacing any prior value and resetting its TTL
    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError>;

    async fn delete(&self, key: &str) -> Result<bool, DomainError>;

    /// Deletes every key matching a glob pattern, returning how many were removed
    async fn delete_pattern(&self, pattern: &str) -> Result<usize, DomainError>;

    /// Counts keys matching a glob pattern
    async fn count_pattern(&self, pattern: &str) -> Result<usize, DomainError>;

    /// Checks that the backend is reachable
    async fn ping(&self) -> Result<(), DomainError>;

    /// Backend name for logs and health reports
    fn backend_name(&self) -> &'static str;
}

/// Typed get/set on top of [`Cache`]
pub trait CacheExt: Cache {
    fn get<'a, V>(
        &'a self,
        key: &'a str,
    ) -> impl std::future::Future<Output = Result<Option<V>, DomainError>> + Send
    where
        V: DeserializeOwned + Send,
    {
        async move {
            match self.get_raw(key).await? {
                Some(data) => {
                    let value: V = serde_json::from_str(&data).map_err(|e| {
                        DomainError::cache(format!("Failed to deserialize cache value: {}", e))
                    })?;
                    Ok(Some(value))
                }
                None => Ok(None),
            }
        }
    }

    fn set<'a, V>(
        &'a self,
        key: &'a str,
        value: &'a V,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<(), DomainError>> + Send
    where
        V: Serialize + Send + Sync,
    {
        async move {
            let data = serde_json::to_string(value).map_err(|e| {
                DomainError::cache(format!("Failed to serialize cache value: {}", e))
            })?;
            self.set_raw(key, &data, ttl).await
        }
    }
}

impl<T: Cache + ?Sized> CacheExt for T {}

/// Translates a glob pattern (`*` wildcard) into an anchored regex
pub(crate) fn glob_to_regex(pattern: &str) -> Result<regex::Regex, DomainError> {
    let escaped = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");

    regex::Regex::new(&format!("^{}$", escaped))
        .map_err(|e| DomainError::cache(format!("Invalid pattern '{}': {}", pattern, e)))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_to_regex_escapes_literals() {
        let regex = glob_to_regex("exact_cache:*").unwrap();

        assert!(regex.is_match("exact_cache:abc"));
        assert!(!regex.is_match("xexact_cache:abc"));
        assert!(!regex.is_match("exact_cacheXabc"));

        let dotted = glob_to_regex("a.b*").unwrap();
        assert!(!dotted.is_match("aXb1"));
    }
}
