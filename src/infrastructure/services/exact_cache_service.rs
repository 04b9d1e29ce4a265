//! Layer 0: exact-match answers keyed by normalized query text

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::domain::cache::{Cache, CacheExt, CacheRecord, NormalizedKey};
use crate::domain::tiering::{CacheLayer, LayerHealth, LayerLookup};
use crate::domain::DomainError;

/// Exact cache service over any [`Cache`] backend
#[derive(Debug, Clone)]
pub struct ExactCacheService {
    cache: Arc<dyn Cache>,
}

impl ExactCacheService {
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self { cache }
    }

    pub fn backend_name(&self) -> &'static str {
        self.cache.backend_name()
    }

    /// Looks up the stored answer for a query.
    ///
    /// An unreachable backend yields [`LayerLookup::Unavailable`]; an unreadable
    /// or expired record is treated as a miss.
    pub async fn get(&self, query: &str) -> Result<LayerLookup<CacheRecord>, DomainError> {
        let key = NormalizedKey::from_query(query);

        let record: Option<CacheRecord> = match self.cache.get(key.as_str()).await {
            Ok(record) => record,
            Err(e) if e.is_layer_unavailable() => return Ok(LayerLookup::Unavailable(e.to_string())),
            Err(DomainError::Cache { message }) => {
                warn!(key = %key, "Discarding unreadable exact cache entry: {}", message);
                self.discard(&key).await;
                return Ok(LayerLookup::Miss);
            }
            Err(e) => return Err(e),
        };

        match record {
            Some(record) if record.is_expired() => {
                debug!(key = %key, "Exact cache entry expired");
                self.discard(&key).await;
                Ok(LayerLookup::Miss)
            }
            Some(record) => Ok(LayerLookup::Hit(record)),
            None => Ok(LayerLookup::Miss),
        }
    }

    /// Stores an answer, replacing any previous one and restarting its TTL.
    ///
    /// Returns `false` without writing when `ttl_seconds` is zero.
    pub async fn put(&self, query: &str, response: &str, ttl_seconds: u64) -> Result<bool, DomainError> {
        if ttl_seconds == 0 {
            debug!("Exact cache TTL is zero; skipping write");
            return Ok(false);
        }

        let key = NormalizedKey::from_query(query);
        let record = CacheRecord::new(key.clone(), response, ttl_seconds);

        self.put_record(&record).await?;
        Ok(true)
    }

    /// Stores a prepared record under its own key
    pub async fn put_record(&self, record: &CacheRecord) -> Result<(), DomainError> {
        let ttl = Duration::from_secs(record.ttl_seconds);
        self.cache.set(record.key.as_str(), record, ttl).await?;

        debug!(key = %record.key, ttl_seconds = record.ttl_seconds, "Stored exact cache entry");
        Ok(())
    }

    pub async fn delete(&self, query: &str) -> Result<bool, DomainError> {
        let key = NormalizedKey::from_query(query);
        self.cache.delete(key.as_str()).await
    }

    /// Removes every Layer-0 entry; other keys in the backend are untouched
    pub async fn clear(&self) -> Result<usize, DomainError> {
        let removed = self
            .cache
            .delete_pattern(&NormalizedKey::namespace_pattern())
            .await?;

        debug!(removed, "Cleared exact cache");
        Ok(removed)
    }

    pub async fn count(&self) -> Result<usize, DomainError> {
        self.cache
            .count_pattern(&NormalizedKey::namespace_pattern())
            .await
    }

    pub async fn health(&self) -> LayerHealth {
        let start = Instant::now();
        let result = self.cache.ping().await;

        LayerHealth {
            layer: CacheLayer::Exact,
            name: CacheLayer::Exact.label(),
            backend: self.cache.backend_name(),
            reachable: result.is_ok(),
            message: result.err().map(|e| e.public_message()),
            latency_ms: start.elapsed().as_millis() as u64,
        }
    }

    async fn discard(&self, key: &NormalizedKey) {
        if let Err(e) = self.cache.delete(key.as_str()).await {
            debug!(key = %key, "Failed to discard exact cache entry: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::MockCache;
    use chrono::{Duration as ChronoDuration, Utc};

    #[tokio::test]
    async fn test_put_then_get() {
        let service = ExactCacheService::new(Arc::new(MockCache::new()));

        assert!(service.put("What is Python?", "A language", 3600).await.unwrap());

        match service.get("what   is python?").await.unwrap() {
            LayerLookup::Hit(record) => {
                assert_eq!(record.response, "A language");
                assert_eq!(record.ttl_seconds, 3600);
            }
            other => panic!("expected hit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let service = ExactCacheService::new(Arc::new(MockCache::new()));

        service.put("q", "first", 60).await.unwrap();
        service.put("q", "second", 60).await.unwrap();

        let lookup = service.get("q").await.unwrap();
        assert!(matches!(lookup, LayerLookup::Hit(r) if r.response == "second"));
        assert_eq!(service.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_zero_ttl_skips_write() {
        let cache = Arc::new(MockCache::new());
        let service = ExactCacheService::new(cache.clone());

        assert!(!service.put("q", "answer", 0).await.unwrap());
        assert_eq!(cache.len(), 0);
        assert_eq!(service.get("q").await.unwrap(), LayerLookup::Miss);
    }

    #[tokio::test]
    async fn test_expired_record_is_miss_and_discarded() {
        let cache = Arc::new(MockCache::new());
        let service = ExactCacheService::new(cache.clone());

        let record = CacheRecord::new(NormalizedKey::from_query("q"), "stale", 10)
            .with_created_at(Utc::now() - ChronoDuration::seconds(11));
        service.put_record(&record).await.unwrap();

        assert_eq!(service.get("q").await.unwrap(), LayerLookup::Miss);
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn test_unreadable_entry_is_miss() {
        let key = NormalizedKey::from_query("q");
        let cache = Arc::new(MockCache::new().with_raw_entry(key.as_str(), "not json"));
        let service = ExactCacheService::new(cache.clone());

        assert_eq!(service.get("q").await.unwrap(), LayerLookup::Miss);
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn test_unavailable_backend() {
        let service = ExactCacheService::new(Arc::new(MockCache::new().with_unavailable("refused")));

        let lookup = service.get("q").await.unwrap();
        assert!(matches!(lookup, LayerLookup::Unavailable(_)));

        let error = service.put("q", "a", 60).await.unwrap_err();
        assert!(error.is_layer_unavailable());

        let health = service.health().await;
        assert!(!health.reachable);
        assert_eq!(health.message.as_deref(), Some("cache layer 0 is unavailable"));
    }

    #[tokio::test]
    async fn test_clear_only_touches_namespace() {
        let cache = Arc::new(MockCache::new().with_raw_entry("session:1", "keep"));
        let service = ExactCacheService::new(cache.clone());

        service.put("a", "1", 60).await.unwrap();
        service.put("b", "2", 60).await.unwrap();

        assert_eq!(service.clear().await.unwrap(), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(service.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete() {
        let service = ExactCacheService::new(Arc::new(MockCache::new()));
        service.put("q", "a", 60).await.unwrap();

        assert!(service.delete("Q").await.unwrap());
        assert_eq!(service.get("q").await.unwrap(), LayerLookup::Miss);
    }
}
