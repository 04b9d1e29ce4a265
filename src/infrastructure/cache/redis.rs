//! Redis cache implementation

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::domain::cache::Cache;
use crate::domain::DomainError;

const LAYER: &str = "0";

/// Configuration for Redis cache
#[derive(Debug, Clone)]
pub struct RedisCacheConfig {
    pub host: String,
    pub port: u16,
    /// Logical database index
    pub db: i64,
    pub password: Option<String>,
    /// Bound on connecting and on each command
    pub connection_timeout: Duration,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            db: 0,
            password: None,
            connection_timeout: Duration::from_secs(5),
        }
    }
}

impl RedisCacheConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    pub fn with_db(mut self, db: i64) -> Self {
        self.db = db;
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    fn connection_info(&self) -> redis::ConnectionInfo {
        redis::ConnectionInfo {
            addr: redis::ConnectionAddr::Tcp(self.host.clone(), self.port),
            redis: redis::RedisConnectionInfo {
                db: self.db,
                password: self.password.clone(),
                ..Default::default()
            },
        }
    }
}

/// Redis-backed Layer-0 store
///
/// The connection is established on first use, so an unreachable server
/// surfaces as a layer-unavailable error per call instead of failing startup.
pub struct RedisCache {
    client: Client,
    connection: OnceCell<ConnectionManager>,
    config: RedisCacheConfig,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("db", &self.config.db)
            .field("connected", &self.connection.initialized())
            .finish()
    }
}

impl RedisCache {
    pub fn new(config: RedisCacheConfig) -> Result<Self, DomainError> {
        let client = Client::open(config.connection_info()).map_err(|e| {
            DomainError::configuration(format!("Invalid Redis configuration: {}", e))
        })?;

        Ok(Self {
            client,
            connection: OnceCell::new(),
            config,
        })
    }

    fn unavailable(context: &str, error: impl fmt::Display) -> DomainError {
        DomainError::layer_unavailable(LAYER, format!("{}: {}", context, error))
    }

    async fn connection(&self) -> Result<ConnectionManager, DomainError> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                debug!(host = %self.config.host, port = self.config.port, "Connecting to Redis");
                tokio::time::timeout(
                    self.config.connection_timeout,
                    ConnectionManager::new(self.client.clone()),
                )
                .await
                .map_err(|_| Self::unavailable("Redis connect", "timed out"))?
                .map_err(|e| Self::unavailable("Redis connect", e))
            })
            .await?;

        Ok(manager.clone())
    }

    /// Runs a command future under the configured timeout
    async fn bounded<T, F>(&self, context: &str, command: F) -> Result<T, DomainError>
    where
        F: std::future::Future<Output = redis::RedisResult<T>>,
    {
        tokio::time::timeout(self.config.connection_timeout, command)
            .await
            .map_err(|_| Self::unavailable(context, "timed out"))?
            .map_err(|e| Self::unavailable(context, e))
    }

    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, DomainError> {
        let mut conn = self.connection().await?;
        let mut cursor = 0u64;
        let mut keys = Vec::new();

        loop {
            let (new_cursor, batch): (u64, Vec<String>) = self
                .bounded(
                    "SCAN",
                    redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(pattern)
                        .arg("COUNT")
                        .arg(100)
                        .query_async(&mut conn),
                )
                .await?;

            keys.extend(batch);
            cursor = new_cursor;

            if cursor == 0 {
                break;
            }
        }

        Ok(keys)
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        let mut conn = self.connection().await?;
        self.bounded("GET", conn.get(key)).await
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        let mut conn = self.connection().await?;
        let ttl_secs = ttl.as_secs().max(1);

        self.bounded("SET EX", conn.set_ex::<_, _, ()>(key, value, ttl_secs))
            .await
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        let mut conn = self.connection().await?;
        let deleted: i64 = self.bounded("DEL", conn.del(key)).await?;

        Ok(deleted > 0)
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<usize, DomainError> {
        let keys = self.scan_keys(pattern).await?;

        if keys.is_empty() {
            return Ok(0);
        }

        let mut conn = self.connection().await?;
        let mut total_deleted = 0usize;

        for batch in keys.chunks(500) {
            let deleted: i64 = self.bounded("DEL", conn.del(batch)).await?;
            total_deleted += deleted.max(0) as usize;
        }

        Ok(total_deleted)
    }

    async fn count_pattern(&self, pattern: &str) -> Result<usize, DomainError> {
        Ok(self.scan_keys(pattern).await?.len())
    }

    async fn ping(&self) -> Result<(), DomainError> {
        let mut conn = self.connection().await?;
        let _: String = self
            .bounded("PING", redis::cmd("PING").query_async(&mut conn))
            .await?;

        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::CacheExt;

    fn local_cache() -> RedisCache {
        RedisCache::new(RedisCacheConfig::new("127.0.0.1", 6379).with_db(15)).unwrap()
    }

    #[test]
    fn test_connection_info() {
        let config = RedisCacheConfig::new("cache.internal", 6380)
            .with_db(2)
            .with_password("secret");
        let info = config.connection_info();

        assert_eq!(info.redis.db, 2);
        assert_eq!(info.redis.password.as_deref(), Some("secret"));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_layer_unavailable() {
        let cache = RedisCache::new(
            RedisCacheConfig::new("127.0.0.1", 1)
                .with_connection_timeout(Duration::from_millis(500)),
        )
        .unwrap();

        let error = cache.get_raw("exact_cache:x").await.unwrap_err();
        assert!(error.is_layer_unavailable());
        assert!(cache.ping().await.is_err());
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_set_get_delete_pattern() {
        let cache = local_cache();

        cache
            .set("exact_cache:a", &"value1", Duration::from_secs(60))
            .await
            .unwrap();
        let result: Option<String> = cache.get("exact_cache:a").await.unwrap();
        assert_eq!(result, Some("value1".to_string()));

        let deleted = cache.delete_pattern("exact_cache:*").await.unwrap();
        assert!(deleted >= 1);
        assert_eq!(cache.count_pattern("exact_cache:*").await.unwrap(), 0);
    }
}
