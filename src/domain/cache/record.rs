use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};

use super::NormalizedKey;

/// A stored Layer-0 answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub key: NormalizedKey,
    pub response: String,
    pub created_at: DateTime<Utc>,
    pub ttl_seconds: u64,
}

impl CacheRecord {
    pub fn new(key: NormalizedKey, response: impl Into<String>, ttl_seconds: u64) -> Self {
        Self {
            key,
            response: response.into(),
            created_at: Utc::now(),
            ttl_seconds,
        }
    }

    /// Overrides the creation timestamp
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// `None` when the TTL is too large to represent
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let ttl = i64::try_from(self.ttl_seconds)
            .ok()
            .and_then(ChronoDuration::try_seconds)?;
        self.created_at.checked_add_signed(ttl)
    }

    /// Expired once `now > created_at + ttl_seconds`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|expires_at| now > expires_at)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}
