//! Exact-match cache domain (Layer 0)

mod key;
mod record;
mod repository;

pub use key::{normalize_query, NormalizedKey, EXACT_CACHE_NAMESPACE};
pub use record::CacheRecord;
pub use repository::{Cache, CacheExt};
pub(crate) use repository::glob_to_regex;

#[cfg(test)]
pub use repository::mock::MockCache;
