//! Tiered lookup types: layers, settings, query results and health

mod clear;
mod config;
mod health;
mod layer;
mod query;

pub use clear::{ClearReport, LayerClear};
pub use config::CacheSettings;
pub use health::{HealthReport, HealthStatus, LayerHealth};
pub use layer::{CacheLayer, LayerLookup};
pub use query::{Query, QueryResult, ResolvedLayer};
