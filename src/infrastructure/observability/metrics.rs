//! Cache metrics recorded through the `metrics` facade
//!
//! No recorder is installed here; the embedding application decides where
//! these go.

use std::time::Duration;

use metrics::{counter, histogram};

use crate::domain::tiering::{CacheLayer, LayerLookup, ResolvedLayer};

/// Counts one layer consultation by outcome (`hit`, `miss` or `unavailable`)
pub fn record_lookup<T>(layer: CacheLayer, lookup: &LayerLookup<T>) {
    let labels = lookup_labels(layer, lookup.outcome());
    counter!("llm_cache_lookups_total", &labels).increment(1);
}

/// Records end-to-end query latency by the layer that answered
pub fn record_query(resolved: ResolvedLayer, elapsed: Duration) {
    let labels = [("resolved_layer", resolved.as_str().to_string())];

    counter!("llm_cache_queries_total", &labels).increment(1);
    histogram!("llm_cache_query_seconds", &labels).record(elapsed.as_secs_f64());
}

/// Record an LLM call made on behalf of the cache
pub fn record_llm_call(params: LlmCallMetricParams) {
    let labels = [
        ("provider", params.provider.to_string()),
        ("with_context", params.with_context.to_string()),
        ("status", if params.success { "success" } else { "error" }.to_string()),
    ];

    counter!("llm_cache_provider_calls_total", &labels).increment(1);
    histogram!("llm_cache_provider_call_seconds", &labels).record(params.duration.as_secs_f64());

    if !params.success {
        counter!("llm_cache_provider_errors_total", &labels).increment(1);
    }
}

/// Parameters for LLM call metrics
pub struct LlmCallMetricParams<'a> {
    pub provider: &'a str,
    pub with_context: bool,
    pub duration: Duration,
    pub success: bool,
}

fn lookup_labels(layer: CacheLayer, outcome: &'static str) -> [(&'static str, String); 2] {
    [
        ("layer", layer.label().to_string()),
        ("outcome", outcome.to_string()),
    ]
}
