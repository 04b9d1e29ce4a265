//! Observability infrastructure - cache lookup metrics

mod metrics;

pub use metrics::{record_llm_call, record_lookup, record_query, LlmCallMetricParams};
