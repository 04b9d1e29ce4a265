use serde::Serialize;

use super::CacheLayer;

/// Aggregate health status
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Reachability of one cache layer
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LayerHealth {
    pub layer: CacheLayer,
    pub name: &'static str,
    pub backend: &'static str,
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub latency_ms: u64,
}

/// Health of every layer plus the registered providers
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub layers: Vec<LayerHealth>,
    pub providers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_provider: Option<String>,
}

impl HealthReport {
    pub fn new(
        layers: Vec<LayerHealth>,
        providers: Vec<String>,
        default_provider: Option<String>,
    ) -> Self {
        let status = if providers.is_empty() {
            HealthStatus::Unhealthy
        } else if layers.iter().all(|l| l.reachable) {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        };

        Self {
            status,
            layers,
            providers,
            default_provider,
        }
    }

    pub fn layer(&self, layer: CacheLayer) -> Option<&LayerHealth> {
        self.layers.iter().find(|l| l.layer == layer)
    }
}
