use serde::Serialize;

use super::CacheLayer;

/// Result of clearing one cache layer
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LayerClear {
    pub layer: CacheLayer,
    pub cleared: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Per-layer results of a clear; one failing layer never stops the others
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClearReport {
    pub layers: Vec<LayerClear>,
}

impl ClearReport {
    pub fn record(&mut self, layer: CacheLayer, message: Option<String>) {
        self.layers.push(LayerClear {
            layer,
            cleared: message.is_none(),
            message,
        });
    }

    pub fn is_complete(&self) -> bool {
        self.layers.iter().all(|l| l.cleared)
    }

    pub fn cleared(&self) -> Vec<CacheLayer> {
        self.layers.iter().filter(|l| l.cleared).map(|l| l.layer).collect()
    }

    pub fn failed(&self) -> Vec<CacheLayer> {
        self.layers.iter().filter(|l| !l.cleared).map(|l| l.layer).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_layer_marks_report_incomplete() {
        let mut report = ClearReport::default();
        report.record(CacheLayer::Exact, Some("connection refused".into()));
        report.record(CacheLayer::Semantic, None);

        assert!(!report.is_complete());
        assert_eq!(report.cleared(), vec![CacheLayer::Semantic]);
        assert_eq!(report.failed(), vec![CacheLayer::Exact]);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["layers"][0]["message"], "connection refused");
        assert!(json["layers"][1].get("message").is_none());
    }
}
