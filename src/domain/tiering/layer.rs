use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// One of the three cache tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CacheLayer {
    #[serde(rename = "0")]
    Exact,
    #[serde(rename = "1")]
    Semantic,
    #[serde(rename = "2")]
    Document,
}

impl CacheLayer {
    pub const ALL: [CacheLayer; 3] = [CacheLayer::Exact, CacheLayer::Semantic, CacheLayer::Document];

    pub fn index(&self) -> u8 {
        match self {
            CacheLayer::Exact => 0,
            CacheLayer::Semantic => 1,
            CacheLayer::Document => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CacheLayer::Exact => "exact",
            CacheLayer::Semantic => "semantic",
            CacheLayer::Document => "document",
        }
    }
}

impl fmt::Display for CacheLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

impl FromStr for CacheLayer {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "0" | "exact" => Ok(CacheLayer::Exact),
            "1" | "semantic" => Ok(CacheLayer::Semantic),
            "2" | "document" | "rag" => Ok(CacheLayer::Document),
            other => Err(DomainError::validation(format!(
                "Unknown cache layer: {}. Valid layers: 0, 1, 2",
                other
            ))),
        }
    }
}

/// Result of consulting a single layer
#[derive(Debug, Clone, PartialEq)]
pub enum LayerLookup<T> {
    Hit(T),
    Miss,
    /// Backend unreachable; the orchestrator passes through to the next tier
    Unavailable(String),
}

impl<T> LayerLookup<T> {
    pub fn is_hit(&self) -> bool {
        matches!(self, LayerLookup::Hit(_))
    }

    pub fn outcome(&self) -> &'static str {
        match self {
            LayerLookup::Hit(_) => "hit",
            LayerLookup::Miss => "miss",
            LayerLookup::Unavailable(_) => "unavailable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_layer() {
        assert_eq!("0".parse::<CacheLayer>().unwrap(), CacheLayer::Exact);
        assert_eq!(" 1 ".parse::<CacheLayer>().unwrap(), CacheLayer::Semantic);
        assert_eq!("rag".parse::<CacheLayer>().unwrap(), CacheLayer::Document);
        assert!("3".parse::<CacheLayer>().is_err());
    }

    #[test]
    fn test_display_and_serialize_as_index() {
        assert_eq!(CacheLayer::Document.to_string(), "2");
        assert_eq!(serde_json::to_string(&CacheLayer::Exact).unwrap(), "\"0\"");
    }

    #[test]
    fn test_lookup_outcome() {
        assert_eq!(LayerLookup::Hit(1).outcome(), "hit");
        assert_eq!(LayerLookup::<u8>::Miss.outcome(), "miss");
        assert!(!LayerLookup::<u8>::Unavailable("down".into()).is_hit());
    }
}
