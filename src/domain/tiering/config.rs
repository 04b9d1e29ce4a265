//! Validated thresholds and TTL for the tiered lookup

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::DomainError;

/// Settings consumed by the orchestrator; checked by [`CacheSettings::validated`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CacheSettings {
    /// Minimum similarity for a Layer-1 hit
    #[validate(range(min = 0.0, max = 1.0))]
    pub semantic_threshold: f32,
    /// Minimum similarity for a Layer-2 chunk to count as context
    #[validate(range(min = 0.0, max = 1.0))]
    pub document_threshold: f32,
    /// Layer-0 TTL; zero disables Layer-0 writes
    pub ttl_seconds: u64,
    #[validate(range(min = 1))]
    pub document_top_k: usize,
    pub default_provider: Option<String>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            semantic_threshold: 0.85,
            document_threshold: 0.75,
            ttl_seconds: 3600,
            document_top_k: 3,
            default_provider: None,
        }
    }
}

impl CacheSettings {
    /// Builds and validates settings in one step
    pub fn new(
        semantic_threshold: f32,
        document_threshold: f32,
        ttl_seconds: u64,
    ) -> Result<Self, DomainError> {
        Self {
            semantic_threshold,
            document_threshold,
            ttl_seconds,
            ..Default::default()
        }
        .validated()
    }

    pub fn with_document_top_k(mut self, top_k: usize) -> Self {
        self.document_top_k = top_k;
        self
    }

    pub fn with_default_provider(mut self, name: impl Into<String>) -> Self {
        self.default_provider = Some(name.into());
        self
    }

    /// Rejects out-of-range values; nothing is clamped
    pub fn validated(self) -> Result<Self, DomainError> {
        for (field, value) in [
            ("semantic_threshold", self.semantic_threshold),
            ("document_threshold", self.document_threshold),
        ] {
            if !value.is_finite() {
                return Err(DomainError::validation(format!(
                    "{} must be a finite number",
                    field
                )));
            }
        }

        self.validate()
            .map_err(|e| DomainError::validation(format!("Invalid cache settings: {}", e)))?;

        if let Some(name) = &self.default_provider {
            if name.trim().is_empty() {
                return Err(DomainError::validation("default_provider must not be blank"));
            }
        }

        Ok(self)
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = CacheSettings::default().validated().unwrap();

        assert_eq!(settings.semantic_threshold, 0.85);
        assert_eq!(settings.document_threshold, 0.75);
        assert_eq!(settings.ttl_seconds, 3600);
    }

    #[test]
    fn test_boundaries_accepted() {
        assert!(CacheSettings::new(0.0, 1.0, 0).is_ok());
        assert!(CacheSettings::new(1.0, 0.0, u64::MAX).is_ok());
    }

    #[test]
    fn test_out_of_range_threshold_rejected() {
        let error = CacheSettings::new(1.2, 0.75, 3600).unwrap_err();
        assert!(matches!(error, DomainError::Validation { .. }));
        assert!(error.to_string().contains("semantic_threshold"));

        assert!(CacheSettings::new(0.85, -0.1, 3600).is_err());
    }

    #[test]
    fn test_nan_threshold_rejected() {
        assert!(CacheSettings::new(f32::NAN, 0.75, 3600).is_err());
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let result = CacheSettings::default().with_document_top_k(0).validated();
        assert!(result.is_err());
    }

    #[test]
    fn test_blank_default_provider_rejected() {
        let result = CacheSettings::default().with_default_provider("  ").validated();
        assert!(result.is_err());
    }
}
