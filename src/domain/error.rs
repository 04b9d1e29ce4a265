use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Cache error: {message}")]
    Cache { message: String },

    /// Backing store for a cache layer is unreachable or timed out
    #[error("Layer {layer} unavailable: {message}")]
    LayerUnavailable { layer: String, message: String },

    #[error("Embedding error: {message}")]
    Embedding { message: String },

    #[error("Dimension mismatch in '{collection}': expected {expected}, got {actual}")]
    DimensionMismatch {
        collection: String,
        expected: usize,
        actual: usize,
    },

    #[error("Provider not found: {name}")]
    ProviderNotFound { name: String },

    #[error("Provider error: {provider} - {message}")]
    Provider { provider: String, message: String },

    #[error("Provider timeout: {provider} - {message}")]
    Timeout { provider: String, message: String },
}

/// Pipeline stage a failure is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Embedding,
    CacheLayer,
    Provider,
    Configuration,
    Internal,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureStage::Embedding => "embedding",
            FailureStage::CacheLayer => "cache_layer",
            FailureStage::Provider => "provider",
            FailureStage::Configuration => "configuration",
            FailureStage::Internal => "internal",
        };
        f.write_str(name)
    }
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    pub fn layer_unavailable(layer: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LayerUnavailable {
            layer: layer.into(),
            message: message.into(),
        }
    }

    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
        }
    }

    pub fn dimension_mismatch(collection: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            collection: collection.into(),
            expected,
            actual,
        }
    }

    pub fn provider_not_found(name: impl Into<String>) -> Self {
        Self::ProviderNotFound { name: name.into() }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn timeout(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Timeout {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether the orchestrator may treat this error as a pass-through for the layer
    pub fn is_layer_unavailable(&self) -> bool {
        matches!(self, Self::LayerUnavailable { .. })
    }

    pub fn stage(&self) -> FailureStage {
        match self {
            Self::Embedding { .. } => FailureStage::Embedding,
            Self::LayerUnavailable { .. } | Self::Cache { .. } => FailureStage::CacheLayer,
            Self::ProviderNotFound { .. } | Self::Provider { .. } | Self::Timeout { .. } => {
                FailureStage::Provider
            }
            Self::Validation { .. }
            | Self::Conflict { .. }
            | Self::Configuration { .. }
            | Self::DimensionMismatch { .. } => FailureStage::Configuration,
            Self::NotFound { .. } | Self::Internal { .. } => FailureStage::Internal,
        }
    }

    /// Caller-safe description that names the failing stage without backend details
    pub fn public_message(&self) -> String {
        match self {
            Self::Embedding { .. } => "failed to generate an embedding for the query".to_string(),
            Self::LayerUnavailable { layer, .. } => format!("cache layer {} is unavailable", layer),
            Self::Cache { .. } => "cache layer returned an unreadable entry".to_string(),
            Self::ProviderNotFound { name } => format!("LLM provider '{}' is not registered", name),
            Self::Provider { provider, .. } => format!("LLM provider '{}' failed", provider),
            Self::Timeout { provider, .. } => format!("LLM provider '{}' timed out", provider),
            Self::DimensionMismatch { collection, .. } => format!(
                "embedding dimension does not match collection '{}'",
                collection
            ),
            Self::Validation { message }
            | Self::Conflict { message }
            | Self::Configuration { message } => message.clone(),
            Self::NotFound { message } => message.clone(),
            Self::Internal { .. } => "internal error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let error = DomainError::validation("Invalid input");
        assert_eq!(error.to_string(), "Validation error: Invalid input");
    }

    #[test]
    fn test_conflict_error() {
        let error = DomainError::conflict("Provider 'openai' already registered");
        assert_eq!(
            error.to_string(),
            "Conflict: Provider 'openai' already registered"
        );
    }

    #[test]
    fn test_layer_unavailable_is_skippable() {
        let error = DomainError::layer_unavailable("0", "connection refused");
        assert!(error.is_layer_unavailable());
        assert_eq!(error.stage(), FailureStage::CacheLayer);
        assert!(!DomainError::embedding("bad input").is_layer_unavailable());
    }

    #[test]
    fn test_public_message_hides_backend_details() {
        let error = DomainError::provider("openai", "HTTP 500: upstream at 10.0.0.3 exploded");
        let message = error.public_message();

        assert_eq!(message, "LLM provider 'openai' failed");
        assert!(!message.contains("10.0.0.3"));
        assert_eq!(error.stage(), FailureStage::Provider);
    }

    #[test]
    fn test_dimension_mismatch_is_configuration_failure() {
        let error = DomainError::dimension_mismatch("semantic_cache", 384, 1536);
        assert_eq!(error.stage(), FailureStage::Configuration);
        assert_eq!(
            error.to_string(),
            "Dimension mismatch in 'semantic_cache': expected 384, got 1536"
        );
    }
}
