use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::gemini::GeminiChatModel;
use super::http_client::HttpClient;
use super::openai::OpenAiChatModel;
use super::registry::ProviderRegistry;
use super::remote::RemoteEndpointProvider;
use crate::config::{LlmConfig, RemoteEndpointConfig};
use crate::domain::{DomainError, ProviderDescriptor, ProviderKind};

/// Builds the provider registry from configuration
#[derive(Debug)]
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    /// Registers `openai` and `gemini` when their keys are set, then every remote endpoint
    pub fn create_registry(config: &LlmConfig) -> Result<ProviderRegistry, DomainError> {
        let registry = ProviderRegistry::new();
        let http_client = HttpClient::with_timeout(Duration::from_secs(config.request_timeout_secs))?;

        if let Some(ref api_key) = config.openai_api_key {
            let chat_model = match config.openai_base_url {
                Some(ref base_url) => {
                    OpenAiChatModel::with_base_url(http_client.clone(), api_key, base_url)
                }
                None => OpenAiChatModel::new(http_client.clone(), api_key),
            };
            registry.register_chat_model(
                "openai",
                Arc::new(chat_model),
                &config.openai_model,
                Some(config.temperature),
            )?;
        }

        if let Some(ref api_key) = config.gemini_api_key {
            registry.register_chat_model(
                "gemini",
                Arc::new(GeminiChatModel::new(http_client.clone(), api_key)),
                &config.gemini_model,
                Some(config.temperature),
            )?;
        }

        for endpoint in &config.remote_endpoints {
            Self::register_remote(&registry, http_client.clone(), endpoint, config.temperature)?;
        }

        if let Some(ref default) = config.default_provider {
            if let Err(e) = registry.set_default(default) {
                warn!(
                    provider = %default,
                    fallback = ?registry.default_provider(),
                    error = %e,
                    "Configured default provider is not registered"
                );
            }
        }

        info!(providers = ?registry.list(), "LLM providers initialized");
        Ok(registry)
    }

    /// Registers one remote text-completion endpoint
    pub fn register_remote(
        registry: &ProviderRegistry,
        http_client: HttpClient,
        endpoint: &RemoteEndpointConfig,
        default_temperature: f32,
    ) -> Result<(), DomainError> {
        if endpoint.url.trim().is_empty() {
            return Err(DomainError::configuration(format!(
                "Remote endpoint '{}' has no url",
                endpoint.name
            )));
        }

        let mut provider = RemoteEndpointProvider::new(http_client, &endpoint.name, &endpoint.url)
            .with_temperature(endpoint.temperature.unwrap_or(default_temperature))
            .with_extra(endpoint.extra.clone().into_iter().collect());
        if let Some(ref api_key) = endpoint.api_key {
            provider = provider.with_api_key(api_key);
        }
        for (name, value) in &endpoint.headers {
            provider = provider.with_header(name, value);
        }

        let model_label = endpoint
            .model_label
            .clone()
            .unwrap_or_else(|| endpoint.name.clone());
        let descriptor = ProviderDescriptor::new(
            &endpoint.name,
            ProviderKind::RemoteEndpoint,
            "Custom",
            model_label,
        );

        registry.register(descriptor, Arc::new(provider))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(name: &str) -> RemoteEndpointConfig {
        RemoteEndpointConfig {
            name: name.to_string(),
            url: format!("http://localhost:9000/{}", name),
            api_key: Some("k".to_string()),
            model_label: None,
            temperature: None,
            headers: Default::default(),
            extra: Default::default(),
        }
    }

    #[test]
    fn test_registers_configured_providers() {
        let config = LlmConfig {
            openai_api_key: Some("sk-test".to_string()),
            gemini_api_key: Some("g-test".to_string()),
            remote_endpoints: vec![remote("local")],
            ..LlmConfig::default()
        };

        let registry = LlmProviderFactory::create_registry(&config).unwrap();

        assert_eq!(registry.list(), vec!["openai", "gemini", "local"]);
        assert_eq!(registry.default_provider().as_deref(), Some("openai"));

        let labels: Vec<String> = registry.describe().iter().map(|d| d.display_name()).collect();
        assert_eq!(
            labels,
            vec!["OpenAI (gpt-3.5-turbo)", "Google Gemini (gemini-pro)", "Custom (local)"]
        );
    }

    #[test]
    fn test_missing_default_falls_back_to_first_registered() {
        let config = LlmConfig {
            remote_endpoints: vec![remote("local")],
            ..LlmConfig::default()
        };

        let registry = LlmProviderFactory::create_registry(&config).unwrap();

        assert_eq!(registry.default_provider().as_deref(), Some("local"));
    }

    #[test]
    fn test_duplicate_endpoint_names_rejected() {
        let config = LlmConfig {
            remote_endpoints: vec![remote("local"), remote("local")],
            ..LlmConfig::default()
        };

        let error = LlmProviderFactory::create_registry(&config).unwrap_err();
        assert!(matches!(error, DomainError::Conflict { .. }));
    }

    #[test]
    fn test_no_keys_means_empty_registry() {
        let registry = LlmProviderFactory::create_registry(&LlmConfig::default()).unwrap();
        assert!(registry.is_empty());
    }
}
