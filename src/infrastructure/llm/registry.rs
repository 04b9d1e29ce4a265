//! Named completion providers with a default

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use serde::Serialize;
use tracing::{debug, info};

use super::function::FunctionProvider;
use super::wrapped::WrappedChatProvider;
use crate::domain::{
    ChatModel, CompletionProvider, CompletionRequest, DomainError, ProviderDescriptor,
    ProviderKind,
};

/// Answer produced by a registered provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderAnswer {
    pub response: String,
    /// Registry name of the provider that answered
    pub provider: String,
    /// Display name, e.g. `OpenAI (gpt-3.5-turbo)`
    pub provider_label: String,
}

struct RegisteredProvider {
    descriptor: ProviderDescriptor,
    provider: Arc<dyn CompletionProvider>,
}

#[derive(Default)]
struct RegistryState {
    /// Registration order, for stable listings
    order: Vec<String>,
    providers: HashMap<String, RegisteredProvider>,
    default: Option<String>,
}

/// Registry of completion providers
///
/// Names are unique: registering an existing name fails with
/// [`DomainError::Conflict`]; replace a provider by unregistering it first.
/// The first provider registered becomes the default unless one is set.
#[derive(Default)]
pub struct ProviderRegistry {
    state: RwLock<RegistryState>,
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.list())
            .field("default", &self.default_provider())
            .finish()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, RegistryState>, DomainError> {
        self.state
            .read()
            .map_err(|e| DomainError::internal(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, RegistryState>, DomainError> {
        self.state
            .write()
            .map_err(|e| DomainError::internal(format!("Failed to acquire write lock: {}", e)))
    }

    /// Registers a provider under `descriptor.name`
    pub fn register(
        &self,
        descriptor: ProviderDescriptor,
        provider: Arc<dyn CompletionProvider>,
    ) -> Result<(), DomainError> {
        let name = descriptor.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("Provider name cannot be empty"));
        }

        let mut state = self.write()?;
        if state.providers.contains_key(&name) {
            return Err(DomainError::conflict(format!(
                "Provider '{}' is already registered",
                name
            )));
        }

        info!(provider = %name, kind = %descriptor.kind, "Registered LLM provider");

        if state.default.is_none() {
            state.default = Some(name.clone());
        }
        state.order.push(name.clone());
        state.providers.insert(
            name.clone(),
            RegisteredProvider {
                descriptor: ProviderDescriptor { name, ..descriptor },
                provider,
            },
        );

        Ok(())
    }

    /// Registers a chat model as a wrapped instance
    pub fn register_chat_model(
        &self,
        name: impl Into<String>,
        chat_model: Arc<dyn ChatModel>,
        model: impl Into<String>,
        temperature: Option<f32>,
    ) -> Result<(), DomainError> {
        let mut provider = WrappedChatProvider::new(chat_model, model);
        if let Some(temperature) = temperature {
            provider = provider.with_temperature(temperature);
        }

        let descriptor = ProviderDescriptor::new(
            name,
            ProviderKind::WrappedInstance,
            provider.vendor(),
            provider.model(),
        );
        self.register(descriptor, Arc::new(provider))
    }

    /// Registers a caller-supplied `(query, context) -> text` function
    pub fn register_function<F>(
        &self,
        name: impl Into<String>,
        model_label: impl Into<String>,
        function: F,
    ) -> Result<(), DomainError>
    where
        F: Fn(&str, Option<&str>) -> Result<String, DomainError> + Send + Sync + 'static,
    {
        let descriptor =
            ProviderDescriptor::new(name, ProviderKind::CustomFunction, "Custom", model_label);
        self.register(descriptor, Arc::new(FunctionProvider::new(function)))
    }

    /// Removes a provider; the default is cleared when it pointed at it
    pub fn unregister(&self, name: &str) -> Result<(), DomainError> {
        let mut state = self.write()?;
        if state.providers.remove(name).is_none() {
            return Err(DomainError::provider_not_found(name));
        }

        state.order.retain(|n| n != name);
        if state.default.as_deref() == Some(name) {
            state.default = None;
        }

        info!(provider = %name, "Unregistered LLM provider");
        Ok(())
    }

    /// Selects the provider used when a query names none
    pub fn set_default(&self, name: &str) -> Result<(), DomainError> {
        let mut state = self.write()?;
        if !state.providers.contains_key(name) {
            return Err(DomainError::provider_not_found(name));
        }

        state.default = Some(name.to_string());
        Ok(())
    }

    pub fn default_provider(&self) -> Option<String> {
        self.read().ok().and_then(|state| state.default.clone())
    }

    /// Provider names in registration order
    pub fn list(&self) -> Vec<String> {
        self.read()
            .map(|state| state.order.clone())
            .unwrap_or_default()
    }

    pub fn describe(&self) -> Vec<ProviderDescriptor> {
        self.read()
            .map(|state| {
                state
                    .order
                    .iter()
                    .filter_map(|name| state.providers.get(name))
                    .map(|entry| entry.descriptor.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.list().is_empty()
    }

    fn resolve(
        &self,
        name: Option<&str>,
    ) -> Result<(ProviderDescriptor, Arc<dyn CompletionProvider>), DomainError> {
        let state = self.read()?;
        let name = match name {
            Some(name) => name.to_string(),
            None => state
                .default
                .clone()
                .ok_or_else(|| DomainError::provider_not_found("<default>"))?,
        };

        state
            .providers
            .get(&name)
            .map(|entry| (entry.descriptor.clone(), entry.provider.clone()))
            .ok_or_else(|| DomainError::provider_not_found(name))
    }

    /// Invokes the named provider, or the default when `name` is `None`
    pub async fn invoke(
        &self,
        name: Option<&str>,
        request: &CompletionRequest,
    ) -> Result<ProviderAnswer, DomainError> {
        let (descriptor, provider) = self.resolve(name)?;

        debug!(
            provider = %descriptor.name,
            with_context = request.context.is_some(),
            "Calling LLM provider"
        );
        let response = provider.complete(request).await?;

        Ok(ProviderAnswer {
            response,
            provider_label: descriptor.display_name(),
            provider: descriptor.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm::{MockChatModel, MockCompletionProvider};

    fn echo_registry() -> ProviderRegistry {
        let registry = ProviderRegistry::new();
        registry
            .register_function("echo", "echo-v1", |q, c| {
                Ok(format!("echo:{}:{}", q, c.unwrap_or("")))
            })
            .unwrap();
        registry
    }

    #[tokio::test]
    async fn test_first_registered_becomes_default() {
        let registry = echo_registry();
        registry
            .register_function("other", "v2", |_, _| Ok("other".to_string()))
            .unwrap();

        assert_eq!(registry.default_provider().as_deref(), Some("echo"));
        assert_eq!(registry.list(), vec!["echo", "other"]);

        let answer = registry.invoke(None, &CompletionRequest::new("hi")).await.unwrap();
        assert_eq!(answer.response, "echo:hi:");
        assert_eq!(answer.provider, "echo");
        assert_eq!(answer.provider_label, "Custom (echo-v1)");
    }

    #[tokio::test]
    async fn test_duplicate_registration_rejected_and_first_definition_kept() {
        let registry = echo_registry();

        let error = registry
            .register_function("echo", "impostor", |_, _| Ok("impostor".to_string()))
            .unwrap_err();
        assert!(matches!(error, DomainError::Conflict { .. }));

        let answer = registry
            .invoke(Some("echo"), &CompletionRequest::new("q"))
            .await
            .unwrap();
        assert_eq!(answer.response, "echo:q:");
        assert_eq!(registry.describe().len(), 1);
    }

    #[tokio::test]
    async fn test_replace_after_unregister() {
        let registry = echo_registry();
        registry.unregister("echo").unwrap();
        assert_eq!(registry.default_provider(), None);

        registry
            .register_function("echo", "v2", |_, _| Ok("replaced".to_string()))
            .unwrap();

        let answer = registry.invoke(Some("echo"), &CompletionRequest::new("q")).await.unwrap();
        assert_eq!(answer.response, "replaced");
    }

    #[tokio::test]
    async fn test_unknown_provider() {
        let registry = echo_registry();

        let error = registry
            .invoke(Some("missing"), &CompletionRequest::new("q"))
            .await
            .unwrap_err();
        assert!(matches!(error, DomainError::ProviderNotFound { ref name } if name == "missing"));

        assert!(registry.unregister("missing").is_err());
        assert!(registry.set_default("missing").is_err());
    }

    #[tokio::test]
    async fn test_empty_registry_has_no_default() {
        let registry = ProviderRegistry::new();

        let error = registry.invoke(None, &CompletionRequest::new("q")).await.unwrap_err();
        assert!(matches!(error, DomainError::ProviderNotFound { .. }));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_set_default_routes_unnamed_queries() {
        let registry = echo_registry();
        registry
            .register_chat_model(
                "openai",
                Arc::new(MockChatModel::new("openai").with_reply("from chat")),
                "gpt-3.5-turbo",
                Some(0.7),
            )
            .unwrap();
        registry.set_default("openai").unwrap();

        let answer = registry.invoke(None, &CompletionRequest::new("q")).await.unwrap();
        assert_eq!(answer.response, "from chat");
        assert_eq!(answer.provider_label, "Mock (gpt-3.5-turbo)");
    }

    #[tokio::test]
    async fn test_any_completion_provider_can_be_registered() {
        let mut provider = MockCompletionProvider::new();
        provider
            .expect_complete()
            .times(1)
            .returning(|request| Ok(format!("ctx={}", request.context().unwrap_or("none"))));

        let registry = ProviderRegistry::new();
        registry
            .register(
                ProviderDescriptor::new("remote", ProviderKind::RemoteEndpoint, "Custom", "svc"),
                Arc::new(provider),
            )
            .unwrap();

        let answer = registry
            .invoke(Some("remote"), &CompletionRequest::new("q").with_context("docs"))
            .await
            .unwrap();
        assert_eq!(answer.response, "ctx=docs");
        assert_eq!(registry.describe()[0].kind, ProviderKind::RemoteEndpoint);
    }

    #[test]
    fn test_blank_name_rejected() {
        let registry = ProviderRegistry::new();
        let error = registry
            .register_function("  ", "v", |_, _| Ok(String::new()))
            .unwrap_err();
        assert!(matches!(error, DomainError::Validation { .. }));
    }
}
