//! The single capability every registered provider exposes

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(test)]
use mockall::automock;

use crate::domain::DomainError;

/// Query plus optional grounding context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub query: String,
    pub context: Option<String>,
}

impl CompletionRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }
}

/// Produces a text completion; implemented once per provider kind
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, DomainError>;
}

/// How a provider is invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    WrappedInstance,
    RemoteEndpoint,
    CustomFunction,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderKind::WrappedInstance => "wrapped-instance",
            ProviderKind::RemoteEndpoint => "remote-endpoint",
            ProviderKind::CustomFunction => "custom-function",
        };
        f.write_str(name)
    }
}

/// Public description of a registered provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    pub name: String,
    pub kind: ProviderKind,
    /// Vendor shown to humans, e.g. `OpenAI` or `Custom`
    pub family: String,
    pub model_label: String,
}

impl ProviderDescriptor {
    pub fn new(
        name: impl Into<String>,
        kind: ProviderKind,
        family: impl Into<String>,
        model_label: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            family: family.into(),
            model_label: model_label.into(),
        }
    }

    /// Human-readable label, e.g. `OpenAI (gpt-3.5-turbo)`
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.family, self.model_label)
    }
}
