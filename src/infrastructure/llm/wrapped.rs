use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::llm::prompt::chat_request;
use crate::domain::{ChatModel, CompletionProvider, CompletionRequest, DomainError};

/// Completion provider backed by an already-constructed [`ChatModel`]
#[derive(Debug, Clone)]
pub struct WrappedChatProvider {
    chat_model: Arc<dyn ChatModel>,
    model: String,
    temperature: Option<f32>,
}

impl WrappedChatProvider {
    pub fn new(chat_model: Arc<dyn ChatModel>, model: impl Into<String>) -> Self {
        Self {
            chat_model,
            model: model.into(),
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn vendor(&self) -> &'static str {
        self.chat_model.vendor()
    }
}

#[async_trait]
impl CompletionProvider for WrappedChatProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, DomainError> {
        let chat = chat_request(&request.query, request.context(), self.temperature);
        let response = self.chat_model.chat(&self.model, chat).await?;

        Ok(response.content().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm::MockChatModel;
    use crate::domain::MessageRole;

    #[tokio::test]
    async fn test_wrapped_provider_sends_context_as_system_message() {
        let chat_model = Arc::new(MockChatModel::new("openai").with_reply("Python is a language."));
        let provider = WrappedChatProvider::new(chat_model.clone(), "gpt-3.5-turbo").with_temperature(0.7);

        let answer = provider
            .complete(&CompletionRequest::new("What is Python?").with_context("Document 1 ..."))
            .await
            .unwrap();

        assert_eq!(answer, "Python is a language.");

        let (model, request) = chat_model.requests().remove(0);
        assert_eq!(model, "gpt-3.5-turbo");
        assert_eq!(request.messages[0].role, MessageRole::System);
        assert_eq!(request.messages[1].content, "What is Python?");
        assert_eq!(request.temperature, Some(0.7));
    }

    #[tokio::test]
    async fn test_wrapped_provider_propagates_errors() {
        let chat_model = Arc::new(MockChatModel::new("openai").with_error("quota exceeded"));
        let provider = WrappedChatProvider::new(chat_model, "gpt-3.5-turbo");

        let error = provider
            .complete(&CompletionRequest::new("q"))
            .await
            .unwrap_err();

        assert!(matches!(error, DomainError::Provider { .. }));
    }
}
