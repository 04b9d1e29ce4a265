use async_trait::async_trait;
use std::fmt::Debug;

use super::{LlmRequest, LlmResponse};
use crate::domain::DomainError;

/// Chat-completions adapter for a hosted model family (OpenAI, Gemini, ...)
#[async_trait]
pub trait ChatModel: Send + Sync + Debug {
    /// Send a chat completion request
    async fn chat(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError>;

    fn provider_name(&self) -> &'static str;

    /// Vendor name shown in provider descriptors
    fn vendor(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::domain::llm::Message;
    use std::sync::Mutex;

    #[derive(Debug)]
    pub struct MockChatModel {
        name: &'static str,
        reply: Option<String>,
        error: Option<String>,
        requests: Mutex<Vec<(String, LlmRequest)>>,
    }

    impl MockChatModel {
        pub fn new(name: &'static str) -> Self {
            Self {
                name,
                reply: None,
                error: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn with_reply(mut self, reply: impl Into<String>) -> Self {
            self.reply = Some(reply.into());
            self
        }

        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.error = Some(error.into());
            self
        }

        /// Requests received so far, with the model they targeted
        pub fn requests(&self) -> Vec<(String, LlmRequest)> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatModel for MockChatModel {
        async fn chat(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError> {
            self.requests
                .lock()
                .unwrap()
                .push((model.to_string(), request));

            if let Some(ref error) = self.error {
                return Err(DomainError::provider(self.name, error));
            }

            let reply = self
                .reply
                .clone()
                .ok_or_else(|| DomainError::provider(self.name, "No mock reply configured"))?;

            Ok(LlmResponse::new("mock-id", model, Message::assistant(reply)))
        }

        fn provider_name(&self) -> &'static str {
            self.name
        }

        fn vendor(&self) -> &'static str {
            "Mock"
        }
    }
}
