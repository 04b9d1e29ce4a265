//! Google Gemini `generateContent` adapter

use async_trait::async_trait;
use serde_json::{json, Value};

use super::http_client::{attribute_to, HttpClientTrait};
use crate::domain::llm::Usage;
use crate::domain::{ChatModel, DomainError, LlmRequest, LlmResponse, Message, MessageRole};

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug)]
pub struct GeminiChatModel<C: HttpClientTrait> {
    client: C,
    api_key: String,
    base_url: String,
}

impl<C: HttpClientTrait> GeminiChatModel<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_GEMINI_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn generate_url(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    fn build_request(&self, request: &LlmRequest) -> Value {
        // System messages travel separately as the system instruction
        let contents: Vec<Value> = request
            .messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(|m| {
                let role = match m.role {
                    MessageRole::Assistant => "model",
                    _ => "user",
                };
                json!({ "role": role, "parts": [{ "text": m.content }] })
            })
            .collect();

        let mut body = json!({ "contents": contents });

        if let Some(system) = request.system_text() {
            body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
        }

        let mut generation_config = json!({});
        if let Some(temperature) = request.temperature {
            generation_config["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = request.max_tokens {
            generation_config["maxOutputTokens"] = json!(max_tokens);
        }
        if generation_config.as_object().is_some_and(|o| !o.is_empty()) {
            body["generationConfig"] = generation_config;
        }

        body
    }

    fn parse_response(&self, model: &str, body: Value) -> Result<LlmResponse, DomainError> {
        let parts = body["candidates"][0]["content"]["parts"]
            .as_array()
            .ok_or_else(|| DomainError::provider("gemini", "No candidates in response"))?;

        let text: String = parts
            .iter()
            .filter_map(|part| part["text"].as_str())
            .collect();

        let id = body["responseId"].as_str().unwrap_or_default().to_string();
        let mut response = LlmResponse::new(id, model, Message::assistant(text));

        let usage = &body["usageMetadata"];
        if !usage.is_null() {
            response = response.with_usage(Usage::new(
                usage["promptTokenCount"].as_u64().unwrap_or(0) as u32,
                usage["candidatesTokenCount"].as_u64().unwrap_or(0) as u32,
            ));
        }

        Ok(response)
    }
}

#[async_trait]
impl<C: HttpClientTrait> ChatModel for GeminiChatModel<C> {
    async fn chat(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError> {
        let url = self.generate_url(model);
        let body = self.build_request(&request);
        let headers = vec![
            ("x-goog-api-key", self.api_key.as_str()),
            ("Content-Type", "application/json"),
        ];

        let response = self
            .client
            .post_json(&url, headers, &body)
            .await
            .map_err(|e| attribute_to("gemini", e))?;

        self.parse_response(model, response)
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }

    fn vendor(&self) -> &'static str {
        "Google Gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm::prompt::chat_request;
    use crate::infrastructure::llm::http_client::mock::MockHttpClient;

    const TEST_URL: &str =
        "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent";

    #[tokio::test]
    async fn test_gemini_chat() {
        let client = MockHttpClient::new().with_response(
            TEST_URL,
            json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": "Python is " }, { "text": "a language." }] }
                }],
                "usageMetadata": { "promptTokenCount": 4, "candidatesTokenCount": 6, "totalTokenCount": 10 }
            }),
        );
        let model = GeminiChatModel::new(client, "key");

        let response = model
            .chat("gemini-pro", chat_request("What is Python?", None, Some(0.7)))
            .await
            .unwrap();

        assert_eq!(response.content(), "Python is a language.");
        assert_eq!(response.usage.unwrap().completion_tokens, 6);
    }

    #[tokio::test]
    async fn test_gemini_moves_context_to_system_instruction() {
        let client = MockHttpClient::new().with_response(
            TEST_URL,
            json!({ "candidates": [{ "content": { "parts": [{ "text": "ok" }] } }] }),
        );
        let model = GeminiChatModel::new(client, "key");

        model
            .chat("gemini-pro", chat_request("q", Some("ctx"), Some(0.2)))
            .await
            .unwrap();

        let body = &model.client.requests()[0].1;
        assert_eq!(body["contents"].as_array().unwrap().len(), 1);
        assert_eq!(body["contents"][0]["parts"][0]["text"], "q");
        assert!(body["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .ends_with("ctx"));
        assert!(body["generationConfig"]["temperature"].is_number());
    }

    #[tokio::test]
    async fn test_gemini_without_candidates_fails() {
        let client = MockHttpClient::new().with_response(TEST_URL, json!({ "candidates": [] }));
        let model = GeminiChatModel::new(client, "key");

        let error = model
            .chat("gemini-pro", chat_request("q", None, None))
            .await
            .unwrap_err();

        assert!(matches!(error, DomainError::Provider { ref provider, .. } if provider == "gemini"));
    }
}
