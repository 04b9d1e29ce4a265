//! Text-in/text-out provider reached over HTTP POST

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::http_client::{attribute_to, HttpClientTrait};
use crate::domain::llm::prompt::text_prompt;
use crate::domain::{CompletionProvider, CompletionRequest, DomainError};

const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Posts `{prompt, temperature, ..extra}` to an endpoint and extracts the answer text
#[derive(Debug)]
pub struct RemoteEndpointProvider<C: HttpClientTrait> {
    client: C,
    name: String,
    endpoint: String,
    auth_header: Option<String>,
    headers: Vec<(String, String)>,
    temperature: f32,
    extra: Map<String, Value>,
}

impl<C: HttpClientTrait> RemoteEndpointProvider<C> {
    pub fn new(client: C, name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            name: name.into(),
            endpoint: endpoint.into(),
            auth_header: None,
            headers: Vec::new(),
            temperature: DEFAULT_TEMPERATURE,
            extra: Map::new(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.auth_header = Some(format!("Bearer {}", api_key.into()));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Extra body fields; they override `prompt` and `temperature` on collision
    pub fn with_extra(mut self, extra: Map<String, Value>) -> Self {
        self.extra = extra;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_body(&self, request: &CompletionRequest) -> Value {
        let mut body = Map::new();
        body.insert(
            "prompt".to_string(),
            Value::String(text_prompt(&request.query, request.context())),
        );
        body.insert("temperature".to_string(), serde_json::json!(self.temperature));
        for (key, value) in &self.extra {
            body.insert(key.clone(), value.clone());
        }

        Value::Object(body)
    }
}

#[async_trait]
impl<C: HttpClientTrait> CompletionProvider for RemoteEndpointProvider<C> {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, DomainError> {
        let body = self.build_body(request);

        let mut headers: Vec<(&str, &str)> = vec![("Content-Type", "application/json")];
        if let Some(ref auth) = self.auth_header {
            headers.push(("Authorization", auth.as_str()));
        }
        headers.extend(self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        let response = self
            .client
            .post_json(&self.endpoint, headers, &body)
            .await
            .map_err(|e| attribute_to(&self.name, e))?;

        Ok(extract_text(response))
    }
}

/// Pulls the answer out of the common response shapes, falling back to the raw JSON
pub fn extract_text(response: Value) -> String {
    fn render(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    let map = match response {
        Value::String(text) => return text,
        Value::Object(map) => map,
        other => return other.to_string(),
    };

    for key in ["response", "text", "output"] {
        if let Some(value) = map.get(key) {
            return render(value);
        }
    }

    if let Some(choice) = map
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
    {
        if let Some(content) = choice.get("message").and_then(|m| m.get("content")) {
            return render(content);
        }
        if let Some(text) = choice.get("text") {
            return render(text);
        }
    }

    Value::Object(map).to_string()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::infrastructure::llm::HttpClient;

    #[test]
    fn test_extract_text_shapes() {
        assert_eq!(extract_text(json!("plain")), "plain");
        assert_eq!(extract_text(json!({"response": "r"})), "r");
        assert_eq!(extract_text(json!({"text": "t", "output": "o"})), "t");
        assert_eq!(extract_text(json!({"output": "o"})), "o");
        assert_eq!(
            extract_text(json!({"choices": [{"message": {"content": "c"}}]})),
            "c"
        );
        assert_eq!(extract_text(json!({"choices": [{"text": "ct"}]})), "ct");
        assert_eq!(extract_text(json!({"answer": 42})), "{\"answer\":42}");
        assert_eq!(extract_text(json!({"choices": []})), "{\"choices\":[]}");
    }

    #[test]
    fn test_body_with_context_and_extra() {
        let mut extra = Map::new();
        extra.insert("max_tokens".to_string(), json!(64));
        let provider = RemoteEndpointProvider::new(HttpClient::new(), "mine", "http://x")
            .with_temperature(0.2)
            .with_extra(extra);

        let body = provider.build_body(&CompletionRequest::new("q").with_context("ctx"));

        assert_eq!(body["prompt"], "Context:\nctx\n\nQuestion: q\n\nAnswer:");
        assert_eq!(body["max_tokens"], 64);
        assert!((body["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_posts_prompt_with_bearer_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate"))
            .and(header("authorization", "Bearer secret"))
            .and(body_partial_json(json!({"prompt": "What is Python?"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "A language."})))
            .expect(1)
            .mount(&server)
            .await;

        let provider = RemoteEndpointProvider::new(
            HttpClient::new(),
            "mine",
            format!("{}/generate", server.uri()),
        )
        .with_api_key("secret");

        let answer = provider.complete(&CompletionRequest::new("What is Python?")).await;
        assert_eq!(assert_ok!(answer), "A language.");
    }

    #[tokio::test]
    async fn test_http_error_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let provider = RemoteEndpointProvider::new(HttpClient::new(), "mine", server.uri());

        let error = assert_err!(provider.complete(&CompletionRequest::new("q")).await);
        assert!(matches!(error, DomainError::Provider { ref provider, .. } if provider == "mine"));
    }

    #[tokio::test]
    async fn test_slow_endpoint_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"text": "late"}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = HttpClient::with_timeout(Duration::from_millis(50)).unwrap();
        let provider = RemoteEndpointProvider::new(client, "slow", server.uri());

        let error = assert_err!(provider.complete(&CompletionRequest::new("q")).await);
        assert!(matches!(error, DomainError::Timeout { ref provider, .. } if provider == "slow"));
    }
}
