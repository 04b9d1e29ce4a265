use std::time::Duration;

use async_trait::async_trait;

use crate::domain::DomainError;

/// Trait for HTTP client operations (for mocking)
#[async_trait]
pub trait HttpClientTrait: Send + Sync + std::fmt::Debug {
    /// POSTs a JSON body and decodes the JSON response.
    ///
    /// Errors are attributed to the `http` provider; callers relabel them with
    /// [`attribute_to`].
    async fn post_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, DomainError>;
}

/// Real HTTP client using reqwest
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                DomainError::configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

fn request_error(error: reqwest::Error) -> DomainError {
    if error.is_timeout() {
        DomainError::timeout("http", format!("Request timed out: {}", error))
    } else {
        DomainError::provider("http", format!("Request failed: {}", error))
    }
}

#[async_trait]
impl HttpClientTrait for HttpClient {
    async fn post_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, DomainError> {
        let mut request = self.client.post(url);

        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = request.json(body).send().await.map_err(request_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            return Err(DomainError::provider(
                "http",
                format!("HTTP {}: {}", status, error_body),
            ));
        }

        response.json().await.map_err(|e| {
            if e.is_timeout() {
                request_error(e)
            } else {
                DomainError::provider("http", format!("Failed to parse response: {}", e))
            }
        })
    }
}

/// Re-attributes transport errors to the provider that issued the request
pub fn attribute_to(provider: &str, error: DomainError) -> DomainError {
    match error {
        DomainError::Provider { message, .. } => DomainError::provider(provider, message),
        DomainError::Timeout { message, .. } => DomainError::timeout(provider, message),
        other => other,
    }
}
