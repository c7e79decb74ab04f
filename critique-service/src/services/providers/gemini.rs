//! Gemini provider implementation.
//!
//! Calls `models/{model}:generateContent` on the Generative Language REST API.

use super::{ProviderError, VisionProvider};
use crate::models::{GenerateContentRequest, GenerateContentResponse};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use std::time::Duration;

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Secret<String>,
    pub model: String,
    /// Base URL without trailing slash, e.g. `https://generativelanguage.googleapis.com/v1beta`.
    pub api_base: String,
    /// Whole-request timeout; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

/// Gemini vision provider.
pub struct GeminiVisionProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiVisionProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ProviderError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Build the API URL for the given method. The key is sent as a query
    /// parameter and never appears here, so the URL is safe to log.
    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.config.api_base, self.config.model, method
        )
    }
}

#[async_trait]
impl VisionProvider for GeminiVisionProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<Option<GenerateContentResponse>, ProviderError> {
        let url = self.api_url("generateContent");

        tracing::debug!(
            model = %self.config.model,
            url = %url,
            parts = request.contents.iter().map(|c| c.parts.len()).sum::<usize>(),
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.config.api_key.expose_secret().as_str())])
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(
                        status = status.as_u16(),
                        error = %e.without_url(),
                        "Failed to read Gemini error body"
                    );
                    String::new()
                }
            };

            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(ProviderError::RateLimited);
            }

            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ProviderError::NetworkError(e.without_url().to_string()))?;

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        // A literal `null` body decodes to `None`.
        serde_json::from_slice::<Option<GenerateContentResponse>>(&body)
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}
