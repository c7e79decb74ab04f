//! Vision model providers.
//!
//! The upload flow only talks to [`VisionProvider`], so the Gemini HTTP
//! client can be swapped for the scripted mock in tests.

pub mod gemini;
pub mod mock;

use crate::models::{GenerateContentRequest, GenerateContentResponse};
use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("API error {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("Rate limited")]
    RateLimited,

    #[error("Content filtered: {0}")]
    ContentFiltered(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::ApiError { .. } => "api_error",
            ProviderError::RateLimited => "rate_limited",
            ProviderError::ContentFiltered(_) => "content_filtered",
            ProviderError::InvalidResponse(_) => "invalid_response",
            ProviderError::NetworkError(_) => "network_error",
        }
    }
}

/// A multimodal model that answers a `generateContent` request.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Provider name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Model identifier requests are sent to.
    fn model(&self) -> &str;

    /// Send one request, with no retry.
    ///
    /// `Ok(None)` means the service answered without a result object, which
    /// callers must keep distinct from an error.
    async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<Option<GenerateContentResponse>, ProviderError>;
}
