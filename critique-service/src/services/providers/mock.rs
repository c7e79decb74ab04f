//! Scripted provider for tests.

use super::{ProviderError, VisionProvider};
use crate::models::{GenerateContentRequest, GenerateContentResponse};
use async_trait::async_trait;
use std::sync::Mutex;

/// What the mock answers with.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    Respond(GenerateContentResponse),
    NoResult,
    Fail(String),
}

/// Mock vision provider that records every request it receives.
pub struct MockVisionProvider {
    behavior: MockBehavior,
    requests: Mutex<Vec<GenerateContentRequest>>,
}

impl MockVisionProvider {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn responding_with(text: &str) -> Self {
        Self::new(MockBehavior::Respond(GenerateContentResponse::from_text(text)))
    }

    pub fn without_result() -> Self {
        Self::new(MockBehavior::NoResult)
    }

    pub fn failing(message: &str) -> Self {
        Self::new(MockBehavior::Fail(message.to_string()))
    }

    pub fn call_count(&self) -> usize {
        self.requests().len()
    }

    pub fn requests(&self) -> Vec<GenerateContentRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl VisionProvider for MockVisionProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-vision"
    }

    async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<Option<GenerateContentResponse>, ProviderError> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.clone());

        match &self.behavior {
            MockBehavior::Respond(response) => Ok(Some(response.clone())),
            MockBehavior::NoResult => Ok(None),
            MockBehavior::Fail(message) => Err(ProviderError::NetworkError(message.clone())),
        }
    }
}
