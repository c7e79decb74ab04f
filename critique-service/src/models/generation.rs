//! Wire types for the Gemini `generateContent` call.
//!
//! Field names follow the REST API (camelCase). Requests and responses both
//! derive `Serialize` and `Deserialize` so test doubles can inspect what was
//! sent and replay canned answers.

use crate::services::providers::ProviderError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// One piece of content: either text or inline binary data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn inline_data(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    /// Base64, standard alphabet with padding.
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: HarmBlockThreshold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HarmCategory {
    #[serde(rename = "HARM_CATEGORY_HARASSMENT")]
    Harassment,
    #[serde(rename = "HARM_CATEGORY_HATE_SPEECH")]
    HateSpeech,
    #[serde(rename = "HARM_CATEGORY_SEXUALLY_EXPLICIT")]
    SexuallyExplicit,
    #[serde(rename = "HARM_CATEGORY_DANGEROUS_CONTENT")]
    DangerousContent,
}

impl HarmCategory {
    pub const ALL: [HarmCategory; 4] = [
        HarmCategory::Harassment,
        HarmCategory::HateSpeech,
        HarmCategory::SexuallyExplicit,
        HarmCategory::DangerousContent,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    BlockLowAndAbove,
    BlockMediumAndAbove,
    BlockOnlyHigh,
    BlockNone,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<PromptFeedback>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    pub prompt_token_count: Option<i32>,
    pub candidates_token_count: Option<i32>,
    pub total_token_count: Option<i32>,
}

/// Finish reasons that mean the candidate's content was withheld.
const BLOCKING_FINISH_REASONS: [&str; 2] = ["SAFETY", "RECITATION"];

impl GenerateContentResponse {
    /// Build a single-candidate response carrying `text`.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            candidates: vec![Candidate {
                content: Some(Content {
                    role: Some("model".to_string()),
                    parts: vec![Part::text(text)],
                }),
                finish_reason: Some("STOP".to_string()),
            }],
            prompt_feedback: None,
            usage_metadata: None,
        }
    }

    /// Text of the first candidate, its text parts joined in order.
    ///
    /// Fails when that candidate was stopped for a blocking reason, or when
    /// there is no candidate because the prompt itself was blocked. A
    /// response with neither candidates nor feedback yields an empty string.
    pub fn text(&self) -> Result<String, ProviderError> {
        match self.candidates.first() {
            Some(candidate) => {
                if let Some(reason) = candidate
                    .finish_reason
                    .as_deref()
                    .filter(|r| BLOCKING_FINISH_REASONS.contains(r))
                {
                    return Err(ProviderError::ContentFiltered(format!(
                        "candidate finished with {}",
                        reason
                    )));
                }

                Ok(candidate
                    .content
                    .iter()
                    .flat_map(|content| content.parts.iter())
                    .filter_map(|part| part.text.as_deref())
                    .collect())
            }
            None => match &self.prompt_feedback {
                Some(feedback) => Err(ProviderError::ContentFiltered(format!(
                    "prompt blocked: {}",
                    feedback.block_reason.as_deref().unwrap_or("unspecified")
                ))),
                None => Ok(String::new()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_joins_parts_of_first_candidate() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                {
                    "content": {
                        "role": "model",
                        "parts": [{"text": "Lift shadows, "}, {"text": "cool the white balance."}]
                    },
                    "finishReason": "STOP"
                },
                {
                    "content": {"role": "model", "parts": [{"text": "ignored"}]}
                }
            ],
            "usageMetadata": {"promptTokenCount": 270, "candidatesTokenCount": 9, "totalTokenCount": 279}
        }))
        .unwrap();

        assert_eq!(
            response.text().unwrap(),
            "Lift shadows, cool the white balance."
        );
    }

    #[test]
    fn text_fails_for_safety_stop() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"finishReason": "SAFETY"}]
        }))
        .unwrap();

        assert!(matches!(
            response.text(),
            Err(ProviderError::ContentFiltered(_))
        ));
    }

    #[test]
    fn text_fails_when_prompt_blocked() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "OTHER"}
        }))
        .unwrap();

        let err = response.text().unwrap_err();
        assert!(err.to_string().contains("OTHER"));
    }

    #[test]
    fn text_is_empty_without_candidates_or_feedback() {
        assert_eq!(GenerateContentResponse::default().text().unwrap(), "");
    }

    #[test]
    fn parts_serialize_in_camel_case() {
        let value = serde_json::to_value(Part::inline_data("image/jpeg", "AAEC")).unwrap();
        assert_eq!(value, json!({"inlineData": {"mimeType": "image/jpeg", "data": "AAEC"}}));
    }

    #[test]
    fn safety_setting_uses_api_names() {
        let value = serde_json::to_value(SafetySetting {
            category: HarmCategory::DangerousContent,
            threshold: HarmBlockThreshold::BlockNone,
        })
        .unwrap();
        assert_eq!(
            value,
            json!({"category": "HARM_CATEGORY_DANGEROUS_CONTENT", "threshold": "BLOCK_NONE"})
        );
    }
}
