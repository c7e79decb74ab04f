//! The fixed critique request sent for every uploaded photo.

use crate::models::{
    Content, GenerateContentRequest, GenerationConfig, HarmBlockThreshold, HarmCategory, Part,
    SafetySetting, UploadedImage,
};
use base64::{engine::general_purpose::STANDARD, Engine};

/// Instruction sent ahead of the photo: act as a professional photographer
/// and explain, step by step, every Camera Raw / Photoshop / Lightroom
/// adjustment (tone, colour, ...) the user should make themselves.
pub const CRITIQUE_PROMPT: &str = "你是一位职业摄影师，能够根据用户传的照片，判断图片的后期修改方向，比如色调、影调等所有 camera raw、photoshop 或者 lightroom 中能够调整的参数细节都回答给用户, 尽量的详细，step by step 的回答，让用户能够根据你的回答，自己去操作";

/// Label attached to every upload, whatever the client declared.
pub const IMAGE_MIME_TYPE: &str = "image/jpeg";

pub const TEMPERATURE: f64 = 0.8;
pub const TOP_K: u32 = 32;
pub const TOP_P: f64 = 1.0;
pub const MAX_OUTPUT_TOKENS: u32 = 4096;

pub fn generation_config() -> GenerationConfig {
    GenerationConfig {
        temperature: Some(TEMPERATURE),
        top_k: Some(TOP_K),
        top_p: Some(TOP_P),
        max_output_tokens: Some(MAX_OUTPUT_TOKENS),
    }
}

/// Every harm category, unblocked.
pub fn safety_settings() -> Vec<SafetySetting> {
    HarmCategory::ALL
        .into_iter()
        .map(|category| SafetySetting {
            category,
            threshold: HarmBlockThreshold::BlockNone,
        })
        .collect()
}

/// Build the single-turn request: prompt text, then the photo inline.
pub fn build_request(image: &UploadedImage) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![
                Part::text(CRITIQUE_PROMPT),
                Part::inline_data(IMAGE_MIME_TYPE, STANDARD.encode(&image.data)),
            ],
        }],
        generation_config: Some(generation_config()),
        safety_settings: safety_settings(),
    }
}
