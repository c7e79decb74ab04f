pub mod generation;
pub mod upload;

pub use generation::{
    Candidate, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    HarmBlockThreshold, HarmCategory, InlineData, Part, SafetySetting,
};
pub use upload::UploadedImage;
