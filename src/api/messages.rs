use serde::{Deserialize, Serialize};

/// Body of `validate-process-text`
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateTextRequest {
    pub text: String,
}

/// Reply of `validate-process-text`
///
/// The backend uses one object for both outcomes and discriminates on `success`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateTextResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body of `generate-text`
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateTextRequest {
    pub prompt: String,
}

/// Reply of `generate-text`
///
/// `generated_text` is usually a string, but some models answer with a JSON
/// document directly.
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateTextResponse {
    pub generated_text: serde_json::Value,
}

/// Reply of `validate-process-audio`
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateAudioResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcribed_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simplified_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Multipart field carrying the recording
pub const AUDIO_FIELD: &str = "audio_file";

/// Outcome of a validation call that reached the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation<T> {
    Accepted(T),
    Rejected(String),
}

/// Accepted audio validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcription {
    /// What the user said
    pub transcribed: String,
    /// Cleaned-up prompt for generation
    pub simplified: String,
}
