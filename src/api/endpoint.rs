use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Backend endpoints consumed by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    ValidateText,
    GenerateText,
    ValidateAudio,
}

impl Endpoint {
    /// Path relative to the backend base URL
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::ValidateText => "/message/validate-process-text",
            Endpoint::GenerateText => "/message/generate-text",
            Endpoint::ValidateAudio => "/message/validate-process-audio",
        }
    }

    /// User-facing text when this endpoint exceeds its budget
    pub fn timeout_message(&self) -> &'static str {
        match self {
            Endpoint::ValidateText => {
                "La validación del mensaje tardó demasiado. Por favor, intenta de nuevo."
            }
            Endpoint::GenerateText => {
                "La respuesta tardó demasiado en generarse. Por favor, intenta de nuevo."
            }
            Endpoint::ValidateAudio => {
                "El procesamiento del audio tardó demasiado. Por favor, intenta de nuevo."
            }
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Endpoint::ValidateText => "validate-process-text",
            Endpoint::GenerateText => "generate-text",
            Endpoint::ValidateAudio => "validate-process-audio",
        };
        f.write_str(name)
    }
}

/// Per-endpoint wait bounds
///
/// Audio validation gets the longest budget because the backend transcribes
/// before answering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutBudgets {
    pub validate_text_ms: u64,
    pub generate_text_ms: u64,
    pub validate_audio_ms: u64,
}

impl Default for TimeoutBudgets {
    fn default() -> Self {
        Self {
            validate_text_ms: 10_000,
            generate_text_ms: 15_000,
            validate_audio_ms: 20_000,
        }
    }
}

impl TimeoutBudgets {
    pub fn for_endpoint(&self, endpoint: Endpoint) -> Duration {
        let ms = match endpoint {
            Endpoint::ValidateText => self.validate_text_ms,
            Endpoint::GenerateText => self.generate_text_ms,
            Endpoint::ValidateAudio => self.validate_audio_ms,
        };
        Duration::from_millis(ms)
    }
}
