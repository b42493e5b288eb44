//! Error taxonomy for the chat client
//!
//! Every failure the orchestrator can observe maps onto one of these variants.
//! All of them except `CaptureError::PermissionDenied` (and the start-time
//! capture failures) end up as a single `error` message in the transcript.

use thiserror::Error;

use crate::api::Endpoint;

/// Shown when a text send fails below the protocol level.
pub const TEXT_SEND_FAILED: &str = "Error al enviar el mensaje. Por favor, intenta de nuevo.";

/// Shown when a voice send fails below the protocol level.
pub const AUDIO_SEND_FAILED: &str = "Error al procesar el audio. Por favor, intenta de nuevo.";

/// Shown when the microphone cannot be opened.
pub const MICROPHONE_DENIED: &str =
    "No se pudo acceder al micrófono. Por favor, verifica los permisos.";

/// Shown when a recording produced no audio.
pub const NO_AUDIO_CAPTURED: &str = "No se grabó ningún audio. Por favor, intenta de nuevo.";

/// Shown when the device supports none of the encodings the backend accepts.
pub const NO_SUPPORTED_ENCODING: &str =
    "El dispositivo de audio no admite ningún formato compatible.";

/// Shown when an action is attempted while a send is in flight.
pub const SEND_IN_PROGRESS: &str = "Espera a que termine el mensaje anterior.";

/// Failure of a single timed request
#[derive(Debug, Clone, Error)]
pub enum RequestError {
    /// No response arrived inside the endpoint's budget
    #[error("{endpoint} timed out after {timeout_ms}ms")]
    Timeout {
        endpoint: Endpoint,
        timeout_ms: u64,
        message: String,
    },

    /// Backend answered with a non-2xx status
    #[error("{endpoint} returned HTTP {status}")]
    HttpStatus { endpoint: Endpoint, status: u16 },

    /// Connection, TLS or body transfer failure
    #[error("{endpoint} transport failure: {reason}")]
    Transport { endpoint: Endpoint, reason: String },

    /// 2xx response whose body did not match the expected shape
    #[error("{endpoint} returned an unexpected body: {reason}")]
    Decode { endpoint: Endpoint, reason: String },
}

impl RequestError {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            RequestError::Timeout { endpoint, .. }
            | RequestError::HttpStatus { endpoint, .. }
            | RequestError::Transport { endpoint, .. }
            | RequestError::Decode { endpoint, .. } => *endpoint,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, RequestError::Timeout { .. })
    }
}

/// Failure of a capture session
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CaptureError {
    /// The device refused access (permission or missing hardware)
    #[error("audio device access denied: {0}")]
    PermissionDenied(String),

    /// None of the preferred encodings is supported by the device
    #[error("no supported audio encoding")]
    NoSupportedEncoding,

    /// Recording finished with zero bytes of audio
    #[error("no audio captured")]
    EmptyCapture,

    /// Device failed after it was opened
    #[error("audio device error: {0}")]
    Device(String),

    #[error("not recording")]
    NotRecording,

    #[error("already recording")]
    AlreadyRecording,
}

/// Any failure surfaced by the conversation orchestrator
#[derive(Debug, Clone, Error)]
pub enum ChatError {
    /// Another send is in flight
    #[error("a send is already in progress")]
    Busy,

    /// Backend answered `success: false` with a reason
    #[error("rejected by backend: {0}")]
    StructuralRejection(String),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Capture(#[from] CaptureError),
}

/// Which orchestrated path a failure happened on; picks the generic text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendPath {
    Text,
    Voice,
}

impl ChatError {
    /// Localized text for the transcript (or alert, for start failures)
    pub fn user_message(&self, path: SendPath) -> String {
        match self {
            ChatError::Busy => SEND_IN_PROGRESS.to_string(),
            ChatError::StructuralRejection(reason) => format!("Error: {}", reason),
            ChatError::Request(RequestError::Timeout { message, .. }) => message.clone(),
            ChatError::Request(_) => match path {
                SendPath::Text => TEXT_SEND_FAILED.to_string(),
                SendPath::Voice => AUDIO_SEND_FAILED.to_string(),
            },
            ChatError::Capture(CaptureError::PermissionDenied(_)) => MICROPHONE_DENIED.to_string(),
            ChatError::Capture(CaptureError::EmptyCapture) => NO_AUDIO_CAPTURED.to_string(),
            ChatError::Capture(CaptureError::NoSupportedEncoding) => {
                NO_SUPPORTED_ENCODING.to_string()
            }
            ChatError::Capture(_) => AUDIO_SEND_FAILED.to_string(),
        }
    }
}
