use super::state::StubState;
use crate::api::messages::{
    GenerateTextRequest, GenerateTextResponse, ValidateAudioResponse, ValidateTextRequest,
    ValidateTextResponse, AUDIO_FIELD,
};
use crate::audio::{wav, AudioEncoding};
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use std::sync::atomic::Ordering;
use tracing::{info, warn};

/// Longest text the stub accepts
pub const MAX_TEXT_CHARS: usize = 2000;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

async fn apply_delay(state: &StubState) {
    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }
}

fn rejected_text(message: &str) -> Json<ValidateTextResponse> {
    Json(ValidateTextResponse {
        success: false,
        validate_text: None,
        message: Some(message.to_string()),
    })
}

fn rejected_audio(message: &str) -> Json<ValidateAudioResponse> {
    Json(ValidateAudioResponse {
        success: false,
        transcribed_text: None,
        simplified_text: None,
        message: Some(message.to_string()),
    })
}

/// Collapse runs of whitespace into single spaces
fn simplify(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// POST /message/validate-process-text
pub async fn validate_text(
    State(state): State<StubState>,
    Json(req): Json<ValidateTextRequest>,
) -> impl IntoResponse {
    state.counters.validate_text.fetch_add(1, Ordering::SeqCst);
    apply_delay(&state).await;

    let text = simplify(&req.text);
    if text.is_empty() {
        return rejected_text("El texto no puede estar vacío");
    }
    if text.chars().count() > MAX_TEXT_CHARS {
        return rejected_text("El texto es demasiado largo");
    }

    info!("Validated text ({} chars)", text.chars().count());

    Json(ValidateTextResponse {
        success: true,
        validate_text: Some(text),
        message: None,
    })
}

/// POST /message/generate-text
pub async fn generate_text(
    State(state): State<StubState>,
    Json(req): Json<GenerateTextRequest>,
) -> impl IntoResponse {
    state.counters.generate_text.fetch_add(1, Ordering::SeqCst);
    apply_delay(&state).await;

    Json(GenerateTextResponse {
        generated_text: serde_json::Value::String(format!("Recibí tu mensaje: {}", req.prompt)),
    })
}

/// POST /message/validate-process-audio
pub async fn validate_audio(
    State(state): State<StubState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    state.counters.validate_audio.fetch_add(1, Ordering::SeqCst);
    apply_delay(&state).await;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("Malformed multipart body: {}", e);
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        detail: format!("Malformed multipart body: {}", e),
                    }),
                )
                    .into_response();
            }
        };

        if field.name() != Some(AUDIO_FIELD) {
            continue;
        }

        let encoding = field
            .file_name()
            .and_then(|name| name.rsplit_once('.'))
            .and_then(|(_, ext)| AudioEncoding::from_extension(ext));
        let Some(encoding) = encoding else {
            return rejected_audio("Formato de audio no soportado").into_response();
        };

        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        detail: format!("Failed to read audio: {}", e),
                    }),
                )
                    .into_response();
            }
        };

        if bytes.is_empty() {
            return rejected_audio("El archivo de audio está vacío").into_response();
        }

        // No speech recognition here: describe what arrived instead
        let transcribed = match encoding {
            AudioEncoding::Wav => match wav::inspect_wav(&bytes) {
                Ok(info) => format!("Audio de {:.1} segundos", info.duration_seconds),
                Err(_) => return rejected_audio("Archivo WAV inválido").into_response(),
            },
            other => format!("Audio {} de {} bytes", other.extension(), bytes.len()),
        };

        info!("Accepted {} audio ({} bytes)", encoding, bytes.len());

        return Json(ValidateAudioResponse {
            success: true,
            simplified_text: Some(simplify(&transcribed).to_lowercase()),
            transcribed_text: Some(transcribed),
            message: None,
        })
        .into_response();
    }

    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ErrorResponse {
            detail: format!("Missing form field `{}`", AUDIO_FIELD),
        }),
    )
        .into_response()
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
