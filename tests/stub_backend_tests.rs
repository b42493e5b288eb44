// Integration tests for the local stub backend
//
// Requests are driven through the router directly, without binding a port.

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use std::sync::atomic::Ordering;
use telepatia_chat::audio::wav;
use telepatia_chat::stub::{RequestCounters, MAX_TEXT_CHARS};
use telepatia_chat::{create_router, StubState};
use tower::ServiceExt;

const BOUNDARY: &str = "telepatia-test-boundary";

fn json_request(path: &str, body: serde_json::Value) -> Request<Body> {
    Request::post(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

fn multipart_request(field: &str, file_name: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::post("/message/validate-process-audio")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("valid request")
}

async fn send(state: &StubState, request: Request<Body>) -> Result<(StatusCode, serde_json::Value)> {
    let response = create_router(state.clone()).oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    Ok((status, json))
}

#[tokio::test]
async fn test_health_check() -> Result<()> {
    let response = create_router(StubState::new())
        .oneshot(Request::get("/health").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    assert_eq!(&bytes[..], b"OK");
    Ok(())
}

#[tokio::test]
async fn test_validate_text_collapses_whitespace() -> Result<()> {
    let state = StubState::new();

    let (status, json) = send(
        &state,
        json_request(
            "/message/validate-process-text",
            serde_json::json!({ "text": " hola \n  mundo " }),
        ),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["validate_text"], "hola mundo");
    assert_eq!(RequestCounters::get(&state.counters.validate_text), 1);
    Ok(())
}

#[tokio::test]
async fn test_validate_text_rejects_empty_and_long_input() -> Result<()> {
    let state = StubState::new();

    let (_, empty) = send(
        &state,
        json_request(
            "/message/validate-process-text",
            serde_json::json!({ "text": "   " }),
        ),
    )
    .await?;
    assert_eq!(empty["success"], false);
    assert_eq!(empty["message"], "El texto no puede estar vacío");

    let long = "a".repeat(MAX_TEXT_CHARS + 1);
    let (_, too_long) = send(
        &state,
        json_request(
            "/message/validate-process-text",
            serde_json::json!({ "text": long }),
        ),
    )
    .await?;
    assert_eq!(too_long["success"], false);
    assert_eq!(too_long["message"], "El texto es demasiado largo");

    assert_eq!(state.counters.validate_text.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn test_generate_text_echoes_prompt() -> Result<()> {
    let state = StubState::new();

    let (status, json) = send(
        &state,
        json_request(
            "/message/generate-text",
            serde_json::json!({ "prompt": "¿qué tal?" }),
        ),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["generated_text"], "Recibí tu mensaje: ¿qué tal?");
    assert_eq!(RequestCounters::get(&state.counters.generate_text), 1);
    Ok(())
}

#[tokio::test]
async fn test_validate_audio_describes_wav() -> Result<()> {
    let state = StubState::new();
    let wav = wav::encode_wav(&vec![0i16; 16000], 16000, 1)?;

    let (status, json) = send(&state, multipart_request("audio_file", "audio.wav", &wav)).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["transcribed_text"], "Audio de 1.0 segundos");
    assert_eq!(json["simplified_text"], "audio de 1.0 segundos");
    Ok(())
}

#[tokio::test]
async fn test_validate_audio_describes_compressed_formats() -> Result<()> {
    let state = StubState::new();

    let (_, json) = send(&state, multipart_request("audio_file", "audio.mp3", &[7; 42])).await?;

    assert_eq!(json["success"], true);
    assert_eq!(json["transcribed_text"], "Audio mp3 de 42 bytes");
    Ok(())
}

#[tokio::test]
async fn test_validate_audio_rejections() -> Result<()> {
    let state = StubState::new();

    let (_, unknown) = send(&state, multipart_request("audio_file", "audio.txt", b"x")).await?;
    assert_eq!(unknown["message"], "Formato de audio no soportado");

    let (_, empty) = send(&state, multipart_request("audio_file", "audio.ogg", b"")).await?;
    assert_eq!(empty["message"], "El archivo de audio está vacío");

    let (_, bad_wav) = send(&state, multipart_request("audio_file", "audio.wav", b"RIFF")).await?;
    assert_eq!(bad_wav["success"], false);
    assert_eq!(bad_wav["message"], "Archivo WAV inválido");
    Ok(())
}

#[tokio::test]
async fn test_validate_audio_requires_audio_field() -> Result<()> {
    let state = StubState::new();

    let (status, json) = send(&state, multipart_request("other", "audio.wav", b"x")).await?;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["detail"].as_str().unwrap_or_default().contains("audio_file"));
    assert_eq!(RequestCounters::get(&state.counters.validate_audio), 1);
    Ok(())
}
