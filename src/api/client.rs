use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::endpoint::{Endpoint, TimeoutBudgets};
use super::messages::{
    GenerateTextRequest, GenerateTextResponse, Transcription, ValidateAudioResponse,
    ValidateTextRequest, ValidateTextResponse, Validation, AUDIO_FIELD,
};
use crate::audio::AudioPayload;
use crate::error::RequestError;

/// Fallback reason when the backend rejects without saying why
const DEFAULT_REJECTION: &str = "Solicitud rechazada";

/// Outgoing body of a timed request
#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(serde_json::Value),
    Audio(AudioPayload),
}

/// Issues single HTTP calls bounded by a timeout
///
/// The whole exchange, including reading the body, runs inside the bound.
/// When the bound elapses the in-flight future is dropped, which aborts the
/// call, so a late response can never be observed.
#[derive(Debug, Clone)]
pub struct TimedClient {
    client: reqwest::Client,
    base_url: String,
}

impl TimedClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one request and wait at most `timeout` for its outcome
    pub async fn send(
        &self,
        endpoint: Endpoint,
        body: RequestBody,
        timeout: Duration,
    ) -> Result<serde_json::Value, RequestError> {
        debug!("POST {} (timeout {}ms)", endpoint, timeout.as_millis());

        match tokio::time::timeout(timeout, self.execute(endpoint, body)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!("{} timed out after {}ms", endpoint, timeout.as_millis());
                Err(RequestError::Timeout {
                    endpoint,
                    timeout_ms: timeout.as_millis() as u64,
                    message: endpoint.timeout_message().to_string(),
                })
            }
        }
    }

    async fn execute(
        &self,
        endpoint: Endpoint,
        body: RequestBody,
    ) -> Result<serde_json::Value, RequestError> {
        let url = format!("{}{}", self.base_url, endpoint.path());
        let transport = |e: reqwest::Error| RequestError::Transport {
            endpoint,
            reason: e.to_string(),
        };

        let request = match body {
            RequestBody::Json(json) => self.client.post(&url).json(&json),
            RequestBody::Audio(audio) => {
                let encoding = audio.encoding();
                let part = Part::bytes(audio.to_vec())
                    .file_name(format!("audio.{}", encoding.extension()))
                    .mime_str(encoding.mime_type())
                    .map_err(transport)?;
                self.client
                    .post(&url)
                    .multipart(Form::new().part(AUDIO_FIELD, part))
            }
        };

        let response = request.send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            warn!("{} returned HTTP {}", endpoint, status);
            return Err(RequestError::HttpStatus {
                endpoint,
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(transport)?;

        serde_json::from_slice(&bytes).map_err(|e| RequestError::Decode {
            endpoint,
            reason: e.to_string(),
        })
    }
}

/// Backend operations the conversation depends on
#[async_trait]
pub trait Backend: Send + Sync {
    /// Validate and preprocess typed text
    async fn validate_text(&self, text: &str) -> Result<Validation<String>, RequestError>;

    /// Generate a reply for a validated prompt
    async fn generate_text(&self, prompt: &str) -> Result<serde_json::Value, RequestError>;

    /// Transcribe and validate a recording
    async fn validate_audio(
        &self,
        audio: &AudioPayload,
    ) -> Result<Validation<Transcription>, RequestError>;
}

/// HTTP implementation of [`Backend`]
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: TimedClient,
    budgets: TimeoutBudgets,
}

impl ApiClient {
    pub fn new(base_url: &str, budgets: TimeoutBudgets) -> Result<Self> {
        info!("Backend at {}", base_url);

        Ok(Self {
            http: TimedClient::new(base_url)?,
            budgets,
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        body: RequestBody,
    ) -> Result<T, RequestError> {
        let value = self
            .http
            .send(endpoint, body, self.budgets.for_endpoint(endpoint))
            .await?;

        serde_json::from_value(value).map_err(|e| RequestError::Decode {
            endpoint,
            reason: e.to_string(),
        })
    }
}

fn json_body<T: serde::Serialize>(endpoint: Endpoint, body: &T) -> Result<RequestBody, RequestError> {
    serde_json::to_value(body)
        .map(RequestBody::Json)
        .map_err(|e| RequestError::Transport {
            endpoint,
            reason: e.to_string(),
        })
}

fn missing_field(endpoint: Endpoint, field: &str) -> RequestError {
    RequestError::Decode {
        endpoint,
        reason: format!("success response without `{}`", field),
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn validate_text(&self, text: &str) -> Result<Validation<String>, RequestError> {
        let endpoint = Endpoint::ValidateText;
        let body = json_body(endpoint, &ValidateTextRequest { text: text.to_string() })?;
        let response: ValidateTextResponse = self.call(endpoint, body).await?;

        if !response.success {
            return Ok(Validation::Rejected(
                response.message.unwrap_or_else(|| DEFAULT_REJECTION.to_string()),
            ));
        }

        response
            .validate_text
            .map(Validation::Accepted)
            .ok_or_else(|| missing_field(endpoint, "validate_text"))
    }

    async fn generate_text(&self, prompt: &str) -> Result<serde_json::Value, RequestError> {
        let endpoint = Endpoint::GenerateText;
        let body = json_body(endpoint, &GenerateTextRequest { prompt: prompt.to_string() })?;
        let response: GenerateTextResponse = self.call(endpoint, body).await?;

        if response.generated_text.is_null() {
            return Err(missing_field(endpoint, "generated_text"));
        }

        Ok(response.generated_text)
    }

    async fn validate_audio(
        &self,
        audio: &AudioPayload,
    ) -> Result<Validation<Transcription>, RequestError> {
        let endpoint = Endpoint::ValidateAudio;
        let response: ValidateAudioResponse = self
            .call(endpoint, RequestBody::Audio(audio.clone()))
            .await?;

        if !response.success {
            return Ok(Validation::Rejected(
                response.message.unwrap_or_else(|| DEFAULT_REJECTION.to_string()),
            ));
        }

        let transcribed = response
            .transcribed_text
            .ok_or_else(|| missing_field(endpoint, "transcribed_text"))?;
        // Older backends only return the raw transcript
        let simplified = response
            .simplified_text
            .unwrap_or_else(|| transcribed.clone());

        Ok(Validation::Accepted(Transcription {
            transcribed,
            simplified,
        }))
    }
}
