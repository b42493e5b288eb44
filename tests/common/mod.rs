// Test doubles shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use telepatia_chat::api::{Backend, Endpoint, Transcription, Validation};
use telepatia_chat::audio::{AudioEncoding, AudioPayload, CaptureDevice, DeviceEvent};
use telepatia_chat::error::{CaptureError, RequestError};
use tokio::sync::{mpsc, Notify};

/// Backend call, as observed by [`ScriptedBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ValidateText(String),
    Generate(String),
    ValidateAudio(Vec<u8>, AudioEncoding),
}

/// Backend that replays queued replies and records every call
#[derive(Default)]
pub struct ScriptedBackend {
    text: Mutex<VecDeque<Result<Validation<String>, RequestError>>>,
    audio: Mutex<VecDeque<Result<Validation<Transcription>, RequestError>>>,
    generate: Mutex<VecDeque<Result<serde_json::Value, RequestError>>>,
    calls: Mutex<Vec<Call>>,
    /// When set, text validation waits for a notification before answering
    gate: Option<Arc<Notify>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn accept_text(self, validated: &str) -> Self {
        self.push_text(Ok(Validation::Accepted(validated.to_string())))
    }

    pub fn reject_text(self, reason: &str) -> Self {
        self.push_text(Ok(Validation::Rejected(reason.to_string())))
    }

    pub fn push_text(self, reply: Result<Validation<String>, RequestError>) -> Self {
        self.text.lock().unwrap().push_back(reply);
        self
    }

    pub fn accept_audio(self, transcribed: &str, simplified: &str) -> Self {
        self.push_audio(Ok(Validation::Accepted(Transcription {
            transcribed: transcribed.to_string(),
            simplified: simplified.to_string(),
        })))
    }

    pub fn push_audio(self, reply: Result<Validation<Transcription>, RequestError>) -> Self {
        self.audio.lock().unwrap().push_back(reply);
        self
    }

    pub fn reply(self, generated: &str) -> Self {
        self.push_generate(Ok(serde_json::Value::String(generated.to_string())))
    }

    pub fn push_generate(self, reply: Result<serde_json::Value, RequestError>) -> Self {
        self.generate.lock().unwrap().push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn unscripted(endpoint: Endpoint) -> RequestError {
    RequestError::Transport {
        endpoint,
        reason: "no scripted reply".to_string(),
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn validate_text(&self, text: &str) -> Result<Validation<String>, RequestError> {
        self.record(Call::ValidateText(text.to_string()));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let reply = self.text.lock().unwrap().pop_front();
        reply.unwrap_or_else(|| Err(unscripted(Endpoint::ValidateText)))
    }

    async fn generate_text(&self, prompt: &str) -> Result<serde_json::Value, RequestError> {
        self.record(Call::Generate(prompt.to_string()));
        let reply = self.generate.lock().unwrap().pop_front();
        reply.unwrap_or_else(|| Err(unscripted(Endpoint::GenerateText)))
    }

    async fn validate_audio(
        &self,
        audio: &AudioPayload,
    ) -> Result<Validation<Transcription>, RequestError> {
        self.record(Call::ValidateAudio(audio.to_vec(), audio.encoding()));
        let reply = self.audio.lock().unwrap().pop_front();
        reply.unwrap_or_else(|| Err(unscripted(Endpoint::ValidateAudio)))
    }
}

pub fn timeout(endpoint: Endpoint) -> RequestError {
    RequestError::Timeout {
        endpoint,
        timeout_ms: 10,
        message: endpoint.timeout_message().to_string(),
    }
}

/// Observations about a [`ScriptedDevice`] that outlive it
#[derive(Debug, Default)]
pub struct DeviceProbe {
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
    pub dropped: AtomicBool,
}

/// Capture device that plays a fixed script of fragments
pub struct ScriptedDevice {
    supported: Vec<AudioEncoding>,
    /// Delivered right after start
    pub before_stop: Vec<Vec<u8>>,
    /// Delivered after stop, following `flush_delay`
    pub after_stop: Vec<Vec<u8>>,
    pub flush_delay: Duration,
    /// Send `Stopped` after flushing (otherwise hold the channel open)
    pub acknowledge: bool,
    pub deny: bool,
    tx: Option<mpsc::UnboundedSender<DeviceEvent>>,
    pub probe: Arc<DeviceProbe>,
}

impl ScriptedDevice {
    pub fn new(supported: &[AudioEncoding]) -> Self {
        Self {
            supported: supported.to_vec(),
            before_stop: Vec::new(),
            after_stop: Vec::new(),
            flush_delay: Duration::from_millis(50),
            acknowledge: true,
            deny: false,
            tx: None,
            probe: Arc::new(DeviceProbe::default()),
        }
    }

    pub fn wav() -> Self {
        Self::new(&[AudioEncoding::Wav])
    }

    pub fn with_fragments(mut self, before: &[&[u8]], after: &[&[u8]]) -> Self {
        self.before_stop = before.iter().map(|f| f.to_vec()).collect();
        self.after_stop = after.iter().map(|f| f.to_vec()).collect();
        self
    }

    pub fn denied(mut self) -> Self {
        self.deny = true;
        self
    }

    pub fn probe(&self) -> Arc<DeviceProbe> {
        Arc::clone(&self.probe)
    }
}

impl Drop for ScriptedDevice {
    fn drop(&mut self) {
        self.probe.dropped.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl CaptureDevice for ScriptedDevice {
    fn supports(&self, encoding: AudioEncoding) -> bool {
        self.supported.contains(&encoding)
    }

    async fn start(
        &mut self,
        _encoding: AudioEncoding,
    ) -> Result<mpsc::UnboundedReceiver<DeviceEvent>, CaptureError> {
        self.probe.starts.fetch_add(1, Ordering::SeqCst);
        if self.deny {
            return Err(CaptureError::PermissionDenied("scripted denial".to_string()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        for fragment in &self.before_stop {
            let _ = tx.send(DeviceEvent::Data(fragment.clone()));
        }
        self.tx = Some(tx);
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        self.probe.stops.fetch_add(1, Ordering::SeqCst);
        let tx = self.tx.take().ok_or(CaptureError::NotRecording)?;

        let after_stop = std::mem::take(&mut self.after_stop);
        let flush_delay = self.flush_delay;
        let acknowledge = self.acknowledge;

        tokio::spawn(async move {
            tokio::time::sleep(flush_delay).await;
            for fragment in after_stop {
                let _ = tx.send(DeviceEvent::Data(fragment));
            }
            if acknowledge {
                let _ = tx.send(DeviceEvent::Stopped);
            } else {
                // Hold the channel open, never acknowledging
                tokio::time::sleep(Duration::from_secs(3600)).await;
                drop(tx);
            }
        });

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.tx.is_some()
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
