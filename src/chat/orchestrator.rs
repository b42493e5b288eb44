use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};

use super::normalize::{normalize_value, Normalized};
use super::transcript::{Message, MessageContent, MessageKind, Transcript};
use crate::api::{Backend, Validation};
use crate::audio::{AudioEncoding, AudioPayload, CaptureDevice, CaptureSession, DEFAULT_PREFERENCE};
use crate::error::{CaptureError, ChatError, SendPath};

/// Settings for a conversation
#[derive(Debug, Clone)]
pub struct ConversationConfig {
    /// Encodings to probe, most preferred first
    pub preferred_encodings: Vec<AudioEncoding>,
    /// How long to wait for a device's final fragment after stop
    pub stop_ack_timeout: Duration,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            preferred_encodings: DEFAULT_PREFERENCE.to_vec(),
            stop_ack_timeout: Duration::from_millis(2000),
        }
    }
}

/// Result of a send attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendStatus {
    /// The sequence completed with a bot reply
    Delivered,
    /// The sequence ended with an error message in the transcript
    Failed,
    /// Another send was in flight; nothing was appended
    Busy,
    /// Blank input; nothing was appended
    Empty,
    /// Stop requested with no active recording
    NotRecording,
}

/// Holds the in-flight flag for the duration of one orchestrated send
///
/// Dropping the guard clears the flag, so every exit path releases it.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Conversation orchestrator
///
/// Owns the transcript and sequences backend calls for each user action:
/// - text: validate -> generate
/// - voice: validate audio (transcribe) -> generate
///
/// At most one send runs at a time; attempts made meanwhile are rejected,
/// not queued. Every sequence appends its messages in causal order and ends
/// with either a `bot_text` or exactly one `error` message.
pub struct Conversation {
    backend: Arc<dyn Backend>,
    config: ConversationConfig,
    transcript: Mutex<Transcript>,
    in_flight: AtomicBool,
    capture: Mutex<Option<CaptureSession>>,
    updates: broadcast::Sender<Message>,
}

impl Conversation {
    pub fn new(backend: Arc<dyn Backend>, config: ConversationConfig) -> Self {
        let (updates, _) = broadcast::channel(64);

        Self {
            backend,
            config,
            transcript: Mutex::new(Transcript::new()),
            in_flight: AtomicBool::new(false),
            capture: Mutex::new(None),
            updates,
        }
    }

    /// Receive every message as it is appended
    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.updates.subscribe()
    }

    /// Snapshot of the transcript
    pub async fn transcript(&self) -> Transcript {
        self.transcript.lock().await.clone()
    }

    pub fn is_sending(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub async fn is_recording(&self) -> bool {
        self.capture.lock().await.is_some()
    }

    async fn append(&self, kind: MessageKind, content: MessageContent) -> Message {
        let message = self.transcript.lock().await.append(kind, content);
        debug!("Appended {} message {}", message.kind(), message.id());

        // No subscribers is fine
        let _ = self.updates.send(message.clone());
        message
    }

    async fn append_error(&self, err: &ChatError, path: SendPath) {
        self.append(MessageKind::Error, MessageContent::Text(err.user_message(path)))
            .await;
    }

    async fn append_reply(&self, reply: Normalized) {
        let content = if reply.is_structured {
            MessageContent::Structured(reply.display_text)
        } else {
            MessageContent::Text(reply.display_text)
        };
        self.append(MessageKind::BotText, content).await;
    }

    /// Send typed text through validate -> generate
    pub async fn send_text(&self, input: &str) -> SendStatus {
        let text = input.trim();
        if text.is_empty() {
            return SendStatus::Empty;
        }

        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            info!("Send already in progress, ignoring text");
            return SendStatus::Busy;
        };

        self.append(MessageKind::UserText, MessageContent::Text(text.to_string()))
            .await;

        match self.text_sequence(text).await {
            Ok(()) => SendStatus::Delivered,
            Err(e) => {
                error!("Error processing message: {}", e);
                self.append_error(&e, SendPath::Text).await;
                SendStatus::Failed
            }
        }
    }

    async fn text_sequence(&self, text: &str) -> Result<(), ChatError> {
        let validated = match self.backend.validate_text(text).await? {
            Validation::Accepted(validated) => validated,
            Validation::Rejected(reason) => return Err(ChatError::StructuralRejection(reason)),
        };

        let generated = self.backend.generate_text(&validated).await?;
        self.append_reply(normalize_value(&generated)).await;

        Ok(())
    }

    /// Open `device` and start a recording
    ///
    /// Failures here produce no transcript entry; the caller shows
    /// `ChatError::user_message` as an alert.
    pub async fn start_recording(
        &self,
        device: Box<dyn CaptureDevice>,
    ) -> Result<AudioEncoding, ChatError> {
        if self.is_sending() {
            return Err(ChatError::Busy);
        }

        let mut capture = self.capture.lock().await;
        if capture.is_some() {
            return Err(CaptureError::AlreadyRecording.into());
        }

        let mut session = CaptureSession::new(device, self.config.stop_ack_timeout);
        let encoding = session.start(&self.config.preferred_encodings).await?;
        *capture = Some(session);

        info!("Recording started ({})", encoding);
        Ok(encoding)
    }

    /// Bytes captured so far by the active recording
    pub async fn recording_progress(&self) -> Option<usize> {
        self.capture.lock().await.as_mut().map(CaptureSession::poll)
    }

    /// Stop the active recording and send it through
    /// validate audio -> generate
    pub async fn stop_recording(&self) -> SendStatus {
        let Some(session) = self.capture.lock().await.take() else {
            return SendStatus::NotRecording;
        };

        let guard = InFlightGuard::acquire(&self.in_flight);

        // Finish regardless so the device is always released
        let assembled = session.finish().await;

        let Some(_guard) = guard else {
            warn!("Send already in progress, discarding recording");
            return SendStatus::Busy;
        };

        let audio = match assembled {
            Ok(audio) => audio,
            Err(e) => {
                let e = ChatError::from(e);
                warn!("Recording failed: {}", e);
                self.append_error(&e, SendPath::Voice).await;
                return SendStatus::Failed;
            }
        };

        info!("Processing recorded audio, size: {}", audio.len());
        self.append(MessageKind::Voice, MessageContent::Voice(audio.clone()))
            .await;

        match self.voice_sequence(&audio).await {
            Ok(()) => SendStatus::Delivered,
            Err(e) => {
                error!("Error processing audio: {}", e);
                self.append_error(&e, SendPath::Voice).await;
                SendStatus::Failed
            }
        }
    }

    async fn voice_sequence(&self, audio: &AudioPayload) -> Result<(), ChatError> {
        let transcription = match self.backend.validate_audio(audio).await? {
            Validation::Accepted(transcription) => transcription,
            Validation::Rejected(reason) => return Err(ChatError::StructuralRejection(reason)),
        };

        self.append(
            MessageKind::Transcription,
            MessageContent::Text(transcription.transcribed),
        )
        .await;

        let generated = self.backend.generate_text(&transcription.simplified).await?;
        self.append_reply(normalize_value(&generated)).await;

        Ok(())
    }
}
