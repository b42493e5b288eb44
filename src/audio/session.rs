use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::backend::{CaptureDevice, DeviceEvent};
use super::encoding::{self, AudioEncoding};
use super::payload::AudioPayload;
use crate::error::CaptureError;

/// Lifecycle state of a capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Recording,
    Stopped,
}

/// One voice recording, from device acquisition to a finished payload
///
/// The session owns its device for the whole recording and releases it
/// exactly once, when the recording stops. Device callbacks arrive as
/// [`DeviceEvent`]s on a channel and are consumed here in arrival order.
pub struct CaptureSession {
    state: CaptureState,
    device: Option<Box<dyn CaptureDevice>>,
    events: Option<mpsc::UnboundedReceiver<DeviceEvent>>,
    chunks: Vec<Vec<u8>>,
    encoding: Option<AudioEncoding>,
    /// Upper bound on waiting for the device's final fragment after stop
    stop_ack_timeout: Duration,
    started_at: Option<Instant>,
}

impl CaptureSession {
    pub fn new(device: Box<dyn CaptureDevice>, stop_ack_timeout: Duration) -> Self {
        Self {
            state: CaptureState::Idle,
            device: Some(device),
            events: None,
            chunks: Vec::new(),
            encoding: None,
            stop_ack_timeout,
            started_at: None,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Encoding chosen at start, fixed for the session
    pub fn encoding(&self) -> Option<AudioEncoding> {
        self.encoding
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn captured_bytes(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }

    /// Negotiate an encoding and acquire the device
    ///
    /// On failure the session stays idle and can be dropped or retried.
    pub async fn start(&mut self, preference: &[AudioEncoding]) -> Result<AudioEncoding, CaptureError> {
        if self.state != CaptureState::Idle {
            return Err(CaptureError::AlreadyRecording);
        }
        let device = self.device.as_mut().ok_or(CaptureError::NotRecording)?;

        let encoding = encoding::negotiate(preference, |e| device.supports(e))
            .ok_or(CaptureError::NoSupportedEncoding)?;

        info!("Starting capture on {} as {}", device.name(), encoding);

        let events = device.start(encoding).await.map_err(|e| {
            warn!("Device {} refused to start: {}", device.name(), e);
            e
        })?;

        self.events = Some(events);
        self.encoding = Some(encoding);
        self.started_at = Some(Instant::now());
        self.state = CaptureState::Recording;

        Ok(encoding)
    }

    /// Consume events that have already arrived without waiting
    ///
    /// Returns the number of bytes captured so far.
    pub fn poll(&mut self) -> usize {
        if self.state == CaptureState::Recording {
            while let Some(event) = self.events.as_mut().and_then(|rx| rx.try_recv().ok()) {
                match event {
                    DeviceEvent::Data(bytes) => self.push_chunk(bytes),
                    // Device ended on its own; stop() will observe the closed channel
                    DeviceEvent::Stopped => {
                        self.events = None;
                        break;
                    }
                }
            }
        }
        self.captured_bytes()
    }

    fn push_chunk(&mut self, bytes: Vec<u8>) {
        if bytes.is_empty() {
            return;
        }
        debug!("Captured fragment {} ({} bytes)", self.chunks.len(), bytes.len());
        self.chunks.push(bytes);
    }

    /// Stop recording and wait for the device's final fragment
    ///
    /// Fragments the device produced before its `Stopped` acknowledgment are
    /// all collected. The device is released here whatever the outcome.
    pub async fn stop(&mut self) -> Result<(), CaptureError> {
        if self.state != CaptureState::Recording {
            return Err(CaptureError::NotRecording);
        }
        self.state = CaptureState::Stopped;

        let Some(mut device) = self.device.take() else {
            return Err(CaptureError::NotRecording);
        };

        let stop_result = device.stop().await;
        if let Err(e) = &stop_result {
            warn!("Device {} failed to stop cleanly: {}", device.name(), e);
        }

        if let Some(mut events) = self.events.take() {
            let deadline = tokio::time::Instant::now() + self.stop_ack_timeout;
            loop {
                match tokio::time::timeout_at(deadline, events.recv()).await {
                    Ok(Some(DeviceEvent::Data(bytes))) => self.push_chunk(bytes),
                    Ok(Some(DeviceEvent::Stopped)) | Ok(None) => break,
                    Err(_) => {
                        warn!(
                            "No stop acknowledgment from {} within {}ms",
                            device.name(),
                            self.stop_ack_timeout.as_millis()
                        );
                        break;
                    }
                }
            }
        }

        let elapsed = self.started_at.map(|t| t.elapsed()).unwrap_or_default();
        info!(
            "Capture stopped after {:.1}s: {} fragments, {} bytes",
            elapsed.as_secs_f32(),
            self.chunks.len(),
            self.captured_bytes()
        );

        // Release the device
        drop(device);

        stop_result
    }

    /// Concatenate the fragments into one payload, ending the session
    pub fn assemble(self) -> Result<AudioPayload, CaptureError> {
        if self.state != CaptureState::Stopped {
            return Err(CaptureError::NotRecording);
        }
        let encoding = self.encoding.ok_or(CaptureError::NotRecording)?;

        let bytes = self.chunks.concat();
        if bytes.is_empty() {
            warn!("Recording produced no audio");
            return Err(CaptureError::EmptyCapture);
        }

        Ok(AudioPayload::new(bytes, encoding))
    }

    /// Stop, then assemble
    pub async fn finish(mut self) -> Result<AudioPayload, CaptureError> {
        self.stop().await?;
        self.assemble()
    }
}
