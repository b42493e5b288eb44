// Microphone capture device using cpal
//
// cpal streams are not Send on every platform, so the stream lives on its own
// thread. Samples accumulate there and are encoded to a single WAV fragment
// when the device is stopped.

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use super::backend::{CaptureDevice, DeviceEvent};
use super::encoding::AudioEncoding;
use super::wav;
use crate::error::CaptureError;

/// Default input device
pub struct MicrophoneDevice {
    device_name: String,
    stop_tx: Option<std_mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl MicrophoneDevice {
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();
        let device_name = host
            .default_input_device()
            .and_then(|d| d.name().ok())
            .unwrap_or_else(|| "Unknown".to_string());

        info!("Using input device: {}", device_name);

        Ok(Self {
            device_name,
            stop_tx: None,
            thread: None,
        })
    }
}

/// Body of the capture thread: open the device, record until told to stop,
/// then flush the recording as one WAV fragment followed by `Stopped`.
fn run_capture(
    events: mpsc::UnboundedSender<DeviceEvent>,
    ready: oneshot::Sender<Result<(), CaptureError>>,
    stop_rx: std_mpsc::Receiver<()>,
) {
    let samples = Arc::new(Mutex::new(Vec::<i16>::new()));

    let opened = open_stream(Arc::clone(&samples)).context("Failed to open microphone");
    let (stream, sample_rate) = match opened {
        Ok(opened) => opened,
        Err(e) => {
            let _ = ready.send(Err(CaptureError::PermissionDenied(format!("{:#}", e))));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready.send(Err(CaptureError::PermissionDenied(e.to_string())));
        return;
    }
    let _ = ready.send(Ok(()));

    // Sender dropped counts as stop
    let _ = stop_rx.recv();
    drop(stream);

    let recorded = match samples.lock() {
        Ok(mut guard) => std::mem::take(&mut *guard),
        Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
    };
    info!(
        "Microphone stopped: {} samples ({:.1}s)",
        recorded.len(),
        recorded.len() as f32 / sample_rate as f32
    );

    if !recorded.is_empty() {
        match wav::encode_wav(&recorded, sample_rate, 1) {
            Ok(bytes) => {
                let _ = events.send(DeviceEvent::Data(bytes));
            }
            Err(e) => error!("Failed to encode recording: {:#}", e),
        }
    }

    let _ = events.send(DeviceEvent::Stopped);
}

/// Build a mono-downmixing input stream on the default device
fn open_stream(samples: Arc<Mutex<Vec<i16>>>) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .context("No input device available")?;

    let supported = device
        .default_input_config()
        .context("Failed to get input config")?;
    let sample_format = supported.sample_format();
    let config: StreamConfig = supported.into();
    let sample_rate = config.sample_rate.0;
    let channels = config.channels as usize;

    debug!(
        "Building input stream: {}Hz, {} channel(s), {:?}",
        sample_rate, channels, sample_format
    );

    let err_fn = |err| error!("Audio input stream error: {}", err);

    let stream = match sample_format {
        SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let mono = data
                    .chunks(channels)
                    .map(|frame| wav::f32_to_i16(frame.iter().sum::<f32>() / channels as f32));
                if let Ok(mut buffer) = samples.lock() {
                    buffer.extend(mono);
                }
            },
            err_fn,
            None,
        ),
        SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                let mono = data.chunks(channels).map(|frame| {
                    (frame.iter().map(|&s| s as i32).sum::<i32>() / channels as i32) as i16
                });
                if let Ok(mut buffer) = samples.lock() {
                    buffer.extend(mono);
                }
            },
            err_fn,
            None,
        ),
        other => anyhow::bail!("Unsupported sample format: {:?}", other),
    }
    .context("Failed to build input stream")?;

    Ok((stream, sample_rate))
}

#[async_trait::async_trait]
impl CaptureDevice for MicrophoneDevice {
    fn supports(&self, encoding: AudioEncoding) -> bool {
        encoding == AudioEncoding::Wav
    }

    async fn start(
        &mut self,
        encoding: AudioEncoding,
    ) -> Result<mpsc::UnboundedReceiver<DeviceEvent>, CaptureError> {
        if self.stop_tx.is_some() {
            return Err(CaptureError::AlreadyRecording);
        }
        if !self.supports(encoding) {
            return Err(CaptureError::NoSupportedEncoding);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = std_mpsc::channel();

        let thread = std::thread::Builder::new()
            .name("microphone".to_string())
            .spawn(move || run_capture(tx, ready_tx, stop_rx))
            .map_err(|e| CaptureError::Device(e.to_string()))?;

        match ready_rx.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(e);
            }
            Err(_) => {
                return Err(CaptureError::Device("capture thread exited".to_string()));
            }
        }

        info!("Microphone capture started");

        self.stop_tx = Some(stop_tx);
        self.thread = Some(thread);

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        let Some(stop_tx) = self.stop_tx.take() else {
            return Err(CaptureError::NotRecording);
        };

        if stop_tx.send(()).is_err() {
            warn!("Capture thread already gone");
        }

        // Join off the async runtime; the Stopped event arrives on the channel
        if let Some(thread) = self.thread.take() {
            let joined = tokio::task::spawn_blocking(move || thread.join()).await;
            if !matches!(joined, Ok(Ok(()))) {
                return Err(CaptureError::Device("capture thread panicked".to_string()));
            }
        }

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.stop_tx.is_some()
    }

    fn name(&self) -> &str {
        &self.device_name
    }
}
