use anyhow::Result;
use std::path::PathBuf;
use tokio::sync::mpsc;

use super::encoding::AudioEncoding;
use crate::error::CaptureError;

/// Event delivered by a capture device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// An encoded fragment of the recording
    Data(Vec<u8>),
    /// The device has flushed its last fragment; nothing follows
    Stopped,
}

/// Configuration for capture devices
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Size of the fragments a file-fed device emits
    pub fragment_bytes: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            fragment_bytes: 16 * 1024,
        }
    }
}

/// Audio capture device
///
/// Devices report everything through the returned event channel: zero or more
/// `Data` fragments in production order, then exactly one `Stopped` once
/// `stop` has been requested and the last fragment was flushed. Devices may
/// deliver their final fragment after `stop` returns.
///
/// Implementations:
/// - `MicrophoneDevice`: default input via cpal (feature `audio-io`)
/// - `FileDevice`: replays an audio file (headless use and testing)
#[async_trait::async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Whether the device can produce `encoding`
    fn supports(&self, encoding: AudioEncoding) -> bool;

    /// Acquire the device and start producing `encoding`
    async fn start(
        &mut self,
        encoding: AudioEncoding,
    ) -> Result<mpsc::UnboundedReceiver<DeviceEvent>, CaptureError>;

    /// Ask the device to finish; the `Stopped` event follows on the channel
    async fn stop(&mut self) -> Result<(), CaptureError>;

    /// Check if device is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get device name for logging
    fn name(&self) -> &str;
}

/// Capture device factory
pub struct DeviceFactory;

impl DeviceFactory {
    /// Create a capture device for `source`
    pub fn create(source: DeviceSource, config: DeviceConfig) -> Result<Box<dyn CaptureDevice>> {
        match source {
            DeviceSource::Microphone => {
                #[cfg(feature = "audio-io")]
                {
                    let device = super::microphone::MicrophoneDevice::new()?;
                    Ok(Box::new(device))
                }

                #[cfg(not(feature = "audio-io"))]
                {
                    anyhow::bail!("Microphone capture requires the `audio-io` feature")
                }
            }

            DeviceSource::File(path) => {
                let device = super::file::FileDevice::open(path, config.fragment_bytes)?;
                Ok(Box::new(device))
            }
        }
    }
}

/// Where recordings come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSource {
    /// Default input device
    Microphone,
    /// Replay an audio file
    File(PathBuf),
}
