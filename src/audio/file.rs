// File-fed capture device
//
// Replays an audio file as if it were being recorded: the file's bytes are
// emitted as fragments right after start, and the stop acknowledgment is only
// sent once stop is requested.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use super::backend::{CaptureDevice, DeviceEvent};
use super::encoding::AudioEncoding;
use super::wav;
use crate::error::CaptureError;

pub struct FileDevice {
    path: PathBuf,
    encoding: AudioEncoding,
    fragment_bytes: usize,
    stop_tx: Option<oneshot::Sender<()>>,
    name: String,
}

impl FileDevice {
    pub fn open(path: impl AsRef<Path>, fragment_bytes: usize) -> Result<Self> {
        let path = path.as_ref();

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let Some(encoding) = AudioEncoding::from_extension(ext) else {
            bail!("Unsupported audio file extension: {:?}", path);
        };

        if fragment_bytes == 0 {
            bail!("Fragment size must be non-zero");
        }

        info!("Opening audio file device: {} ({})", path.display(), encoding);

        Ok(Self {
            path: path.to_path_buf(),
            encoding,
            fragment_bytes,
            stop_tx: None,
            name: format!("file:{}", path.display()),
        })
    }

    pub fn encoding(&self) -> AudioEncoding {
        self.encoding
    }
}

#[async_trait::async_trait]
impl CaptureDevice for FileDevice {
    fn supports(&self, encoding: AudioEncoding) -> bool {
        encoding == self.encoding
    }

    async fn start(
        &mut self,
        encoding: AudioEncoding,
    ) -> Result<mpsc::UnboundedReceiver<DeviceEvent>, CaptureError> {
        if self.stop_tx.is_some() {
            return Err(CaptureError::AlreadyRecording);
        }
        if encoding != self.encoding {
            return Err(CaptureError::NoSupportedEncoding);
        }

        let bytes = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))
            .map_err(|e| CaptureError::PermissionDenied(format!("{:#}", e)))?;

        if self.encoding == AudioEncoding::Wav {
            if let Ok(info) = wav::inspect_wav(&bytes) {
                info!(
                    "Audio file loaded: {:.1}s, {}Hz, {} channels",
                    info.duration_seconds, info.sample_rate, info.channels
                );
            }
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = oneshot::channel();
        let fragment_bytes = self.fragment_bytes;

        tokio::spawn(async move {
            for fragment in bytes.chunks(fragment_bytes) {
                if tx.send(DeviceEvent::Data(fragment.to_vec())).is_err() {
                    return;
                }
            }
            debug!("File device emitted {} bytes", bytes.len());

            // Either an explicit stop or the device being dropped ends the replay
            let _ = stop_rx.await;
            let _ = tx.send(DeviceEvent::Stopped);
        });

        self.stop_tx = Some(stop_tx);

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        match self.stop_tx.take() {
            Some(stop_tx) => {
                let _ = stop_tx.send(());
                Ok(())
            }
            None => Err(CaptureError::NotRecording),
        }
    }

    fn is_capturing(&self) -> bool {
        self.stop_tx.is_some()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
