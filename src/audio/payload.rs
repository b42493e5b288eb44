use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use super::encoding::AudioEncoding;

/// One finished recording, tagged with its container
///
/// Cloning is cheap: the bytes are shared, so the same payload can be both
/// uploaded and kept in the transcript as a playable handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioPayload {
    bytes: Arc<[u8]>,
    encoding: AudioEncoding,
}

impl AudioPayload {
    pub fn new(bytes: Vec<u8>, encoding: AudioEncoding) -> Self {
        Self {
            bytes: bytes.into(),
            encoding,
        }
    }

    pub fn encoding(&self) -> AudioEncoding {
        self.encoding
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Write the payload to `dir/<stem>.<ext>` and return the path
    pub fn save_to(&self, dir: impl AsRef<Path>, stem: &str) -> Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

        let path = dir.join(format!("{}.{}", stem, self.encoding.extension()));
        fs::write(&path, &self.bytes)
            .with_context(|| format!("Failed to write audio file: {}", path.display()))?;

        info!("Saved {} bytes of {} to {}", self.len(), self.encoding, path.display());

        Ok(path)
    }
}
