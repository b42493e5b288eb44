use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::api::TimeoutBudgets;
use crate::audio::{AudioEncoding, DEFAULT_PREFERENCE};
use crate::chat::ConversationConfig;

/// Default location of the config file (extension optional)
pub const DEFAULT_CONFIG_PATH: &str = "config/telepatia-chat";

/// Prefix for environment overrides, e.g. `TELEPATIA_BACKEND__BASE_URL`
pub const ENV_PREFIX: &str = "TELEPATIA";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub audio: AudioConfig,
    pub stub: StubConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub validate_text_timeout_ms: u64,
    pub generate_text_timeout_ms: u64,
    pub validate_audio_timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        let budgets = TimeoutBudgets::default();
        Self {
            base_url: "http://0.0.0.0:8000".to_string(),
            validate_text_timeout_ms: budgets.validate_text_ms,
            generate_text_timeout_ms: budgets.generate_text_ms,
            validate_audio_timeout_ms: budgets.validate_audio_ms,
        }
    }
}

impl BackendConfig {
    pub fn timeouts(&self) -> TimeoutBudgets {
        TimeoutBudgets {
            validate_text_ms: self.validate_text_timeout_ms,
            generate_text_ms: self.generate_text_timeout_ms,
            validate_audio_ms: self.validate_audio_timeout_ms,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Where `/save` writes voice messages; `~` is expanded
    pub recordings_path: String,
    /// Wait bound for a device's final fragment after stop
    pub stop_ack_timeout_ms: u64,
    /// Fragment size for file-fed devices
    pub fragment_bytes: usize,
    /// Encodings to probe, most preferred first
    pub preferred_encodings: Vec<AudioEncoding>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            recordings_path: "~/.telepatia/recordings".to_string(),
            stop_ack_timeout_ms: 2000,
            fragment_bytes: 16 * 1024,
            preferred_encodings: DEFAULT_PREFERENCE.to_vec(),
        }
    }
}

impl AudioConfig {
    pub fn recordings_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.recordings_path).as_ref())
    }

    pub fn conversation(&self) -> ConversationConfig {
        ConversationConfig {
            preferred_encodings: self.preferred_encodings.clone(),
            stop_ack_timeout: Duration::from_millis(self.stop_ack_timeout_ms),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StubConfig {
    pub bind: String,
    pub port: u16,
    /// Artificial delay before every stub reply
    pub delay_ms: u64,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8000,
            delay_ms: 0,
        }
    }
}

impl Config {
    /// Load `path` (optional) layered under `TELEPATIA_*` environment variables
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .with_context(|| format!("Failed to read config from {}", path))?;

        settings
            .try_deserialize()
            .context("Invalid configuration")
    }
}
