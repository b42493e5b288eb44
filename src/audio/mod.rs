pub mod backend;
pub mod encoding;
pub mod file;
pub mod payload;
pub mod session;
pub mod wav;

#[cfg(feature = "audio-io")]
pub mod microphone;

pub use backend::{CaptureDevice, DeviceConfig, DeviceEvent, DeviceFactory, DeviceSource};
pub use encoding::{AudioEncoding, DEFAULT_PREFERENCE};
pub use file::FileDevice;
pub use payload::AudioPayload;
pub use session::{CaptureSession, CaptureState};
