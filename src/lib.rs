pub mod api;
pub mod audio;
pub mod chat;
pub mod config;
pub mod error;
pub mod stub;
pub mod ui;

pub use api::{ApiClient, Backend, Endpoint, TimedClient, TimeoutBudgets};
pub use audio::{
    AudioEncoding, AudioPayload, CaptureDevice, CaptureSession, CaptureState, DeviceConfig,
    DeviceEvent, DeviceFactory, DeviceSource,
};
pub use chat::{Conversation, ConversationConfig, Message, MessageKind, SendStatus, Transcript};
pub use config::Config;
pub use error::{CaptureError, ChatError, RequestError};
pub use stub::{create_router, StubState};
