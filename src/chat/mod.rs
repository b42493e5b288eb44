//! Conversation state
//!
//! - `Conversation` sequences backend calls and owns the transcript
//! - `Transcript` is the append-only message list
//! - `normalize` prepares generated replies for display

pub mod normalize;
mod orchestrator;
mod transcript;

pub use normalize::{normalize, normalize_value, Normalized};
pub use orchestrator::{Conversation, ConversationConfig, SendStatus};
pub use transcript::{Message, MessageContent, MessageKind, Transcript};
