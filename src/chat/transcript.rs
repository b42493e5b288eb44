use chrono::Local;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use crate::audio::AudioPayload;

/// Kind of transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    UserText,
    BotText,
    Transcription,
    Voice,
    Error,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageKind::UserText => "user_text",
            MessageKind::BotText => "bot_text",
            MessageKind::Transcription => "transcription",
            MessageKind::Voice => "voice",
            MessageKind::Error => "error",
        };
        f.write_str(name)
    }
}

/// Body of a transcript entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    Text(String),
    /// JSON reformatted for display (or bracketed text that looks like it)
    Structured(String),
    /// Playable recording
    Voice(AudioPayload),
}

impl MessageContent {
    /// Text body, if this is not a recording
    pub fn text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(text) | MessageContent::Structured(text) => Some(text),
            MessageContent::Voice(_) => None,
        }
    }
}

/// An immutable transcript entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: Uuid,
    kind: MessageKind,
    content: MessageContent,
    /// Local wall-clock time, `HH:MM`
    created_at: String,
}

impl Message {
    fn new(kind: MessageKind, content: MessageContent) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            content,
            created_at: Local::now().format("%H:%M").to_string(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn content(&self) -> &MessageContent {
        &self.content
    }

    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    /// Text body, if this is not a recording
    pub fn text(&self) -> Option<&str> {
        self.content.text()
    }

    pub fn audio(&self) -> Option<&AudioPayload> {
        match &self.content {
            MessageContent::Voice(audio) => Some(audio),
            _ => None,
        }
    }
}

/// Ordered, append-only list of messages
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new entry and return a copy of it
    pub fn append(&mut self, kind: MessageKind, content: MessageContent) -> Message {
        let message = Message::new(kind, content);
        self.messages.push(message.clone());
        message
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, index: usize) -> Option<&Message> {
        self.messages.get(index)
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Kinds in order, handy for assertions and logging
    pub fn kinds(&self) -> Vec<MessageKind> {
        self.messages.iter().map(Message::kind).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order_and_ids() {
        let mut transcript = Transcript::new();

        let first = transcript.append(MessageKind::UserText, MessageContent::Text("hola".into()));
        let second = transcript.append(MessageKind::BotText, MessageContent::Text("hello".into()));

        assert_eq!(transcript.kinds(), vec![MessageKind::UserText, MessageKind::BotText]);
        assert_eq!(transcript.get(0), Some(&first));
        assert_eq!(transcript.last(), Some(&second));
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn test_timestamp_is_hours_and_minutes() {
        let mut transcript = Transcript::new();
        let message = transcript.append(MessageKind::Error, MessageContent::Text("x".into()));

        let (hours, minutes) = message.created_at().split_once(':').expect("HH:MM");
        assert_eq!(hours.len(), 2);
        assert_eq!(minutes.len(), 2);
    }

    #[test]
    fn test_voice_message_exposes_audio() {
        let mut transcript = Transcript::new();
        let audio = AudioPayload::new(vec![1], crate::audio::AudioEncoding::Wav);
        let message = transcript.append(MessageKind::Voice, MessageContent::Voice(audio.clone()));

        assert_eq!(message.audio(), Some(&audio));
        assert_eq!(message.text(), None);
    }
}
