// Terminal rendering of transcript entries

use crate::chat::{Message, MessageContent, MessageKind};

pub const TITLE: &str = "Chat de Telepatía AI";
pub const SUBTITLE: &str = "Envía mensajes de texto o graba tu voz";
pub const TYPING_INDICATOR: &str = "  ... el bot está escribiendo";
pub const RECORDING_INDICATOR: &str = "Grabando... escribe /stop para detener";

pub const HELP: &str = "\
Comandos:
  <texto>      enviar un mensaje
  /record      empezar a grabar
  /stop        detener la grabación y enviarla
  /save N      guardar el mensaje de voz número N
  /history     mostrar toda la conversación
  /help        mostrar esta ayuda
  /quit        salir";

/// Render one transcript entry; `number` is its 1-based position
pub fn render(number: usize, message: &Message) -> String {
    let prefix = format!("#{} [{}]", number, message.created_at());

    match (message.kind(), message.content()) {
        (_, MessageContent::Voice(audio)) => format!(
            "{} Mensaje de voz ({}, {:.1} KB) - /save {} para guardarlo",
            prefix,
            audio.encoding().extension(),
            audio.len() as f64 / 1024.0,
            number
        ),
        (MessageKind::BotText, MessageContent::Structured(text)) => {
            let body: Vec<String> = text.lines().map(|line| format!("    {}", line)).collect();
            format!("{} Bot:\n{}", prefix, body.join("\n"))
        }
        (kind, MessageContent::Text(text) | MessageContent::Structured(text)) => {
            let who = match kind {
                MessageKind::UserText => "Tú:",
                MessageKind::BotText => "Bot:",
                MessageKind::Transcription => "🎤",
                MessageKind::Error => "⚠",
                MessageKind::Voice => "",
            };
            format!("{} {} {}", prefix, who, text)
        }
    }
}

/// Whether a reply is still expected after this entry
pub fn awaits_reply(message: &Message) -> bool {
    matches!(
        message.kind(),
        MessageKind::UserText | MessageKind::Voice | MessageKind::Transcription
    )
}
