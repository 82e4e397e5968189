//! Turns conversation events and snapshots into terminal lines.

use vaani_chat::{ConversationSnapshot, VoiceSelection};
use vaani_core::{ConversationEvent, Message, Sender};

pub fn message_line(message: &Message) -> String {
    match message.sender() {
        Sender::User => format!("you › {}", message.text()),
        Sender::Bot => format!("bot › {}", message.text()),
    }
}

/// Line to print for `event`, if any.
///
/// User messages typed at the prompt are already on screen; only those that
/// arrived by voice are echoed, which `voice_echo` signals.
pub fn event_line(event: &ConversationEvent, voice_echo: bool) -> Option<String> {
    match event {
        ConversationEvent::LanguageChanged {
            language, greeting, ..
        } => Some(format!("── {} ──\nbot › {}", language, greeting)),
        ConversationEvent::MessageAppended { message, .. } => match message.sender() {
            Sender::Bot => Some(message_line(message)),
            Sender::User if voice_echo => Some(format!("you (voice) › {}", message.text())),
            Sender::User => None,
        },
        ConversationEvent::ComposingChanged { composing: true, .. } => {
            Some("bot is typing…".to_string())
        }
        ConversationEvent::CapturingChanged { capturing: true, .. } => {
            Some("listening…".to_string())
        }
        ConversationEvent::Notice { text, .. } => Some(format!("! {}", text)),
        _ => None,
    }
}

/// Line printed when a reply is read aloud.
pub fn spoken_line(selection: &VoiceSelection) -> String {
    match selection {
        VoiceSelection::Matched(voice) => {
            format!("(spoken in {} by {})", voice.language, voice.name)
        }
        VoiceSelection::Fallback {
            language,
            voice: Some(voice),
        } => format!(
            "(no matching voice, spoken in {} by {})",
            language, voice.name
        ),
        VoiceSelection::Fallback {
            language,
            voice: None,
        } => format!("(no matching voice, spoken in {})", language),
    }
}

pub fn history(snapshot: &ConversationSnapshot) -> String {
    let mut lines: Vec<String> = snapshot.messages.iter().map(message_line).collect();
    lines.push(format!(
        "[{}] {}",
        snapshot.language,
        if snapshot.is_composing_reply {
            "bot is typing…"
        } else {
            snapshot.placeholder.as_str()
        }
    ));
    lines.join("\n")
}
