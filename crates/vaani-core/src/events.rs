use serde::{Deserialize, Serialize};

use crate::types::{LanguageCode, Message, Timestamp};

/// Category of a user-facing notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// The platform cannot transcribe speech.
    CapabilityUnavailable,
    /// A capture session is already running.
    CaptureInProgress,
}

/// Changes to the conversation, in the order the controller applied them.
///
/// Consumed by the presentation layer to re-render the transcript and the
/// listening/typing indicators.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ConversationEvent {
    /// The language changed and the transcript was reset to its greeting.
    LanguageChanged {
        language: LanguageCode,
        greeting: String,
        timestamp: Timestamp,
    },

    /// A message was appended at `index` in the transcript.
    MessageAppended {
        index: usize,
        message: Message,
        timestamp: Timestamp,
    },

    /// The pending-input buffer changed.
    InputChanged { text: String, timestamp: Timestamp },

    /// The bot started or stopped composing a reply.
    ComposingChanged { composing: bool, timestamp: Timestamp },

    /// Speech capture started or stopped.
    CapturingChanged { capturing: bool, timestamp: Timestamp },

    /// A notification the user should see (blocking alert in a GUI).
    Notice {
        kind: NoticeKind,
        text: String,
        timestamp: Timestamp,
    },

    /// A reply was handed to the speech bridge.
    ReplySpoken {
        language: LanguageCode,
        voice_fallback: bool,
        timestamp: Timestamp,
    },
}

impl ConversationEvent {
    /// Returns the timestamp of the event.
    pub fn timestamp(&self) -> Timestamp {
        match self {
            ConversationEvent::LanguageChanged { timestamp, .. }
            | ConversationEvent::MessageAppended { timestamp, .. }
            | ConversationEvent::InputChanged { timestamp, .. }
            | ConversationEvent::ComposingChanged { timestamp, .. }
            | ConversationEvent::CapturingChanged { timestamp, .. }
            | ConversationEvent::Notice { timestamp, .. }
            | ConversationEvent::ReplySpoken { timestamp, .. } => *timestamp,
        }
    }

    /// Stable snake_case name for logging.
    pub fn event_name(&self) -> &'static str {
        match self {
            ConversationEvent::LanguageChanged { .. } => "language_changed",
            ConversationEvent::MessageAppended { .. } => "message_appended",
            ConversationEvent::InputChanged { .. } => "input_changed",
            ConversationEvent::ComposingChanged { .. } => "composing_changed",
            ConversationEvent::CapturingChanged { .. } => "capturing_changed",
            ConversationEvent::Notice { .. } => "notice",
            ConversationEvent::ReplySpoken { .. } => "reply_spoken",
        }
    }
}
