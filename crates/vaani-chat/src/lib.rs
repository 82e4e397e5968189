//! Conversation controller for the Vaani chat widget.
//!
//! Keeps the transcript, picks canned replies from a per-language pool after
//! a simulated thinking delay, and bridges to platform speech input/output.

pub mod catalog;
pub mod controller;
pub mod error;
pub mod speech;
pub mod state;

pub use catalog::{LanguageEntry, ResponseCatalog, ResponseProvider};
pub use controller::{ConversationController, SubmitOutcome, ThinkingDelay};
pub use error::ChatError;
pub use speech::{
    select_voice, CaptureEvent, ScriptedSpeechBridge, SilentSpeechBridge, SpeechBridge,
    SpokenUtterance, Voice, VoiceSelection,
};
pub use state::{ConversationSnapshot, ConversationState, ReplyTicket};
