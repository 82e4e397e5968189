//! Platform speech input/output contract.
//!
//! A capture session yields exactly one `CaptureEvent` over a oneshot
//! channel; dropping the sender without sending counts as `Ended`. Speech
//! output is fire-and-forget and falls back to a default voice when no voice
//! matches the requested language.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use tokio::sync::oneshot;

use vaani_core::LanguageCode;

use crate::error::ChatError;

/// Outcome of one capture session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// Speech was recognized.
    Transcribed(String),
    /// The recognizer reported an error.
    Failed(String),
    /// The session ended without a result.
    Ended,
}

/// A synthesis voice offered by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    pub language: LanguageCode,
}

impl Voice {
    pub fn new(name: impl Into<String>, language: LanguageCode) -> Self {
        Self {
            name: name.into(),
            language,
        }
    }
}

/// Which voice a reply was spoken with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceSelection {
    /// A voice matching the requested language exactly.
    Matched(Voice),
    /// No voice matched; the fallback language was used instead.
    Fallback {
        language: LanguageCode,
        voice: Option<Voice>,
    },
}

impl VoiceSelection {
    /// Language the utterance is actually spoken in.
    pub fn language(&self) -> &LanguageCode {
        match self {
            VoiceSelection::Matched(voice) => &voice.language,
            VoiceSelection::Fallback { language, .. } => language,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, VoiceSelection::Fallback { .. })
    }
}

/// Pick a voice for `requested`, falling back to `fallback`.
pub fn select_voice(
    voices: &[Voice],
    requested: &LanguageCode,
    fallback: &LanguageCode,
) -> VoiceSelection {
    if let Some(voice) = voices.iter().find(|v| &v.language == requested) {
        return VoiceSelection::Matched(voice.clone());
    }
    tracing::debug!(
        requested = %requested,
        fallback = %fallback,
        "No voice for requested language, using fallback"
    );
    VoiceSelection::Fallback {
        language: fallback.clone(),
        voice: voices.iter().find(|v| &v.language == fallback).cloned(),
    }
}

/// Platform speech capability used by the conversation controller.
pub trait SpeechBridge: Send + Sync {
    /// Capability check, queried before every capture session.
    fn is_speech_to_text_supported(&self) -> bool;

    /// Start a single-shot capture session for `language`.
    fn listen(
        &self,
        language: &LanguageCode,
    ) -> Result<oneshot::Receiver<CaptureEvent>, ChatError>;

    /// Speak `text` without blocking the caller.
    fn speak(&self, text: &str, language: &LanguageCode) -> Result<VoiceSelection, ChatError>;
}

// =============================================================================
// Silent bridge
// =============================================================================

/// Bridge for platforms with no speech support at all.
#[derive(Debug, Clone, Default)]
pub struct SilentSpeechBridge;

impl SpeechBridge for SilentSpeechBridge {
    fn is_speech_to_text_supported(&self) -> bool {
        false
    }

    fn listen(
        &self,
        _language: &LanguageCode,
    ) -> Result<oneshot::Receiver<CaptureEvent>, ChatError> {
        Err(ChatError::CapabilityUnavailable)
    }

    fn speak(&self, _text: &str, language: &LanguageCode) -> Result<VoiceSelection, ChatError> {
        Ok(VoiceSelection::Fallback {
            language: language.clone(),
            voice: None,
        })
    }
}

// =============================================================================
// Scripted bridge
// =============================================================================

/// A reply handed to a scripted bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpokenUtterance {
    pub text: String,
    pub requested: LanguageCode,
    pub selection: VoiceSelection,
}

/// In-process bridge driven by a script of capture outcomes.
///
/// Queued outcomes are delivered as soon as a session starts. With an empty
/// queue the session stays open until `complete_open_session` or
/// `abandon_open_sessions` is called. Every utterance and every listen
/// request is recorded for inspection.
#[derive(Debug)]
pub struct ScriptedSpeechBridge {
    voices: Vec<Voice>,
    fallback_language: LanguageCode,
    speech_to_text: bool,
    fail_speech: Mutex<bool>,
    fail_listen: Mutex<bool>,
    script: Mutex<VecDeque<CaptureEvent>>,
    open_sessions: Mutex<VecDeque<oneshot::Sender<CaptureEvent>>>,
    listens: Mutex<Vec<LanguageCode>>,
    spoken: Mutex<Vec<SpokenUtterance>>,
}

fn locked<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ScriptedSpeechBridge {
    pub fn new(voices: Vec<Voice>, fallback_language: LanguageCode, speech_to_text: bool) -> Self {
        Self {
            voices,
            fallback_language,
            speech_to_text,
            fail_speech: Mutex::new(false),
            fail_listen: Mutex::new(false),
            script: Mutex::new(VecDeque::new()),
            open_sessions: Mutex::new(VecDeque::new()),
            listens: Mutex::new(Vec::new()),
            spoken: Mutex::new(Vec::new()),
        }
    }

    /// Queue the outcome of the next capture session.
    pub fn push_capture(&self, event: CaptureEvent) {
        locked(&self.script).push_back(event);
    }

    /// Make every subsequent `speak` call fail (or succeed again).
    pub fn set_speech_failure(&self, fail: bool) {
        *locked(&self.fail_speech) = fail;
    }

    /// Make every subsequent `listen` call fail to start a session.
    pub fn set_listen_failure(&self, fail: bool) {
        *locked(&self.fail_listen) = fail;
    }

    /// Deliver `event` to the oldest open session. Returns false if none is open.
    pub fn complete_open_session(&self, event: CaptureEvent) -> bool {
        match locked(&self.open_sessions).pop_front() {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    /// Drop every open session without a result.
    pub fn abandon_open_sessions(&self) {
        locked(&self.open_sessions).clear();
    }

    pub fn open_session_count(&self) -> usize {
        locked(&self.open_sessions).len()
    }

    pub fn listen_requests(&self) -> Vec<LanguageCode> {
        locked(&self.listens).clone()
    }

    pub fn spoken(&self) -> Vec<SpokenUtterance> {
        locked(&self.spoken).clone()
    }
}

impl SpeechBridge for ScriptedSpeechBridge {
    fn is_speech_to_text_supported(&self) -> bool {
        self.speech_to_text
    }

    fn listen(
        &self,
        language: &LanguageCode,
    ) -> Result<oneshot::Receiver<CaptureEvent>, ChatError> {
        if !self.speech_to_text {
            return Err(ChatError::CapabilityUnavailable);
        }
        locked(&self.listens).push(language.clone());
        if *locked(&self.fail_listen) {
            return Err(ChatError::Speech("microphone unavailable".to_string()));
        }

        let (tx, rx) = oneshot::channel();
        match locked(&self.script).pop_front() {
            Some(event) => {
                // Receiver is still held here, so this cannot fail.
                let _ = tx.send(event);
            }
            None => locked(&self.open_sessions).push_back(tx),
        }
        Ok(rx)
    }

    fn speak(&self, text: &str, language: &LanguageCode) -> Result<VoiceSelection, ChatError> {
        if *locked(&self.fail_speech) {
            return Err(ChatError::Speech("synthesis engine unavailable".to_string()));
        }
        let selection = select_voice(&self.voices, language, &self.fallback_language);
        locked(&self.spoken).push(SpokenUtterance {
            text: text.to_string(),
            requested: language.clone(),
            selection: selection.clone(),
        });
        Ok(selection)
    }
}
