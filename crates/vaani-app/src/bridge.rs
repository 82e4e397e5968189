//! Speech bridge for the terminal: replies are "spoken" by printing which
//! voice would read them, and capture sessions are completed by `/voice`.

use std::sync::{Mutex, PoisonError};

use tokio::sync::oneshot;
use tracing::debug;

use vaani_chat::{select_voice, CaptureEvent, ChatError, SpeechBridge, Voice, VoiceSelection};
use vaani_core::LanguageCode;

use crate::render;

pub struct ConsoleSpeechBridge {
    voices: Vec<Voice>,
    fallback_language: LanguageCode,
    speech_to_text: bool,
    session: Mutex<Option<oneshot::Sender<CaptureEvent>>>,
}

impl ConsoleSpeechBridge {
    pub fn new(voices: Vec<Voice>, fallback_language: LanguageCode, speech_to_text: bool) -> Self {
        Self {
            voices,
            fallback_language,
            speech_to_text,
            session: Mutex::new(None),
        }
    }

    /// Hand `event` to the open capture session. Returns false if none is open.
    pub fn complete_session(&self, event: CaptureEvent) -> bool {
        let open = self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match open {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }
}

impl SpeechBridge for ConsoleSpeechBridge {
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
        let (tx, rx) = oneshot::channel();
        let replaced = self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(tx);
        if replaced.is_some() {
            debug!(language = %language, "Dropped stale capture session");
        }
        Ok(rx)
    }

    fn speak(&self, text: &str, language: &LanguageCode) -> Result<VoiceSelection, ChatError> {
        let selection = select_voice(&self.voices, language, &self.fallback_language);
        debug!(chars = text.chars().count(), requested = %language, "Speaking reply");
        println!("{}", render::spoken_line(&selection));
        Ok(selection)
    }
}
