//! Error types for the conversation controller.

use vaani_core::error::VaaniError;
use vaani_core::LanguageCode;

/// Errors surfaced by the chat engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("speech recognition is not supported on this platform")]
    CapabilityUnavailable,
    #[error("a speech capture session is already active")]
    CaptureInProgress,
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(LanguageCode),
    #[error("conversation controller has stopped")]
    ControllerStopped,
    #[error("catalog error: {0}")]
    Catalog(String),
    #[error("speech error: {0}")]
    Speech(String),
}

impl From<VaaniError> for ChatError {
    fn from(err: VaaniError) -> Self {
        ChatError::Catalog(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        assert_eq!(
            ChatError::CapabilityUnavailable.to_string(),
            "speech recognition is not supported on this platform"
        );
        assert_eq!(
            ChatError::CaptureInProgress.to_string(),
            "a speech capture session is already active"
        );
        assert_eq!(
            ChatError::UnsupportedLanguage(LanguageCode::parse("xx-YY").unwrap()).to_string(),
            "unsupported language: xx-YY"
        );
        assert_eq!(
            ChatError::ControllerStopped.to_string(),
            "conversation controller has stopped"
        );
        assert_eq!(
            ChatError::Speech("no voices".to_string()).to_string(),
            "speech error: no voices"
        );
    }

    #[test]
    fn test_chat_error_from_vaani_error() {
        let err: ChatError = VaaniError::Catalog("empty".to_string()).into();
        assert!(matches!(err, ChatError::Catalog(_)));
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_errors_implement_debug() {
        let dbg = format!("{:?}", ChatError::CapabilityUnavailable);
        assert!(dbg.contains("CapabilityUnavailable"));
    }
}
