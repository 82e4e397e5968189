use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, VaaniError};
use crate::types::LanguageCode;

/// Top-level configuration for Vaani.
///
/// Every section has defaults, so an empty or missing file yields a working
/// configuration. The binary reads `~/.vaani/config.toml` when present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VaaniConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
}

impl VaaniConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: VaaniConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.chat.event_buffer == 0 {
            return Err(VaaniError::Config(
                "chat.event_buffer must be greater than 0".to_string(),
            ));
        }
        if self
            .chat
            .thinking_delay_min_ms
            .checked_add(self.chat.thinking_delay_jitter_ms)
            .is_none()
        {
            return Err(VaaniError::Config("chat thinking delay overflows".to_string()));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Conversation controller settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Language the controller starts in.
    pub default_language: LanguageCode,
    /// Shortest simulated thinking delay.
    pub thinking_delay_min_ms: u64,
    /// Width of the uniform window added on top of the minimum.
    pub thinking_delay_jitter_ms: u64,
    /// Capacity of the change-notification channel.
    pub event_buffer: usize,
    /// TOML catalog replacing the built-in greetings and reply pools.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<String>,
    /// Fixed RNG seed for reproducible reply selection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_language: LanguageCode::default(),
            thinking_delay_min_ms: 1000,
            thinking_delay_jitter_ms: 1000,
            event_buffer: 64,
            catalog_path: None,
            seed: None,
        }
    }
}

/// Speech input/output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Read bot replies aloud.
    pub speak_replies: bool,
    /// Voice language used when no voice matches the conversation language.
    pub fallback_language: LanguageCode,
    /// Whether speech-to-text is offered at all.
    pub speech_to_text: bool,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            speak_replies: true,
            fallback_language: LanguageCode::default(),
            speech_to_text: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = VaaniConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.chat.default_language.as_str(), "hi-IN");
        assert_eq!(config.chat.thinking_delay_min_ms, 1000);
        assert_eq!(config.chat.thinking_delay_jitter_ms, 1000);
        assert_eq!(config.chat.event_buffer, 64);
        assert!(config.chat.catalog_path.is_none());
        assert!(config.chat.seed.is_none());
        assert!(config.speech.speak_replies);
        assert!(config.speech.speech_to_text);
        assert_eq!(config.speech.fallback_language.as_str(), "hi-IN");
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
log_level = "debug"

[chat]
default_language = "en-IN"
thinking_delay_min_ms = 10
thinking_delay_jitter_ms = 5
seed = 7

[speech]
speak_replies = false
fallback_language = "en-IN"
"#;
        let file = create_temp_config(content);
        let config = VaaniConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.chat.default_language.as_str(), "en-IN");
        assert_eq!(config.chat.thinking_delay_min_ms, 10);
        assert_eq!(config.chat.thinking_delay_jitter_ms, 5);
        assert_eq!(config.chat.seed, Some(7));
        assert!(!config.speech.speak_replies);
        assert!(config.speech.speech_to_text);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let file = create_temp_config("[general]\nlog_level = \"warn\"\n");
        let config = VaaniConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.chat.event_buffer, 64);
        assert_eq!(config.chat.default_language.as_str(), "hi-IN");
    }

    #[test]
    fn test_load_rejects_blank_language() {
        let file = create_temp_config("[chat]\ndefault_language = \"  \"\n");
        let err = VaaniConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, VaaniError::Config(_)));
    }

    #[test]
    fn test_load_rejects_zero_event_buffer() {
        let file = create_temp_config("[chat]\nevent_buffer = 0\n");
        let err = VaaniConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("event_buffer"));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = VaaniConfig::load_or_default(Path::new("/nonexistent/vaani.toml"));
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = VaaniConfig::default();
        config.chat.seed = Some(99);
        config.save(&path).unwrap();

        let reloaded = VaaniConfig::load(&path).unwrap();
        assert_eq!(reloaded.chat.seed, Some(99));
        assert_eq!(reloaded.chat.default_language, config.chat.default_language);
        assert!(reloaded.chat.catalog_path.is_none());
    }
}
