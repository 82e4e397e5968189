//! CLI argument definitions for the Vaani terminal chat.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use vaani_core::{LanguageCode, VaaniConfig, VaaniError};

/// Vaani: a multilingual canned-reply chatbot for the terminal.
#[derive(Parser, Debug)]
#[command(name = "vaani", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Language to start in (e.g. hi-IN, en-IN).
    #[arg(short = 'L', long = "language")]
    pub language: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Seed for reply selection and thinking delays.
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// TOML response catalog to use instead of the built-in one.
    #[arg(long = "catalog")]
    pub catalog: Option<PathBuf>,

    /// Disable speech input and spoken replies.
    #[arg(long = "no-voice")]
    pub no_voice: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > VAANI_CONFIG env var > ~/.vaani/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("VAANI_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log level: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config: &VaaniConfig) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config.general.log_level.clone())
    }

    /// Apply flag overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut VaaniConfig) -> Result<(), VaaniError> {
        if let Some(ref raw) = self.language {
            config.chat.default_language = LanguageCode::parse(raw)
                .map_err(|e| VaaniError::Config(format!("--language: {}", e)))?;
        }
        if let Some(seed) = self.seed {
            config.chat.seed = Some(seed);
        }
        if let Some(ref path) = self.catalog {
            config.chat.catalog_path = Some(path.to_string_lossy().to_string());
        }
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
        if self.no_voice {
            config.speech.speak_replies = false;
            config.speech.speech_to_text = false;
        }
        Ok(())
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".vaani").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".vaani").join("config.toml");
    }
    PathBuf::from("config.toml")
}
