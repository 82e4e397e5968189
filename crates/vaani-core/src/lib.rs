//! Shared vocabulary for the Vaani chat widget: language codes, transcript
//! messages, change-notification events, configuration, and the top-level
//! error type.

pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use config::VaaniConfig;
pub use error::{Result, VaaniError};
pub use events::{ConversationEvent, NoticeKind};
pub use types::*;
