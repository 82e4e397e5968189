//! Conversation controller: a single task owning `ConversationState`.
//!
//! Handles send commands over an mpsc channel; the task applies them one at a
//! time. Thinking delays and capture sessions run as side tasks that post
//! their completion back onto the same channel, so every state change
//! happens on the controller task. Overlapping submissions are not
//! serialized: each posts its own reply when its delay elapses.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::Rng;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use vaani_core::config::ChatConfig;
use vaani_core::{ConversationEvent, LanguageCode, NoticeKind, Timestamp, VaaniConfig};

use crate::catalog::ResponseProvider;
use crate::error::ChatError;
use crate::speech::{CaptureEvent, SpeechBridge};
use crate::state::{ConversationSnapshot, ConversationState, ReplyTicket};

const CAPABILITY_NOTICE: &str = "Speech recognition is not supported on this platform.";
const CAPTURE_BUSY_NOTICE: &str = "Already listening.";

/// Simulated time the bot spends "thinking" before replying.
///
/// Sampled uniformly from `[min_ms, min_ms + jitter_ms)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThinkingDelay {
    pub min_ms: u64,
    pub jitter_ms: u64,
}

impl Default for ThinkingDelay {
    fn default() -> Self {
        Self {
            min_ms: 1000,
            jitter_ms: 1000,
        }
    }
}

impl ThinkingDelay {
    pub fn from_config(config: &ChatConfig) -> Self {
        Self {
            min_ms: config.thinking_delay_min_ms,
            jitter_ms: config.thinking_delay_jitter_ms,
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let extra = if self.jitter_ms == 0 {
            0
        } else {
            rng.random_range(0..self.jitter_ms)
        };
        Duration::from_millis(self.min_ms.saturating_add(extra))
    }
}

/// Result of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The text was blank; nothing changed.
    Ignored,
    /// A user message was appended and answered with `reply`.
    Replied { reply: String },
}

enum Command {
    ChangeLanguage {
        language: LanguageCode,
        reply: oneshot::Sender<bool>,
    },
    SetInput {
        text: String,
    },
    Submit {
        text: Option<String>,
        done: Option<oneshot::Sender<SubmitOutcome>>,
    },
    BeginVoiceCapture {
        reply: oneshot::Sender<Result<(), ChatError>>,
    },
    Snapshot {
        reply: oneshot::Sender<ConversationSnapshot>,
    },
    ReplyDue {
        ticket: ReplyTicket,
    },
    CaptureFinished {
        event: CaptureEvent,
    },
    Shutdown,
}

/// Cloneable handle to a running conversation.
#[derive(Clone)]
pub struct ConversationController {
    commands: mpsc::UnboundedSender<Command>,
    events: broadcast::Sender<ConversationEvent>,
    provider: Arc<dyn ResponseProvider>,
}

impl std::fmt::Debug for ConversationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationController")
            .field("closed", &self.commands.is_closed())
            .field("subscribers", &self.events.receiver_count())
            .finish()
    }
}

impl ConversationController {
    /// Start the controller task on the current tokio runtime.
    ///
    /// The conversation opens in `config.chat.default_language` with its
    /// greeting as the only message. Fails if that language is not offered
    /// by `provider`.
    pub fn spawn(
        config: &VaaniConfig,
        provider: Arc<dyn ResponseProvider>,
        bridge: Arc<dyn SpeechBridge>,
        rng: StdRng,
    ) -> Result<(Self, JoinHandle<()>), ChatError> {
        let language = config.chat.default_language.clone();
        let greeting = provider
            .greeting_for(&language)
            .ok_or_else(|| ChatError::UnsupportedLanguage(language.clone()))?
            .to_string();

        let (commands, receiver) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(config.chat.event_buffer.max(1));

        let actor = ControllerActor {
            state: ConversationState::new(language.clone(), greeting),
            provider: Arc::clone(&provider),
            bridge,
            rng,
            delay: ThinkingDelay::from_config(&config.chat),
            speak_replies: config.speech.speak_replies,
            events: events.clone(),
            waiters: HashMap::new(),
            commands: commands.downgrade(),
        };

        info!(language = %language, "Conversation controller started");
        let task = tokio::spawn(actor.run(receiver));

        Ok((
            Self {
                commands,
                events,
                provider,
            },
            task,
        ))
    }

    /// Languages offered by the response provider, in presentation order.
    pub fn languages(&self) -> Vec<LanguageCode> {
        self.provider.languages()
    }

    /// Receive every change applied from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ConversationEvent> {
        self.events.subscribe()
    }

    /// Switch language and reset the transcript to its greeting.
    ///
    /// Returns `false` (and changes nothing) for a code the provider does not
    /// support.
    pub async fn change_language(&self, language: LanguageCode) -> Result<bool, ChatError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::ChangeLanguage { language, reply })?;
        rx.await.map_err(|_| ChatError::ControllerStopped)
    }

    /// Replace the pending-input buffer.
    pub fn set_input(&self, text: impl Into<String>) -> Result<(), ChatError> {
        self.send(Command::SetInput { text: text.into() })
    }

    /// Send `text`, or the pending input when `text` is `None`, and wait for
    /// the bot's reply.
    pub async fn submit(&self, text: Option<String>) -> Result<SubmitOutcome, ChatError> {
        let (done, rx) = oneshot::channel();
        self.send(Command::Submit {
            text,
            done: Some(done),
        })?;
        rx.await.map_err(|_| ChatError::ControllerStopped)
    }

    /// Like `submit`, without waiting for the reply.
    pub fn submit_detached(&self, text: Option<String>) -> Result<(), ChatError> {
        self.send(Command::Submit { text, done: None })
    }

    /// Start a speech capture session in the current language.
    ///
    /// Fails with `CapabilityUnavailable` when the platform cannot transcribe
    /// speech, and with `CaptureInProgress` while another session is open.
    /// The transcription, if any, is submitted when it arrives.
    pub async fn begin_voice_capture(&self) -> Result<(), ChatError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::BeginVoiceCapture { reply })?;
        rx.await.map_err(|_| ChatError::ControllerStopped)?
    }

    pub async fn snapshot(&self) -> Result<ConversationSnapshot, ChatError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot { reply })?;
        rx.await.map_err(|_| ChatError::ControllerStopped)
    }

    /// Stop the controller task. Pending `submit` calls resolve to
    /// `ControllerStopped`.
    pub fn shutdown(&self) -> Result<(), ChatError> {
        self.send(Command::Shutdown)
    }

    fn send(&self, command: Command) -> Result<(), ChatError> {
        self.commands
            .send(command)
            .map_err(|_| ChatError::ControllerStopped)
    }
}

struct ControllerActor {
    state: ConversationState,
    provider: Arc<dyn ResponseProvider>,
    bridge: Arc<dyn SpeechBridge>,
    rng: StdRng,
    delay: ThinkingDelay,
    speak_replies: bool,
    events: broadcast::Sender<ConversationEvent>,
    waiters: HashMap<u64, oneshot::Sender<SubmitOutcome>>,
    // Weak so the task ends once every handle and side task is gone.
    commands: mpsc::WeakUnboundedSender<Command>,
}

impl ControllerActor {
    async fn run(mut self, mut receiver: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = receiver.recv().await {
            match command {
                Command::ChangeLanguage { language, reply } => {
                    let _ = reply.send(self.change_language(language));
                }
                Command::SetInput { text } => {
                    let events = self.state.set_input(text);
                    self.publish(events);
                }
                Command::Submit { text, done } => self.submit(text, done),
                Command::BeginVoiceCapture { reply } => {
                    let _ = reply.send(self.begin_voice_capture());
                }
                Command::Snapshot { reply } => {
                    let placeholder = self
                        .provider
                        .placeholder_for(self.state.current_language())
                        .unwrap_or_default();
                    let _ = reply.send(self.state.snapshot(placeholder));
                }
                Command::ReplyDue { ticket } => self.deliver_reply(ticket),
                Command::CaptureFinished { event } => self.finish_capture(event),
                Command::Shutdown => break,
            }
        }
        debug!(
            abandoned_replies = self.waiters.len(),
            "Conversation controller stopped"
        );
    }

    fn publish(&self, events: Vec<ConversationEvent>) {
        for event in events {
            tracing::trace!(event = event.event_name(), "Conversation event");
            // No subscribers is fine.
            let _ = self.events.send(event);
        }
    }

    fn change_language(&mut self, language: LanguageCode) -> bool {
        let Some(greeting) = self.provider.greeting_for(&language) else {
            warn!(language = %language, "Ignoring unsupported language");
            return false;
        };
        let greeting = greeting.to_string();
        info!(language = %language, "Language changed");
        let events = self.state.reset_language(language, greeting);
        self.publish(events);
        true
    }

    fn submit(&mut self, text: Option<String>, done: Option<oneshot::Sender<SubmitOutcome>>) {
        let turn = self
            .state
            .effective_text(text.as_deref())
            .and_then(|text| self.state.begin_user_turn(&text));

        let Some((ticket, events)) = turn else {
            debug!("Ignoring blank submission");
            if let Some(done) = done {
                let _ = done.send(SubmitOutcome::Ignored);
            }
            return;
        };
        self.publish(events);

        let delay = self.delay.sample(&mut self.rng);
        debug!(
            ticket = ticket.id(),
            delay_ms = delay.as_millis() as u64,
            "Composing reply"
        );
        if let Some(done) = done {
            self.waiters.insert(ticket.id(), done);
        }

        match self.commands.upgrade() {
            Some(tx) => {
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(Command::ReplyDue { ticket });
                });
            }
            None => warn!(ticket = ticket.id(), "Controller closing, reply abandoned"),
        }
    }

    fn deliver_reply(&mut self, ticket: ReplyTicket) {
        let id = ticket.id();
        let language = ticket.language().clone();
        let reply = self.pick_reply(&language);

        let events = self.state.complete_bot_turn(ticket, reply.clone());
        self.publish(events);
        self.speak(&reply, &language);

        if let Some(done) = self.waiters.remove(&id) {
            let _ = done.send(SubmitOutcome::Replied { reply });
        }
    }

    fn pick_reply(&mut self, language: &LanguageCode) -> String {
        let chosen = self
            .provider
            .replies_for(language)
            .and_then(|pool| pool.choose(&mut self.rng))
            .cloned();
        match chosen {
            Some(reply) => reply,
            None => {
                warn!(language = %language, "Reply pool missing or empty, answering with greeting");
                self.provider
                    .greeting_for(language)
                    .unwrap_or_default()
                    .to_string()
            }
        }
    }

    fn speak(&self, reply: &str, language: &LanguageCode) {
        if !self.speak_replies {
            return;
        }
        match self.bridge.speak(reply, language) {
            Ok(selection) => {
                if selection.is_fallback() {
                    debug!(
                        requested = %language,
                        spoken = %selection.language(),
                        "No matching voice, spoke with fallback"
                    );
                }
                self.publish(vec![ConversationEvent::ReplySpoken {
                    language: selection.language().clone(),
                    voice_fallback: selection.is_fallback(),
                    timestamp: Timestamp::now(),
                }]);
            }
            Err(e) => warn!(error = %e, "Speech output failed"),
        }
    }

    fn notice(&self, kind: NoticeKind, text: &str) {
        self.publish(vec![ConversationEvent::Notice {
            kind,
            text: text.to_string(),
            timestamp: Timestamp::now(),
        }]);
    }

    fn begin_voice_capture(&mut self) -> Result<(), ChatError> {
        if !self.bridge.is_speech_to_text_supported() {
            self.notice(NoticeKind::CapabilityUnavailable, CAPABILITY_NOTICE);
            return Err(ChatError::CapabilityUnavailable);
        }
        if self.state.is_capturing_speech() {
            self.notice(NoticeKind::CaptureInProgress, CAPTURE_BUSY_NOTICE);
            return Err(ChatError::CaptureInProgress);
        }

        let language = self.state.current_language().clone();
        let events = self.state.set_capturing(true);
        self.publish(events);
        info!(language = %language, "Speech capture started");

        let session = match self.bridge.listen(&language) {
            Ok(session) => session,
            Err(e) => {
                debug!(error = %e, "Speech capture could not start");
                let events = self.state.set_capturing(false);
                self.publish(events);
                return Ok(());
            }
        };

        match self.commands.upgrade() {
            Some(tx) => {
                tokio::spawn(async move {
                    // A dropped sender means the session ended silently.
                    let event = session.await.unwrap_or(CaptureEvent::Ended);
                    let _ = tx.send(Command::CaptureFinished { event });
                });
            }
            None => {
                let events = self.state.set_capturing(false);
                self.publish(events);
            }
        }
        Ok(())
    }

    fn finish_capture(&mut self, event: CaptureEvent) {
        match event {
            CaptureEvent::Transcribed(text) => {
                info!(chars = text.chars().count(), "Speech transcribed");
                let events = self.state.set_input(text.clone());
                self.publish(events);
                self.submit(Some(text), None);
            }
            CaptureEvent::Failed(reason) => {
                debug!(reason = %reason, "Speech capture failed");
            }
            CaptureEvent::Ended => {
                debug!("Speech capture ended without a result");
            }
        }
        let events = self.state.set_capturing(false);
        self.publish(events);
    }
}
