//! Owned conversation state and its transitions.
//!
//! Transitions:
//! - language reset: transcript replaced by a single greeting
//! - user turn: user message appended, input cleared, reply now in flight
//! - bot turn: reply for a ticket appended, ticket retired
//! - capture flag on/off
//!
//! Each transition returns the events it produced, in application order.
//! Nothing here is async; the controller decides when transitions run.

use std::collections::BTreeSet;

use serde::Serialize;

use vaani_core::{ConversationEvent, LanguageCode, Message, Timestamp};

/// Claim on the reply to one user turn.
///
/// Not `Clone`: a ticket is redeemed exactly once.
#[derive(Debug, PartialEq, Eq)]
pub struct ReplyTicket {
    id: u64,
    language: LanguageCode,
}

impl ReplyTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Language current when the user turn began; selects the reply pool.
    pub fn language(&self) -> &LanguageCode {
        &self.language
    }
}

/// Read-only projection handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationSnapshot {
    pub language: LanguageCode,
    pub messages: Vec<Message>,
    pub pending_input: String,
    pub is_capturing_speech: bool,
    pub is_composing_reply: bool,
    pub placeholder: String,
}

/// The transcript plus input buffer and indicator flags.
///
/// Invariant: `messages` is never empty.
#[derive(Debug, Clone)]
pub struct ConversationState {
    current_language: LanguageCode,
    messages: Vec<Message>,
    pending_input: String,
    is_capturing_speech: bool,
    in_flight: BTreeSet<u64>,
    next_ticket: u64,
}

impl ConversationState {
    /// Start a conversation with the greeting for `language`.
    pub fn new(language: LanguageCode, greeting: impl Into<String>) -> Self {
        Self {
            current_language: language,
            messages: vec![Message::bot(greeting)],
            pending_input: String::new(),
            is_capturing_speech: false,
            in_flight: BTreeSet::new(),
            next_ticket: 0,
        }
    }

    pub fn current_language(&self) -> &LanguageCode {
        &self.current_language
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn pending_input(&self) -> &str {
        &self.pending_input
    }

    pub fn is_capturing_speech(&self) -> bool {
        self.is_capturing_speech
    }

    /// True while at least one user turn is waiting for its reply.
    pub fn is_composing_reply(&self) -> bool {
        !self.in_flight.is_empty()
    }

    pub fn replies_in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Switch language, discarding the transcript.
    ///
    /// Replies already in flight stay in flight and will land in the new
    /// transcript.
    pub fn reset_language(
        &mut self,
        language: LanguageCode,
        greeting: impl Into<String>,
    ) -> Vec<ConversationEvent> {
        let greeting = greeting.into();
        tracing::debug!(from = %self.current_language, to = %language, "Language reset");
        self.current_language = language.clone();
        self.messages = vec![Message::bot(greeting.clone())];
        vec![ConversationEvent::LanguageChanged {
            language,
            greeting,
            timestamp: Timestamp::now(),
        }]
    }

    pub fn set_input(&mut self, text: impl Into<String>) -> Vec<ConversationEvent> {
        let text = text.into();
        if self.pending_input == text {
            return Vec::new();
        }
        self.pending_input = text.clone();
        vec![ConversationEvent::InputChanged {
            text,
            timestamp: Timestamp::now(),
        }]
    }

    /// Text a submission would send: the explicit text if given, else the
    /// pending input. `None` when that text is blank.
    pub fn effective_text(&self, explicit: Option<&str>) -> Option<String> {
        let text = explicit.unwrap_or(&self.pending_input);
        if text.trim().is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }

    /// Append a user message and open a reply ticket.
    ///
    /// Returns `None` and changes nothing when `text` is blank. The message
    /// keeps `text` verbatim; trimming only decides whether it is sent.
    pub fn begin_user_turn(
        &mut self,
        text: &str,
    ) -> Option<(ReplyTicket, Vec<ConversationEvent>)> {
        if text.trim().is_empty() {
            return None;
        }

        let now = Timestamp::now();
        let was_composing = self.is_composing_reply();
        let mut events = Vec::with_capacity(3);

        let message = Message::user(text);
        self.messages.push(message.clone());
        events.push(ConversationEvent::MessageAppended {
            index: self.messages.len() - 1,
            message,
            timestamp: now,
        });

        if !self.pending_input.is_empty() {
            self.pending_input.clear();
            events.push(ConversationEvent::InputChanged {
                text: String::new(),
                timestamp: now,
            });
        }

        let ticket = ReplyTicket {
            id: self.next_ticket,
            language: self.current_language.clone(),
        };
        self.next_ticket += 1;
        self.in_flight.insert(ticket.id);

        if !was_composing {
            events.push(ConversationEvent::ComposingChanged {
                composing: true,
                timestamp: now,
            });
        }

        tracing::debug!(ticket = ticket.id, in_flight = self.in_flight.len(), "User turn");
        Some((ticket, events))
    }

    /// Retire `ticket` and append the bot's reply.
    pub fn complete_bot_turn(
        &mut self,
        ticket: ReplyTicket,
        reply: impl Into<String>,
    ) -> Vec<ConversationEvent> {
        let now = Timestamp::now();
        let mut events = Vec::with_capacity(2);

        self.in_flight.remove(&ticket.id);
        if !self.is_composing_reply() {
            events.push(ConversationEvent::ComposingChanged {
                composing: false,
                timestamp: now,
            });
        }

        let message = Message::bot(reply);
        self.messages.push(message.clone());
        events.push(ConversationEvent::MessageAppended {
            index: self.messages.len() - 1,
            message,
            timestamp: now,
        });

        tracing::debug!(ticket = ticket.id, in_flight = self.in_flight.len(), "Bot turn");
        events
    }

    pub fn set_capturing(&mut self, capturing: bool) -> Vec<ConversationEvent> {
        if self.is_capturing_speech == capturing {
            return Vec::new();
        }
        self.is_capturing_speech = capturing;
        vec![ConversationEvent::CapturingChanged {
            capturing,
            timestamp: Timestamp::now(),
        }]
    }

    pub fn snapshot(&self, placeholder: &str) -> ConversationSnapshot {
        ConversationSnapshot {
            language: self.current_language.clone(),
            messages: self.messages.clone(),
            pending_input: self.pending_input.clone(),
            is_capturing_speech: self.is_capturing_speech,
            is_composing_reply: self.is_composing_reply(),
            placeholder: placeholder.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaani_core::Sender;

    fn code(raw: &str) -> LanguageCode {
        LanguageCode::parse(raw).unwrap()
    }

    fn fresh() -> ConversationState {
        ConversationState::new(code("hi-IN"), "namaste")
    }

    fn names(events: &[ConversationEvent]) -> Vec<&'static str> {
        events.iter().map(|e| e.event_name()).collect()
    }

    #[test]
    fn test_new_state_has_single_greeting() {
        let state = fresh();
        assert_eq!(state.messages(), &[Message::bot("namaste")]);
        assert_eq!(state.current_language(), &code("hi-IN"));
        assert_eq!(state.pending_input(), "");
        assert!(!state.is_capturing_speech());
        assert!(!state.is_composing_reply());
    }

    #[test]
    fn test_reset_language_replaces_transcript() {
        let mut state = fresh();
        let (ticket, _) = state.begin_user_turn("hello").unwrap();
        state.complete_bot_turn(ticket, "reply");
        assert_eq!(state.messages().len(), 3);

        let events = state.reset_language(code("en-IN"), "hello there");
        assert_eq!(names(&events), vec!["language_changed"]);
        assert_eq!(state.messages(), &[Message::bot("hello there")]);
        assert_eq!(state.current_language(), &code("en-IN"));
    }

    #[test]
    fn test_reset_language_twice_is_not_additive() {
        let mut state = fresh();
        state.reset_language(code("en-IN"), "hello");
        let first = state.snapshot("p");
        state.reset_language(code("en-IN"), "hello");
        assert_eq!(state.snapshot("p"), first);
        assert_eq!(state.messages().len(), 1);
    }

    #[test]
    fn test_begin_user_turn_appends_clears_and_composes() {
        let mut state = fresh();
        state.set_input("hello");

        let (ticket, events) = state.begin_user_turn("hello").unwrap();
        assert_eq!(
            names(&events),
            vec!["message_appended", "input_changed", "composing_changed"]
        );
        assert_eq!(ticket.language(), &code("hi-IN"));
        assert_eq!(state.messages().last(), Some(&Message::user("hello")));
        assert_eq!(state.pending_input(), "");
        assert!(state.is_composing_reply());
    }

    #[test]
    fn test_begin_user_turn_keeps_text_verbatim() {
        let mut state = fresh();
        state.begin_user_turn("  spaced out  ").unwrap();
        assert_eq!(state.messages()[1].text(), "  spaced out  ");
    }

    #[test]
    fn test_blank_user_turn_changes_nothing() {
        for blank in ["", " ", "\t\n", "   \u{3000}"] {
            let mut state = fresh();
            state.set_input("draft");
            let before = state.snapshot("p");
            assert!(state.begin_user_turn(blank).is_none());
            assert_eq!(state.snapshot("p"), before);
        }
    }

    #[test]
    fn test_complete_bot_turn_orders_flag_before_message() {
        let mut state = fresh();
        let (ticket, _) = state.begin_user_turn("hello").unwrap();
        let events = state.complete_bot_turn(ticket, "hi!");

        assert_eq!(names(&events), vec!["composing_changed", "message_appended"]);
        assert!(!state.is_composing_reply());
        let senders: Vec<Sender> = state.messages().iter().map(|m| m.sender()).collect();
        assert_eq!(senders, vec![Sender::Bot, Sender::User, Sender::Bot]);
    }

    #[test]
    fn test_overlapping_turns_keep_composing_until_last_reply() {
        let mut state = fresh();
        let (first, _) = state.begin_user_turn("one").unwrap();
        let (second, events) = state.begin_user_turn("two").unwrap();
        assert!(!names(&events).contains(&"composing_changed"));
        assert_eq!(state.replies_in_flight(), 2);

        let events = state.complete_bot_turn(first, "r1");
        assert_eq!(names(&events), vec!["message_appended"]);
        assert!(state.is_composing_reply());

        state.complete_bot_turn(second, "r2");
        assert!(!state.is_composing_reply());

        let texts: Vec<&str> = state.messages().iter().map(|m| m.text()).collect();
        assert_eq!(texts, vec!["namaste", "one", "two", "r1", "r2"]);
    }

    #[test]
    fn test_ticket_ids_are_unique() {
        let mut state = fresh();
        let (a, _) = state.begin_user_turn("a").unwrap();
        let (b, _) = state.begin_user_turn("b").unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_reply_after_language_reset_lands_in_new_transcript() {
        let mut state = fresh();
        let (ticket, _) = state.begin_user_turn("hello").unwrap();
        state.reset_language(code("en-IN"), "hi");
        state.complete_bot_turn(ticket, "late reply");
        assert_eq!(
            state.messages(),
            &[Message::bot("hi"), Message::bot("late reply")]
        );
    }

    #[test]
    fn test_effective_text() {
        let mut state = fresh();
        assert_eq!(state.effective_text(None), None);
        state.set_input("draft");
        assert_eq!(state.effective_text(None), Some("draft".to_string()));
        assert_eq!(state.effective_text(Some("explicit")), Some("explicit".to_string()));
        assert_eq!(state.effective_text(Some("  ")), None);
    }

    #[test]
    fn test_set_input_emits_only_on_change() {
        let mut state = fresh();
        assert_eq!(names(&state.set_input("a")), vec!["input_changed"]);
        assert!(state.set_input("a").is_empty());
    }

    #[test]
    fn test_set_capturing_emits_only_on_change() {
        let mut state = fresh();
        assert_eq!(names(&state.set_capturing(true)), vec!["capturing_changed"]);
        assert!(state.set_capturing(true).is_empty());
        assert!(state.is_capturing_speech());
        assert_eq!(names(&state.set_capturing(false)), vec!["capturing_changed"]);
    }

    #[test]
    fn test_snapshot_projection() {
        let mut state = fresh();
        state.set_input("typing");
        state.set_capturing(true);
        let snap = state.snapshot("Type here");
        assert_eq!(snap.language, code("hi-IN"));
        assert_eq!(snap.pending_input, "typing");
        assert!(snap.is_capturing_speech);
        assert!(!snap.is_composing_reply);
        assert_eq!(snap.placeholder, "Type here");
    }
}
