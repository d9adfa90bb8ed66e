//! Events that can occur on the phone

use super::state::SessionId;
use crate::dialer::DialKey;
use crate::telephony::TransportError;
use chrono::{DateTime, Utc};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User intents
    KeyPress {
        key: DialKey,
    },
    Backspace,
    Call,
    Answer,
    HangUp,
    ComposeText {
        text: String,
    },
    SendMessage,

    // Backend responses
    OriginateResult {
        session: SessionId,
        result: Result<(), TransportError>,
    },
    AnswerResult {
        session: SessionId,
        result: Result<(), TransportError>,
    },
    EndResult {
        session: SessionId,
        result: Result<(), TransportError>,
    },
    MessageResult {
        send_id: u64,
        to: String,
        body: String,
        sent_at: DateTime<Utc>,
        result: Result<(), TransportError>,
    },

    // Poller
    IncomingCall {
        from: Option<String>,
    },

    // Call timer
    Tick {
        session: SessionId,
    },
}

impl Event {
    /// Short label for logging
    pub fn name(&self) -> &'static str {
        match self {
            Event::KeyPress { .. } => "key_press",
            Event::Backspace => "backspace",
            Event::Call => "call",
            Event::Answer => "answer",
            Event::HangUp => "hang_up",
            Event::ComposeText { .. } => "compose_text",
            Event::SendMessage => "send_message",
            Event::OriginateResult { .. } => "originate_result",
            Event::AnswerResult { .. } => "answer_result",
            Event::EndResult { .. } => "end_result",
            Event::MessageResult { .. } => "message_result",
            Event::IncomingCall { .. } => "incoming_call",
            Event::Tick { .. } => "tick",
        }
    }
}
